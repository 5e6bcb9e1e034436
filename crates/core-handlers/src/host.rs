//! Per-editor state the built-in handlers share across bursts, and the
//! per-burst scratch they share within one.

use core_model::{DocumentModel, ModelResult, Range};
use core_reconcile::{PendingNodes, Reconciled};
use core_session::{ActionSession, Context, Handler, MatchResult};
use core_surface::{SnapshotOptions, Surface, SurfaceSnapshot};
use tracing::debug;

/// Whether the input method is inside a composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Composition {
    #[default]
    None,
    Composing,
}

/// Host handed to every hook: the document, its rendered surface, and input
/// method state that outlives a single burst.
pub struct ImeHost<M, S: Surface> {
    pub model: M,
    pub surface: S,
    pub composition: Composition,
    /// Surface nodes touched by the current composition.
    pub pending: PendingNodes,
    /// Surface captured when the last composition ended.
    pub composition_end: Option<SurfaceSnapshot<S::Fragment>>,
}

impl<M: DocumentModel, S: Surface> ImeHost<M, S> {
    pub fn new(model: M, surface: S) -> Self {
        Self {
            model,
            surface,
            composition: Composition::None,
            pending: PendingNodes::new(),
            composition_end: None,
        }
    }

    pub fn is_composing(&self) -> bool {
        self.composition == Composition::Composing
    }

    /// Enter a composition: forget nodes from the previous one and start
    /// tracking the node under the caret.
    pub fn start_composition(&mut self) {
        self.composition = Composition::Composing;
        self.pending.clear();
        self.pending.add_anchor(&self.surface);
        debug!(target: "ime.handlers", "composition_started");
    }

    /// Leave the composition and keep a snapshot of the surface as it ended.
    pub fn end_composition(&mut self) {
        self.composition = Composition::None;
        self.composition_end = Some(self.snapshot(SnapshotOptions {
            include_previous: true,
        }));
        debug!(target: "ime.handlers", pending = self.pending.len(), "composition_ended");
    }

    /// Track the node under the external caret for the next reconcile.
    pub fn track_anchor(&mut self) -> bool {
        self.pending.add_anchor(&self.surface)
    }

    pub fn snapshot(&self, options: SnapshotOptions) -> SurfaceSnapshot<S::Fragment> {
        SurfaceSnapshot::capture(&self.surface, &self.model, options)
    }

    /// Put captured content and the captured surface selection back. Returns
    /// the captured selection in model coordinates, if it mapped.
    pub fn revert(&mut self, snapshot: &SurfaceSnapshot<S::Fragment>) -> Option<Range> {
        snapshot.apply_content(&mut self.surface);
        snapshot.apply_selection(&mut self.surface);
        snapshot.model_selection()
    }

    /// Reconcile every pending node, then select `selection` (or the surface
    /// selection when `None`).
    pub fn reconcile_pending(&mut self, selection: Option<Range>) -> ModelResult<Vec<Reconciled>> {
        self.pending.apply(&self.surface, &mut self.model, selection)
    }

    pub fn into_parts(self) -> (M, S) {
        (self.model, self.surface)
    }
}

/// Scratch reset on every teardown.
#[derive(Debug, Clone)]
pub struct BurstScratch<F> {
    /// Surface as it was when the burst started.
    pub snapshot: Option<SurfaceSnapshot<F>>,
}

impl<F> Default for BurstScratch<F> {
    fn default() -> Self {
        Self { snapshot: None }
    }
}

pub type ImeScratch<S> = BurstScratch<<S as Surface>::Fragment>;
pub type ImeHandler<M, S> = Handler<ImeHost<M, S>, ImeScratch<S>>;
pub type ImeContext<'a, M, S> = Context<'a, ImeHost<M, S>, ImeScratch<S>>;
pub type ImeMatch<M, S> = MatchResult<ImeHost<M, S>, ImeScratch<S>>;
pub type ImeSession<M, S> = ActionSession<ImeHost<M, S>, ImeScratch<S>>;
