//! Point-in-time copy of the block under the external caret.
//!
//! Capture is read-only. The three apply steps are independent and idempotent:
//! - `apply_content` puts the captured block subtrees back verbatim;
//! - `apply_selection` re-establishes the captured external selection;
//! - `apply_to_model` sets the model selection to the captured selection as it
//!   mapped at capture time (used when the platform caret cannot be trusted
//!   after a revert).
//!
//! Content is normally applied before the surface selection so the selection
//! points at restored nodes.

use crate::{NodeId, Surface, SurfaceSelection, coords};
use core_model::{DocumentModel, ModelResult, Range};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotOptions {
    /// Also capture the block before the caret block (the platform may merge
    /// or remove it before notifying, e.g. backspace at block start).
    pub include_previous: bool,
}

#[derive(Debug, Clone)]
pub struct SurfaceSnapshot<F> {
    fragments: Vec<F>,
    selection: Option<SurfaceSelection>,
    model_selection: Option<Range>,
}

impl<F: Clone> SurfaceSnapshot<F> {
    pub fn capture<S, M>(surface: &S, model: &M, options: SnapshotOptions) -> Self
    where
        S: Surface<Fragment = F> + ?Sized,
        M: DocumentModel + ?Sized,
    {
        let selection = surface.selection();
        let mut fragments = Vec::new();
        if let Some(block) = selection.and_then(|sel| surface.block_of(sel.anchor.node)) {
            if options.include_previous
                && let Some(prev) = surface.previous_block(block)
            {
                fragments.push(surface.capture(prev));
            }
            fragments.push(surface.capture(block));
        }
        let model_selection =
            selection.and_then(|sel| coords::selection_to_model_range(surface, &sel, model));
        debug!(
            target: "ime.snapshot",
            blocks = fragments.len(),
            has_selection = selection.is_some(),
            mapped = model_selection.is_some(),
            "snapshot_captured"
        );
        Self {
            fragments,
            selection,
            model_selection,
        }
    }

    /// Selection in model coordinates as mapped at capture time.
    pub fn model_selection(&self) -> Option<Range> {
        self.model_selection
    }

    pub fn selection(&self) -> Option<SurfaceSelection> {
        self.selection
    }

    /// Surface node the external caret was anchored in at capture time.
    pub fn anchor_node(&self) -> Option<NodeId> {
        self.selection.map(|sel| sel.anchor.node)
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    pub fn apply_content<S>(&self, surface: &mut S)
    where
        S: Surface<Fragment = F> + ?Sized,
    {
        for fragment in &self.fragments {
            surface.restore(fragment);
        }
    }

    pub fn apply_selection<S>(&self, surface: &mut S)
    where
        S: Surface<Fragment = F> + ?Sized,
    {
        surface.set_selection(self.selection);
    }

    /// Returns `Ok(false)` when the captured selection never mapped.
    pub fn apply_to_model<M>(&self, model: &mut M) -> ModelResult<bool>
    where
        M: DocumentModel + ?Sized,
    {
        match self.model_selection {
            Some(range) => {
                model.set_selection(range)?;
                Ok(true)
            }
            None => {
                warn!(target: "ime.snapshot", "snapshot_selection_unmapped");
                Ok(false)
            }
        }
    }

    /// Content, then surface selection, then model selection.
    pub fn apply_all<S, M>(&self, surface: &mut S, model: &mut M) -> ModelResult<bool>
    where
        S: Surface<Fragment = F> + ?Sized,
        M: DocumentModel + ?Sized,
    {
        self.apply_content(surface);
        self.apply_selection(surface);
        self.apply_to_model(model)
    }
}
