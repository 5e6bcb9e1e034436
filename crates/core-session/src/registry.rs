//! Ordered handler list with per-hook dispatch subsets.
//!
//! Order is the only tie-break: earlier handlers get first refusal. The subsets
//! are computed once in `new` and preserve relative order; the registry is
//! read-only afterwards.

use crate::handler::{Handler, HookSet};
use smallvec::SmallVec;
use tracing::{debug, warn};

type IndexList = SmallVec<[usize; 8]>;

pub struct Registry<H, S> {
    handlers: Vec<Handler<H, S>>,
    with_setup: IndexList,
    with_trigger: IndexList,
    with_finish: IndexList,
    with_teardown: IndexList,
}

impl<H, S> Registry<H, S> {
    pub fn new(handlers: Vec<Handler<H, S>>) -> Self {
        let subset = |hook: HookSet| -> IndexList {
            handlers
                .iter()
                .enumerate()
                .filter(|(_, h)| h.hooks().contains(hook))
                .map(|(i, _)| i)
                .collect()
        };
        let with_setup = subset(HookSet::SETUP);
        let with_trigger = subset(HookSet::TRIGGER);
        let with_finish = subset(HookSet::FINISH);
        let with_teardown = subset(HookSet::TEARDOWN);

        for (i, h) in handlers.iter().enumerate() {
            if h.hooks().is_empty() {
                warn!(target: "ime.registry", handler = h.name(), "handler_without_hooks");
            }
            if handlers[..i].iter().any(|prev| prev.name() == h.name()) {
                warn!(target: "ime.registry", handler = h.name(), "duplicate_handler_name");
            }
        }
        debug!(
            target: "ime.registry",
            handlers = handlers.len(),
            setup = with_setup.len(),
            trigger = with_trigger.len(),
            finish = with_finish.len(),
            teardown = with_teardown.len(),
            "registry_compiled"
        );
        Self {
            handlers,
            with_setup,
            with_trigger,
            with_finish,
            with_teardown,
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Handler<H, S>> {
        self.handlers.get(index)
    }

    pub fn names(&self) -> Vec<&str> {
        self.handlers.iter().map(Handler::name).collect()
    }

    pub fn with_setup(&self) -> &[usize] {
        &self.with_setup
    }

    pub fn with_trigger(&self) -> &[usize] {
        &self.with_trigger
    }

    pub fn with_finish(&self) -> &[usize] {
        &self.with_finish
    }

    pub fn with_teardown(&self) -> &[usize] {
        &self.with_teardown
    }
}

impl<H, S> std::fmt::Debug for Registry<H, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("handlers", &self.names())
            .finish()
    }
}
