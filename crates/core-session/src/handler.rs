//! Pattern handlers and their match results.
//!
//! A handler is a named bundle of up to four hooks:
//! - `on_setup`: first notification of a new burst, before matching;
//! - `on_trigger`: every notification while no finisher is installed (and the
//!   synthesized timeout);
//! - `on_finish`: idle expiry, over the whole burst;
//! - `on_teardown`: after every resolution or discard.
//!
//! Trigger and finish hooks answer with a `MatchResult`. `Resolved(true)`
//! claims the burst, `Resolved(false)` passes, `Continue(finisher)` claims the
//! burst but defers the decision to the next notification.

use crate::Context;
use bitflags::bitflags;
use core_events::Notification;
use std::fmt;

bitflags! {
    /// Hooks a handler implements.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct HookSet: u8 {
        const SETUP = 1;
        const TRIGGER = 2;
        const FINISH = 4;
        const TEARDOWN = 8;
    }
}

/// Hook kind named in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Setup,
    Trigger,
    Finish,
    Teardown,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HookKind::Setup => "on_setup",
            HookKind::Trigger => "on_trigger",
            HookKind::Finish => "on_finish",
            HookKind::Teardown => "on_teardown",
        })
    }
}

pub type SetupHook<H, S> = Box<dyn Fn(&mut Context<'_, H, S>) -> anyhow::Result<()>>;
pub type TriggerHook<H, S> =
    Box<dyn Fn(&Notification, &mut Context<'_, H, S>) -> anyhow::Result<MatchResult<H, S>>>;
pub type FinishHook<H, S> = Box<dyn Fn(&mut Context<'_, H, S>) -> anyhow::Result<MatchResult<H, S>>>;
pub type TeardownHook<H, S> = Box<dyn Fn(&mut Context<'_, H, S>) -> anyhow::Result<()>>;

type FinisherFn<H, S> =
    Box<dyn FnOnce(&Notification, &mut Context<'_, H, S>) -> anyhow::Result<MatchResult<H, S>>>;

/// Continuation that alone receives the next notification.
pub struct Finisher<H, S>(FinisherFn<H, S>);

impl<H, S> Finisher<H, S> {
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&Notification, &mut Context<'_, H, S>) -> anyhow::Result<MatchResult<H, S>>
            + 'static,
    {
        Finisher(Box::new(f))
    }

    pub fn call(
        self,
        notification: &Notification,
        ctx: &mut Context<'_, H, S>,
    ) -> anyhow::Result<MatchResult<H, S>> {
        (self.0)(notification, ctx)
    }
}

impl<H, S> fmt::Debug for Finisher<H, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Finisher(..)")
    }
}

pub enum MatchResult<H, S> {
    Resolved(bool),
    Continue(Finisher<H, S>),
}

impl<H, S> MatchResult<H, S> {
    pub fn matched() -> Self {
        MatchResult::Resolved(true)
    }

    pub fn unmatched() -> Self {
        MatchResult::Resolved(false)
    }

    pub fn continue_with<F>(f: F) -> Self
    where
        F: FnOnce(&Notification, &mut Context<'_, H, S>) -> anyhow::Result<MatchResult<H, S>>
            + 'static,
    {
        MatchResult::Continue(Finisher::new(f))
    }

    /// True for anything other than `Resolved(false)`.
    pub fn claims(&self) -> bool {
        !matches!(self, MatchResult::Resolved(false))
    }
}

impl<H, S> From<bool> for MatchResult<H, S> {
    fn from(value: bool) -> Self {
        MatchResult::Resolved(value)
    }
}

impl<H, S> fmt::Debug for MatchResult<H, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchResult::Resolved(v) => write!(f, "Resolved({v})"),
            MatchResult::Continue(_) => f.write_str("Continue(..)"),
        }
    }
}

pub struct Handler<H, S> {
    name: String,
    pub(crate) setup: Option<SetupHook<H, S>>,
    pub(crate) trigger: Option<TriggerHook<H, S>>,
    pub(crate) finish: Option<FinishHook<H, S>>,
    pub(crate) teardown: Option<TeardownHook<H, S>>,
}

impl<H, S> Handler<H, S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            setup: None,
            trigger: None,
            finish: None,
            teardown: None,
        }
    }

    pub fn on_setup<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Context<'_, H, S>) -> anyhow::Result<()> + 'static,
    {
        self.setup = Some(Box::new(f));
        self
    }

    pub fn on_trigger<F>(mut self, f: F) -> Self
    where
        F: Fn(&Notification, &mut Context<'_, H, S>) -> anyhow::Result<MatchResult<H, S>>
            + 'static,
    {
        self.trigger = Some(Box::new(f));
        self
    }

    pub fn on_finish<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Context<'_, H, S>) -> anyhow::Result<MatchResult<H, S>> + 'static,
    {
        self.finish = Some(Box::new(f));
        self
    }

    pub fn on_teardown<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Context<'_, H, S>) -> anyhow::Result<()> + 'static,
    {
        self.teardown = Some(Box::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hooks(&self) -> HookSet {
        let mut set = HookSet::empty();
        set.set(HookSet::SETUP, self.setup.is_some());
        set.set(HookSet::TRIGGER, self.trigger.is_some());
        set.set(HookSet::FINISH, self.finish.is_some());
        set.set(HookSet::TEARDOWN, self.teardown.is_some());
        set
    }
}

impl<H, S> fmt::Debug for Handler<H, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("hooks", &self.hooks())
            .finish()
    }
}
