//! Action session state machine.
//!
//! States:
//! - `Idle`: no burst, timer stopped.
//! - `Searching`: burst open, no finisher; each notification is offered to the
//!   `on_trigger` hooks in registry order.
//! - `Continuing`: burst open, finisher installed; each notification goes to
//!   the finisher alone.
//!
//! Transitions (per `trigger`):
//! 1. Idle → active: the timer is armed, `on_setup` hooks run.
//! 2. The notification is appended to the burst; the timer is re-armed before
//!    any hook runs, so a failing hook still leaves a burst that closes through
//!    the idle path.
//! 3. Finisher present: `Resolved(true)` resolves, `Continue` replaces it,
//!    `Resolved(false)` drops it and falls through to the trigger search for the
//!    same notification.
//! 4. Trigger search: the first hook that does not answer `Resolved(false)`
//!    wins. `Resolved(true)` resolves, `Continue` installs a finisher.
//!
//! Idle expiry (`poll_idle` / `fire`): a synthesized timeout notification (not
//! buffered) goes to the finisher, then to the trigger hooks; if still
//! unresolved, the `on_finish` hooks see the whole burst. A `Continue` from any
//! of these keeps the burst open for one more quiet period. Otherwise the burst
//! is discarded.
//!
//! Every resolution or discard runs all `on_teardown` hooks and resets the
//! session to its initial state, even when a teardown hook fails.

use crate::handler::{Finisher, HookKind, MatchResult};
use crate::registry::Registry;
use crate::timer::{ArmToken, IdleInterval, IdleTimer};
use crate::{Handler, SessionError, SessionResult, SessionSettings};
use core_events::{
    BURSTS_DISCARDED, BURSTS_RESOLVED, BURSTS_STARTED, Burst, NOTIFICATIONS_BUFFERED, Notification,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Searching,
    Continuing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedBy {
    Trigger(String),
    Finisher,
    Finish(String),
}

/// Outcome of one session call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Burst open, waiting for more input or the idle timer.
    Pending,
    /// Burst open with a finisher installed.
    Continuing,
    Resolved(ResolvedBy),
    /// Idle expiry with no match; the burst was dropped without model edits.
    Discarded,
    /// Nothing to do (refresh or poll on an idle session, stale timer token).
    Ignored,
}

impl Resolution {
    pub fn is_open(&self) -> bool {
        matches!(self, Resolution::Pending | Resolution::Continuing)
    }

    pub fn resolved_by(&self) -> Option<&ResolvedBy> {
        match self {
            Resolution::Resolved(by) => Some(by),
            _ => None,
        }
    }
}

/// Mutable view handed to every hook.
pub struct Context<'a, H, S> {
    pub host: &'a mut H,
    pub scratch: &'a mut S,
    burst: &'a Burst,
    delay: &'a mut Option<IdleInterval>,
    default_delay: IdleInterval,
}

impl<H, S> Context<'_, H, S> {
    /// Notifications buffered so far, including the one being handled.
    pub fn burst(&self) -> &Burst {
        self.burst
    }

    pub fn notification_count(&self) -> usize {
        self.burst.len()
    }

    /// Override the quiet period for the rest of this burst.
    pub fn set_delay(&mut self, delay: Duration) {
        *self.delay = Some(IdleInterval::After(delay));
    }

    pub fn set_interval(&mut self, interval: IdleInterval) {
        *self.delay = Some(interval);
    }

    /// Quiet period currently in effect.
    pub fn delay(&self) -> IdleInterval {
        self.delay.unwrap_or(self.default_delay)
    }
}

#[derive(Debug, Default)]
pub struct SessionMetrics {
    bursts_started: AtomicU64,
    resolved_by_trigger: AtomicU64,
    resolved_by_finisher: AtomicU64,
    resolved_by_finish: AtomicU64,
    discarded: AtomicU64,
    forced_closes: AtomicU64,
    teardowns: AtomicU64,
    notifications: AtomicU64,
    refreshes: AtomicU64,
    timer_arms: AtomicU64,
    finishers_installed: AtomicU64,
    hook_errors: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionMetricsSnapshot {
    pub bursts_started: u64,
    pub resolved_by_trigger: u64,
    pub resolved_by_finisher: u64,
    pub resolved_by_finish: u64,
    pub discarded: u64,
    pub forced_closes: u64,
    pub teardowns: u64,
    pub notifications: u64,
    pub refreshes: u64,
    pub timer_arms: u64,
    pub finishers_installed: u64,
    pub hook_errors: u64,
}

impl SessionMetricsSnapshot {
    pub fn resolved(&self) -> u64 {
        self.resolved_by_trigger + self.resolved_by_finisher + self.resolved_by_finish
    }
}

impl SessionMetrics {
    pub fn snapshot(&self) -> SessionMetricsSnapshot {
        use Ordering::Relaxed;
        SessionMetricsSnapshot {
            bursts_started: self.bursts_started.load(Relaxed),
            resolved_by_trigger: self.resolved_by_trigger.load(Relaxed),
            resolved_by_finisher: self.resolved_by_finisher.load(Relaxed),
            resolved_by_finish: self.resolved_by_finish.load(Relaxed),
            discarded: self.discarded.load(Relaxed),
            forced_closes: self.forced_closes.load(Relaxed),
            teardowns: self.teardowns.load(Relaxed),
            notifications: self.notifications.load(Relaxed),
            refreshes: self.refreshes.load(Relaxed),
            timer_arms: self.timer_arms.load(Relaxed),
            finishers_installed: self.finishers_installed.load(Relaxed),
            hook_errors: self.hook_errors.load(Relaxed),
        }
    }

    fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

pub struct ActionSession<H, S: Default> {
    registry: Registry<H, S>,
    settings: SessionSettings,
    timer: IdleTimer,
    burst: Burst,
    scratch: S,
    finisher: Option<Finisher<H, S>>,
    delay: Option<IdleInterval>,
    active: bool,
    last_activity: Option<Instant>,
    metrics: SessionMetrics,
}

impl<H, S: Default> ActionSession<H, S> {
    pub fn new(handlers: Vec<Handler<H, S>>, settings: SessionSettings) -> Self {
        Self::with_registry(Registry::new(handlers), settings)
    }

    pub fn with_registry(registry: Registry<H, S>, settings: SessionSettings) -> Self {
        Self {
            registry,
            timer: IdleTimer::new(settings.frame_interval),
            settings,
            burst: Burst::new(),
            scratch: S::default(),
            finisher: None,
            delay: None,
            active: false,
            last_activity: None,
            metrics: SessionMetrics::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        match (self.active, self.finisher.is_some()) {
            (false, _) => SessionState::Idle,
            (true, false) => SessionState::Searching,
            (true, true) => SessionState::Continuing,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn burst(&self) -> &Burst {
        &self.burst
    }

    pub fn scratch(&self) -> &S {
        &self.scratch
    }

    pub fn registry(&self) -> &Registry<H, S> {
        &self.registry
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// When the pending idle arm fires, if any.
    pub fn idle_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn arm_token(&self) -> Option<ArmToken> {
        self.timer.token()
    }

    pub fn metrics(&self) -> SessionMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Feed one notification. The notification's timestamp is the reference
    /// instant for the idle timer.
    pub fn trigger(&mut self, notification: Notification, host: &mut H) -> SessionResult<Resolution> {
        let now = notification.timestamp;
        let starting = !self.active;
        if starting {
            self.active = true;
            SessionMetrics::incr(&self.metrics.bursts_started);
            BURSTS_STARTED.fetch_add(1, Ordering::Relaxed);
            debug!(target: "ime.session", first = %notification, "burst_start");
        }
        self.last_activity = Some(now);
        self.arm(now);
        if starting {
            self.run_setup(host)
                .inspect_err(|_| SessionMetrics::incr(&self.metrics.hook_errors))?;
        }

        self.burst.push(notification.clone());
        SessionMetrics::incr(&self.metrics.notifications);
        NOTIFICATIONS_BUFFERED.fetch_add(1, Ordering::Relaxed);
        trace!(
            target: "ime.session",
            notification = %notification,
            burst_len = self.burst.len(),
            state = ?self.state(),
            "notification_dispatch"
        );

        let delay_before = self.delay;
        let resolution = self.dispatch(&notification, host)?;
        if resolution.is_open() {
            if self.delay != delay_before {
                self.arm(now);
            }
            if self.burst.len() >= self.settings.max_burst_len {
                warn!(
                    target: "ime.session",
                    burst_len = self.burst.len(),
                    max = self.settings.max_burst_len,
                    "burst_cap_reached"
                );
                SessionMetrics::incr(&self.metrics.forced_closes);
                return self.expire(now, host);
            }
        }
        Ok(resolution)
    }

    /// Buffer a low-signal notification (e.g. selection change) and push the
    /// idle deadline back without offering it to any hook.
    pub fn refresh(&mut self, notification: Notification) -> Resolution {
        if !self.active {
            trace!(target: "ime.session", notification = %notification, "refresh_ignored");
            return Resolution::Ignored;
        }
        let now = notification.timestamp;
        self.last_activity = Some(now);
        self.arm(now);
        self.burst.push(notification);
        SessionMetrics::incr(&self.metrics.refreshes);
        NOTIFICATIONS_BUFFERED.fetch_add(1, Ordering::Relaxed);
        self.open_state()
    }

    /// Override the quiet period for the rest of the current burst and re-arm
    /// from the last notification.
    pub fn set_delay(&mut self, delay: Duration) -> SessionResult<()> {
        self.set_interval(IdleInterval::After(delay))
    }

    pub fn set_interval(&mut self, interval: IdleInterval) -> SessionResult<()> {
        if !self.active {
            warn!(target: "ime.session", ?interval, "set_delay_while_idle");
            return Err(SessionError::NotActive);
        }
        self.delay = Some(interval);
        if let Some(at) = self.last_activity {
            self.arm(at);
        }
        Ok(())
    }

    /// Run idle expiry if the pending arm is due at `now`.
    pub fn poll_idle(&mut self, now: Instant, host: &mut H) -> SessionResult<Resolution> {
        if !self.active {
            return Ok(Resolution::Ignored);
        }
        match self.timer.fire_if_due(now) {
            Some(_) => self.expire(now, host),
            None => Ok(self.open_state()),
        }
    }

    /// Run idle expiry for the arm identified by `token`. Stale tokens (the
    /// timer was re-armed or stopped since) are ignored.
    pub fn fire(&mut self, token: ArmToken, now: Instant, host: &mut H) -> SessionResult<Resolution> {
        if !self.active || !self.timer.claim(token) {
            return Ok(Resolution::Ignored);
        }
        self.expire(now, host)
    }

    fn open_state(&self) -> Resolution {
        if self.finisher.is_some() {
            Resolution::Continuing
        } else {
            Resolution::Pending
        }
    }

    fn arm(&mut self, now: Instant) {
        let interval = self.delay.unwrap_or(self.settings.idle);
        self.timer.start(interval, now);
        SessionMetrics::incr(&self.metrics.timer_arms);
    }

    fn parts<'a>(&'a mut self, host: &'a mut H) -> (&'a Registry<H, S>, Context<'a, H, S>) {
        let ctx = Context {
            host,
            scratch: &mut self.scratch,
            burst: &self.burst,
            delay: &mut self.delay,
            default_delay: self.settings.idle,
        };
        (&self.registry, ctx)
    }

    fn dispatch(&mut self, notification: &Notification, host: &mut H) -> SessionResult<Resolution> {
        if let Some(finisher) = self.finisher.take() {
            match self.call_finisher(finisher, notification, host)? {
                MatchResult::Resolved(true) => return self.resolve(ResolvedBy::Finisher, host),
                MatchResult::Continue(next) => {
                    debug!(target: "ime.session", "finisher_extended");
                    self.finisher = Some(next);
                    return Ok(Resolution::Continuing);
                }
                MatchResult::Resolved(false) => {
                    debug!(target: "ime.session", "finisher_abandoned");
                }
            }
        }
        match self.search(HookKind::Trigger, Some(notification), host)? {
            Some((name, MatchResult::Continue(finisher))) => {
                self.install(&name, finisher);
                Ok(Resolution::Continuing)
            }
            Some((name, _)) => self.resolve(ResolvedBy::Trigger(name), host),
            None => Ok(Resolution::Pending),
        }
    }

    fn expire(&mut self, now: Instant, host: &mut H) -> SessionResult<Resolution> {
        debug!(
            target: "ime.session",
            burst_len = self.burst.len(),
            continuing = self.finisher.is_some(),
            "idle_expired"
        );
        self.arm(now);
        let delay_before = self.delay;
        let resolution = self.run_expiry(now, host)?;
        if resolution.is_open() && self.delay != delay_before {
            self.arm(now);
        }
        Ok(resolution)
    }

    /// Offer the timeout to the finisher, then triggers, then finish hooks.
    fn run_expiry(&mut self, now: Instant, host: &mut H) -> SessionResult<Resolution> {
        let timeout = Notification::timeout().at(now);

        if let Some(finisher) = self.finisher.take() {
            match self.call_finisher(finisher, &timeout, host)? {
                MatchResult::Resolved(true) => return self.resolve(ResolvedBy::Finisher, host),
                MatchResult::Continue(next) => {
                    debug!(target: "ime.session", "finisher_extended_on_timeout");
                    self.finisher = Some(next);
                    return Ok(Resolution::Continuing);
                }
                MatchResult::Resolved(false) => {
                    debug!(target: "ime.session", "finisher_abandoned_on_timeout");
                }
            }
        }
        match self.search(HookKind::Trigger, Some(&timeout), host)? {
            Some((name, MatchResult::Continue(finisher))) => {
                self.install(&name, finisher);
                return Ok(Resolution::Continuing);
            }
            Some((name, _)) => return self.resolve(ResolvedBy::Trigger(name), host),
            None => {}
        }
        match self.search(HookKind::Finish, None, host)? {
            Some((name, MatchResult::Continue(finisher))) => {
                self.install(&name, finisher);
                Ok(Resolution::Continuing)
            }
            Some((name, _)) => self.resolve(ResolvedBy::Finish(name), host),
            None => {
                debug!(target: "ime.session", burst_len = self.burst.len(), "burst_discarded");
                SessionMetrics::incr(&self.metrics.discarded);
                BURSTS_DISCARDED.fetch_add(1, Ordering::Relaxed);
                self.teardown(host)?;
                Ok(Resolution::Discarded)
            }
        }
    }

    /// First trigger (with `notification`) or finish hook that claims the burst.
    fn search(
        &mut self,
        kind: HookKind,
        notification: Option<&Notification>,
        host: &mut H,
    ) -> SessionResult<Option<(String, MatchResult<H, S>)>> {
        let found = {
            let (registry, mut ctx) = self.parts(host);
            let indices = match kind {
                HookKind::Finish => registry.with_finish(),
                _ => registry.with_trigger(),
            };
            let mut found = Ok(None);
            for &index in indices {
                let Some(handler) = registry.get(index) else {
                    continue;
                };
                let result = match (kind, notification) {
                    (HookKind::Finish, _) => handler.finish.as_ref().map(|hook| hook(&mut ctx)),
                    (_, Some(n)) => handler.trigger.as_ref().map(|hook| hook(n, &mut ctx)),
                    (_, None) => None,
                };
                match result {
                    Some(Ok(result)) if result.claims() => {
                        found = Ok(Some((handler.name().to_string(), result)));
                        break;
                    }
                    Some(Err(err)) => {
                        found = Err(SessionError::hook(handler.name(), kind, err));
                        break;
                    }
                    _ => {}
                }
            }
            found
        };
        if found.is_err() {
            SessionMetrics::incr(&self.metrics.hook_errors);
        }
        if let Ok(Some((name, _))) = &found {
            debug!(target: "ime.session", handler = %name, hook = %kind, "handler_matched");
        }
        found
    }

    fn call_finisher(
        &mut self,
        finisher: Finisher<H, S>,
        notification: &Notification,
        host: &mut H,
    ) -> SessionResult<MatchResult<H, S>> {
        let result = {
            let (_, mut ctx) = self.parts(host);
            finisher.call(notification, &mut ctx)
        };
        result.map_err(|err| {
            SessionMetrics::incr(&self.metrics.hook_errors);
            SessionError::Finisher { source: err.into() }
        })
    }

    fn install(&mut self, handler: &str, finisher: Finisher<H, S>) {
        debug!(target: "ime.session", handler, "finisher_installed");
        SessionMetrics::incr(&self.metrics.finishers_installed);
        self.finisher = Some(finisher);
    }

    fn resolve(&mut self, by: ResolvedBy, host: &mut H) -> SessionResult<Resolution> {
        let counter = match by {
            ResolvedBy::Trigger(_) => &self.metrics.resolved_by_trigger,
            ResolvedBy::Finisher => &self.metrics.resolved_by_finisher,
            ResolvedBy::Finish(_) => &self.metrics.resolved_by_finish,
        };
        SessionMetrics::incr(counter);
        BURSTS_RESOLVED.fetch_add(1, Ordering::Relaxed);
        debug!(target: "ime.session", by = ?by, burst_len = self.burst.len(), "burst_resolved");
        self.teardown(host)?;
        Ok(Resolution::Resolved(by))
    }

    fn run_setup(&mut self, host: &mut H) -> SessionResult<()> {
        let (registry, mut ctx) = self.parts(host);
        for &index in registry.with_setup() {
            let Some(handler) = registry.get(index) else {
                continue;
            };
            if let Some(hook) = handler.setup.as_ref() {
                hook(&mut ctx).map_err(|err| SessionError::hook(handler.name(), HookKind::Setup, err))?;
            }
        }
        Ok(())
    }

    fn teardown(&mut self, host: &mut H) -> SessionResult<()> {
        self.timer.stop();
        let mut first_err = None;
        {
            let (registry, mut ctx) = self.parts(host);
            for &index in registry.with_teardown() {
                let Some(handler) = registry.get(index) else {
                    continue;
                };
                let Some(hook) = handler.teardown.as_ref() else {
                    continue;
                };
                if let Err(err) = hook(&mut ctx)
                    && first_err.is_none()
                {
                    first_err = Some(SessionError::hook(handler.name(), HookKind::Teardown, err));
                }
            }
        }
        self.burst.clear();
        self.scratch = S::default();
        self.finisher = None;
        self.delay = None;
        self.active = false;
        self.last_activity = None;
        SessionMetrics::incr(&self.metrics.teardowns);
        trace!(target: "ime.session", "session_reset");
        match first_err {
            Some(err) => {
                SessionMetrics::incr(&self.metrics.hook_errors);
                Err(err)
            }
            None => Ok(()),
        }
    }
}

impl<H, S: Default> std::fmt::Debug for ActionSession<H, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionSession")
            .field("state", &self.state())
            .field("burst_len", &self.burst.len())
            .field("deadline", &self.timer.deadline())
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::{KeyName, NotificationKind};

    type Log = Vec<String>;

    fn settings() -> SessionSettings {
        SessionSettings {
            idle: IdleInterval::After(Duration::from_millis(20)),
            ..SessionSettings::default()
        }
    }

    #[test]
    fn first_notification_runs_setup_and_arms() {
        let mut session: ActionSession<Log, ()> = ActionSession::new(
            vec![Handler::<Log, ()>::new("setup").on_setup(|ctx| {
                ctx.host.push("setup".into());
                Ok(())
            })],
            settings(),
        );
        let mut log = Log::new();
        let t0 = Instant::now();
        let r = session
            .trigger(Notification::key_down(KeyName::Char('a')).at(t0), &mut log)
            .unwrap();
        assert_eq!(r, Resolution::Pending);
        assert_eq!(log, vec!["setup"]);
        assert_eq!(session.state(), SessionState::Searching);
        assert_eq!(session.idle_deadline(), Some(t0 + Duration::from_millis(20)));
    }

    #[test]
    fn abandoned_finisher_falls_back_to_search() {
        let mut session: ActionSession<Log, ()> = ActionSession::new(
            vec![Handler::<Log, ()>::new("matcher").on_trigger(|n, ctx| {
                if n.is(NotificationKind::KeyDown) {
                    return Ok(MatchResult::<Log, ()>::continue_with(|_, ctx| {
                        ctx.host.push("finisher".into());
                        Ok(MatchResult::unmatched())
                    }));
                }
                ctx.host.push(format!("search {}", n.kind));
                Ok(MatchResult::matched())
            })],
            settings(),
        );
        let mut log = Log::new();
        let t0 = Instant::now();
        let r = session
            .trigger(Notification::key_down(KeyName::Enter).at(t0), &mut log)
            .unwrap();
        assert_eq!(r, Resolution::Continuing);
        let r = session
            .trigger(Notification::key_up(KeyName::Enter).at(t0), &mut log)
            .unwrap();
        assert_eq!(r, Resolution::Resolved(ResolvedBy::Trigger("matcher".into())));
        assert_eq!(log, vec!["finisher", "search keyup"]);
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.idle_deadline().is_none());
    }

    #[test]
    fn finisher_delay_on_timeout_rearms() {
        let mut session: ActionSession<Log, ()> = ActionSession::new(
            vec![Handler::<Log, ()>::new("slow").on_trigger(|_, _| {
                Ok(MatchResult::<Log, ()>::continue_with(|n, ctx| {
                    if n.is(NotificationKind::Timeout) {
                        ctx.set_delay(Duration::from_millis(100));
                        ctx.host.push("extended".into());
                        return Ok(MatchResult::continue_with(|_, _| Ok(MatchResult::matched())));
                    }
                    Ok(MatchResult::unmatched())
                }))
            })],
            settings(),
        );
        let mut log = Log::new();
        let t0 = Instant::now();
        session
            .trigger(Notification::key_down(KeyName::Unidentified).at(t0), &mut log)
            .unwrap();
        let fired = t0 + Duration::from_millis(20);
        assert_eq!(session.poll_idle(fired, &mut log).unwrap(), Resolution::Continuing);
        assert_eq!(log, vec!["extended"]);
        assert_eq!(session.idle_deadline(), Some(fired + Duration::from_millis(100)));
        assert_eq!(
            session.poll_idle(fired + Duration::from_millis(20), &mut log).unwrap(),
            Resolution::Continuing
        );
    }

    #[test]
    fn set_delay_requires_active_burst() {
        let mut session: ActionSession<Log, ()> = ActionSession::new(vec![], settings());
        assert!(matches!(
            session.set_delay(Duration::from_millis(5)),
            Err(SessionError::NotActive)
        ));
        let t0 = Instant::now();
        session
            .trigger(Notification::composition_start().at(t0), &mut Log::new())
            .unwrap();
        session.set_delay(Duration::from_millis(100)).unwrap();
        assert_eq!(session.idle_deadline(), Some(t0 + Duration::from_millis(100)));
    }

    #[test]
    fn refresh_is_ignored_while_idle() {
        let mut session: ActionSession<Log, ()> = ActionSession::new(vec![], settings());
        assert_eq!(
            session.refresh(Notification::selection_change()),
            Resolution::Ignored
        );
        assert!(session.burst().is_empty());
    }

    #[test]
    fn stale_token_is_ignored() {
        let mut session: ActionSession<Log, ()> = ActionSession::new(vec![], settings());
        let mut log = Log::new();
        let t0 = Instant::now();
        session
            .trigger(Notification::composition_start().at(t0), &mut log)
            .unwrap();
        let stale = session.arm_token().unwrap();
        session
            .trigger(Notification::composition_update("a").at(t0), &mut log)
            .unwrap();
        assert_eq!(
            session.fire(stale, t0, &mut log).unwrap(),
            Resolution::Ignored
        );
        let live = session.arm_token().unwrap();
        assert_eq!(
            session.fire(live, t0, &mut log).unwrap(),
            Resolution::Discarded
        );
    }
}
