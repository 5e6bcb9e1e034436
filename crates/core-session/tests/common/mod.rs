#![allow(dead_code)] // Shared across integration tests; each test binary uses a subset of helpers.

use core_events::{KeyName, Notification, NotificationKind};
use core_session::{
    ActionSession, Context, Handler, IdleInterval, MatchResult, SessionSettings,
};
use std::time::{Duration, Instant};

pub const QUIET: Duration = Duration::from_millis(20);

/// Host that records every hook invocation as `"<hook>:<handler>[:detail]"`.
#[derive(Debug, Default)]
pub struct Recorder {
    pub calls: Vec<String>,
    pub finished_bursts: Vec<Vec<NotificationKind>>,
}

impl Recorder {
    pub fn count(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(prefix)).count()
    }
}

/// Burst scratch used to check the reset on teardown.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Scratch {
    pub seen: usize,
}

pub type TestSession = ActionSession<Recorder, Scratch>;
pub type TestHandler = Handler<Recorder, Scratch>;
pub type TestContext<'a> = Context<'a, Recorder, Scratch>;

pub fn settings() -> SessionSettings {
    SessionSettings {
        idle: IdleInterval::After(QUIET),
        ..SessionSettings::default()
    }
}

pub fn session(handlers: Vec<TestHandler>) -> TestSession {
    ActionSession::new(handlers, settings())
}

/// Handler recording all four hooks. Its trigger claims notifications of
/// `trigger_on`; its finish claims every burst when `finish_matches`.
pub fn recorder(
    name: &'static str,
    trigger_on: Option<NotificationKind>,
    finish_matches: bool,
) -> TestHandler {
    TestHandler::new(name)
        .on_setup(move |ctx| {
            ctx.host.calls.push(format!("setup:{name}"));
            Ok(())
        })
        .on_trigger(move |n, ctx| {
            ctx.host.calls.push(format!("trigger:{name}:{}", n.kind));
            ctx.scratch.seen += 1;
            Ok(MatchResult::from(trigger_on == Some(n.kind)))
        })
        .on_finish(move |ctx| {
            ctx.host.calls.push(format!("finish:{name}"));
            let kinds = ctx.burst().kinds();
            ctx.host.finished_bursts.push(kinds);
            Ok(MatchResult::from(finish_matches))
        })
        .on_teardown(move |ctx| {
            ctx.host.calls.push(format!("teardown:{name}"));
            Ok(())
        })
}

/// Notification of `kind` stamped at `at`.
pub fn note(kind: NotificationKind, at: Instant) -> Notification {
    let n = match kind {
        NotificationKind::KeyDown => Notification::key_down(KeyName::Char('x')),
        NotificationKind::KeyUp => Notification::key_up(KeyName::Char('x')),
        NotificationKind::CompositionUpdate => Notification::composition_update("x"),
        NotificationKind::CompositionEnd => Notification::composition_end("x"),
        NotificationKind::TextInput => Notification::text_input("x"),
        other => Notification::new(other),
    };
    n.at(at)
}

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}
