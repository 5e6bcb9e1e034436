//! Property-based tests for burst ordering, atomicity, handler priority and
//! timer re-arming.

mod common;

use common::{QUIET, Recorder, TestHandler, ms, note, recorder, session};
use core_events::NotificationKind;
use core_session::{MatchResult, Resolution};
use proptest::prelude::*;
use std::time::Instant;

fn kind() -> impl Strategy<Value = NotificationKind> {
    prop_oneof![
        Just(NotificationKind::KeyDown),
        Just(NotificationKind::KeyUp),
        Just(NotificationKind::CompositionStart),
        Just(NotificationKind::CompositionUpdate),
        Just(NotificationKind::CompositionEnd),
        Just(NotificationKind::BeforeInput),
        Just(NotificationKind::Input),
        Just(NotificationKind::TextInput),
        Just(NotificationKind::SelectionChange),
    ]
}

proptest! {
    // The burst seen at finish time is every trigger/refresh in call order.
    #[test]
    fn burst_preserves_call_order(
        first in kind(),
        rest in prop::collection::vec((kind(), any::<bool>()), 0..40),
    ) {
        let mut s = session(vec![recorder("observer", None, false)]);
        let mut host = Recorder::default();
        let t0 = Instant::now();
        s.trigger(note(first, t0), &mut host).unwrap();
        let mut expected = vec![first];
        for (i, (k, via_refresh)) in rest.iter().enumerate() {
            let at = t0 + ms(i as u64 + 1);
            if *via_refresh {
                s.refresh(note(*k, at));
            } else {
                s.trigger(note(*k, at), &mut host).unwrap();
            }
            expected.push(*k);
        }
        let deadline = s.idle_deadline().unwrap();
        prop_assert_eq!(s.poll_idle(deadline, &mut host).unwrap(), Resolution::Discarded);
        prop_assert_eq!(host.finished_bursts, vec![expected]);
    }

    // Every burst ends in exactly one resolution path and one teardown.
    #[test]
    fn each_burst_resolves_once(
        kinds in prop::collection::vec(kind(), 1..40),
        finish_matches in any::<bool>(),
    ) {
        let mut s = session(vec![recorder(
            "h",
            Some(NotificationKind::CompositionEnd),
            finish_matches,
        )]);
        let mut host = Recorder::default();
        let t0 = Instant::now();
        for (i, k) in kinds.iter().enumerate() {
            s.trigger(note(*k, t0 + ms(i as u64)), &mut host).unwrap();
        }
        if let Some(deadline) = s.idle_deadline() {
            let r = s.poll_idle(deadline, &mut host).unwrap();
            prop_assert!(!r.is_open());
        }
        let m = s.metrics();
        prop_assert_eq!(m.teardowns, m.bursts_started);
        prop_assert_eq!(m.resolved() + m.discarded, m.bursts_started);
        prop_assert_eq!(host.count("setup:h") as u64, m.bursts_started);
        prop_assert_eq!(host.count("teardown:h") as u64, m.bursts_started);
        prop_assert!(!s.is_active());
    }

    // When two handlers would both claim a notification, only the earlier one
    // ever runs for it.
    #[test]
    fn earlier_handler_wins(k in kind(), extra in 0usize..4) {
        let mut handlers: Vec<TestHandler> = (0..extra)
            .map(|_| TestHandler::new("pass").on_trigger(|_, _| Ok(MatchResult::unmatched())))
            .collect();
        handlers.push(recorder("first", Some(k), false));
        handlers.push(recorder("second", Some(k), false));
        let mut s = session(handlers);
        let mut host = Recorder::default();
        let r = s.trigger(note(k, Instant::now()), &mut host).unwrap();
        prop_assert_eq!(r.resolved_by().cloned(), Some(core_session::ResolvedBy::Trigger("first".into())));
        prop_assert_eq!(host.count("trigger:first"), 1);
        prop_assert_eq!(host.count("trigger:second"), 0);
    }

    // Each trigger leaves exactly one pending arm, measured from its timestamp.
    #[test]
    fn trigger_rearms_exactly_once(gaps in prop::collection::vec(0u64..19, 1..30)) {
        let mut s = session(vec![recorder("observer", None, false)]);
        let mut host = Recorder::default();
        let mut at = Instant::now();
        for (i, gap) in gaps.iter().enumerate() {
            at += ms(*gap);
            // Gaps stay under the quiet period, so nothing expires in between.
            prop_assert!(s.poll_idle(at, &mut host).unwrap().is_open() || i == 0);
            s.trigger(note(NotificationKind::Input, at), &mut host).unwrap();
            prop_assert_eq!(s.idle_deadline(), Some(at + QUIET));
            prop_assert_eq!(s.metrics().timer_arms, i as u64 + 1);
        }
        prop_assert!(s.poll_idle(at + QUIET - ms(1), &mut host).unwrap().is_open());
        prop_assert_eq!(s.poll_idle(at + QUIET, &mut host).unwrap(), Resolution::Discarded);
        prop_assert_eq!(s.idle_deadline(), None);
    }
}
