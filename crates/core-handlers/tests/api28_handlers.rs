mod common;

use common::*;
use core_config::QuirkProfile;
use core_events::{InputType, KeyName, Notification};
use core_model::{DocumentModel, ModelCommand, Point};
use core_session::{Resolution, ResolvedBy, SessionState};
use pretty_assertions::assert_eq;
use core_surface::Surface;
use std::time::Instant;

fn trigger(name: &str) -> Resolution {
    Resolution::Resolved(ResolvedBy::Trigger(name.to_string()))
}

#[test]
fn enter_splits_immediately() {
    let mut session = session(QuirkProfile::Api28);
    let mut host = host("hello world", 5);

    let r = session
        .trigger(
            Notification::key_down(KeyName::Enter).at(Instant::now()),
            &mut host,
        )
        .unwrap();
    assert_eq!(r, trigger("enter"));
    assert_eq!(structural(&host), vec![ModelCommand::SplitBlock]);
    assert_eq!(host.model.plain_text(), "hello\n world");
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn enter_pulls_composed_text_in_before_splitting() {
    let mut session = session(QuirkProfile::Api28);
    let mut host = host("hello world", 5);
    let t0 = Instant::now();

    session
        .trigger(Notification::composition_start().at(t0), &mut host)
        .unwrap();
    platform_edit(&mut host, "hellos world", 6);
    session
        .trigger(
            Notification::input(InputType::InsertCompositionText, Some("hellos")).at(ms(t0, 1)),
            &mut host,
        )
        .unwrap();
    let r = session
        .trigger(Notification::key_down(KeyName::Enter).at(ms(t0, 2)), &mut host)
        .unwrap();

    assert_eq!(r, trigger("enter"));
    assert_eq!(host.model.plain_text(), "hellos\n world");
}

#[test]
fn backspace_outside_composition_reverts_and_deletes_one() {
    let mut session = session(QuirkProfile::Api28);
    let mut host = host("hello", 5);
    let t0 = Instant::now();

    session
        .trigger(Notification::delete_backward().at(t0), &mut host)
        .unwrap();
    platform_edit(&mut host, "hell", 4);

    let r = session.poll_idle(idle_after(t0), &mut host).unwrap();
    assert_eq!(r, trigger("composition-less-backspace"));
    assert_eq!(structural(&host), vec![ModelCommand::DeleteBackward(1)]);
    assert_eq!(host.model.text(FIRST_TEXT).as_deref(), Some("hell"));
    assert_eq!(host.surface.plain_text(), "hello");
}

#[test]
fn backspace_after_composition_end_restores_model_selection_first() {
    let mut session = session(QuirkProfile::Api28);
    let mut host = host("hello", 5);
    let t0 = Instant::now();

    let burst = [
        Notification::composition_start(),
        Notification::composition_end("hello"),
        Notification::delete_backward(),
        Notification::composition_start(),
    ];
    for (i, n) in burst.into_iter().enumerate() {
        session.trigger(n.at(ms(t0, i as u64)), &mut host).unwrap();
    }
    assert!(host.is_composing());

    let r = session.poll_idle(idle_after(t0), &mut host).unwrap();
    assert_eq!(r, trigger("composition-end-with-backspace"));
    let journal = host.model.journal();
    assert_eq!(
        journal,
        &[ModelCommand::Select(caret(5)), ModelCommand::DeleteBackward(1)]
    );
    assert_eq!(host.model.text(FIRST_TEXT).as_deref(), Some("hell"));
}

#[test]
fn backspace_after_composition_end_without_setup_caret_uses_end_capture() {
    let mut session = session(QuirkProfile::Api28);
    let mut host = host("hello", 5);
    let t0 = Instant::now();

    host.surface.set_selection(None);
    session
        .trigger(Notification::composition_start().at(t0), &mut host)
        .unwrap();
    assert!(host.surface.place_caret(Point::new(FIRST_TEXT, 5)));
    let rest = [
        Notification::composition_end("hello"),
        Notification::delete_backward(),
        Notification::composition_start(),
    ];
    for (i, n) in rest.into_iter().enumerate() {
        session.trigger(n.at(ms(t0, i as u64 + 1)), &mut host).unwrap();
    }

    let r = session.poll_idle(idle_after(t0), &mut host).unwrap();
    assert_eq!(r, trigger("composition-end-with-backspace"));
    assert_eq!(
        host.model.journal(),
        &[ModelCommand::Select(caret(5)), ModelCommand::DeleteBackward(1)]
    );
    assert_eq!(host.model.text(FIRST_TEXT).as_deref(), Some("hell"));
    assert!(host.composition_end.is_none());
}

#[test]
fn composition_end_reconciles_on_timeout() {
    let mut session = session(QuirkProfile::Api28);
    let mut host = host("it", 2);
    let t0 = Instant::now();

    session
        .trigger(Notification::composition_start().at(t0), &mut host)
        .unwrap();
    platform_edit(&mut host, "its", 3);
    session
        .trigger(
            Notification::input(InputType::InsertCompositionText, Some("its")).at(ms(t0, 1)),
            &mut host,
        )
        .unwrap();
    session
        .trigger(Notification::composition_end("its").at(ms(t0, 2)), &mut host)
        .unwrap();
    assert!(!host.is_composing());
    assert!(host.composition_end.is_some());

    let r = session.poll_idle(idle_after(t0), &mut host).unwrap();
    assert_eq!(r, trigger("default-composition-end"));
    assert_eq!(host.model.text(FIRST_TEXT).as_deref(), Some("its"));
    assert_eq!(host.model.selection(), Some(caret(3)));
}

#[test]
fn period_at_line_end_waits_two_settle_periods() {
    let mut session = session(QuirkProfile::Api28);
    let mut host = host("It is", 5);
    let t0 = Instant::now();

    let r = session
        .trigger(
            Notification::before_input(InputType::InsertText, Some(".")).at(t0),
            &mut host,
        )
        .unwrap();
    assert_eq!(r, Resolution::Continuing);
    assert_eq!(session.idle_deadline(), Some(ms(t0, SETTLE.as_millis() as u64)));

    // Default quiet period has passed, the settle delay has not.
    let r = session.poll_idle(ms(t0, 50), &mut host).unwrap();
    assert_eq!(r, Resolution::Continuing);

    let r = session.poll_idle(ms(t0, 100), &mut host).unwrap();
    assert_eq!(r, Resolution::Continuing);
    assert!(structural(&host).is_empty());

    platform_edit(&mut host, "It is.", 6);
    let r = session.poll_idle(ms(t0, 200), &mut host).unwrap();
    assert_eq!(r, Resolution::Resolved(ResolvedBy::Finisher));
    assert_eq!(host.model.text(FIRST_TEXT).as_deref(), Some("It is."));
}
