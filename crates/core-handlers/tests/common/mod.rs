#![allow(dead_code)] // Shared across integration tests; each test binary uses a subset of helpers.

use core_config::QuirkProfile;
use core_handlers::{ImeHost, ImeSession, handlers_for};
use core_model::{MemoryDocument, ModelCommand, NodeKey, Point, Range};
use core_session::{ActionSession, IdleInterval, SessionSettings};
use core_surface::{NodeId, Surface, SurfaceSelection, SurfaceTree};
use std::time::{Duration, Instant};

pub const QUIET: Duration = Duration::from_millis(20);
pub const SETTLE: Duration = Duration::from_millis(100);

pub type Host = ImeHost<MemoryDocument, SurfaceTree>;
pub type Session = ImeSession<MemoryDocument, SurfaceTree>;

/// Key of the first text node of `MemoryDocument::from_paragraphs`.
pub const FIRST_TEXT: NodeKey = NodeKey(2);

pub fn settings() -> SessionSettings {
    SessionSettings {
        idle: IdleInterval::After(QUIET),
        ..SessionSettings::default()
    }
}

pub fn session(profile: QuirkProfile) -> Session {
    ActionSession::new(handlers_for(profile, SETTLE), settings())
}

/// Single-paragraph document rendered with the caret at `caret`.
pub fn host(text: &str, caret: usize) -> Host {
    let doc = MemoryDocument::from_paragraphs(&[text])
        .with_selection(Range::collapsed(Point::new(FIRST_TEXT, caret)));
    let surface = SurfaceTree::render(&doc);
    ImeHost::new(doc, surface)
}

pub fn caret_node(host: &Host) -> NodeId {
    host.surface
        .selection()
        .expect("surface caret")
        .anchor
        .node
}

/// What the input method does behind our back: rewrite the caret text node
/// and move the caret inside it.
pub fn platform_edit(host: &mut Host, text: &str, caret: usize) {
    let node = caret_node(host);
    assert!(host.surface.set_text(node, text));
    host.surface
        .set_selection(Some(SurfaceSelection::caret(node, caret)));
}

pub fn ms(base: Instant, offset: u64) -> Instant {
    base + Duration::from_millis(offset)
}

/// Long after any quiet period.
pub fn idle_after(base: Instant) -> Instant {
    ms(base, 1_000)
}

pub fn structural(host: &Host) -> Vec<ModelCommand> {
    host.model
        .journal()
        .iter()
        .filter(|c| c.is_structural())
        .cloned()
        .collect()
}

pub fn caret(offset: usize) -> Range {
    Range::collapsed(Point::new(FIRST_TEXT, offset))
}
