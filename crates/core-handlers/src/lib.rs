//! Built-in quirk handler sets.
//!
//! Each profile is an ordered handler list for `core-session`; the order is
//! part of the contract (most specific signature first, generic fallback
//! last). Handlers operate on an `ImeHost`, which pairs the document model
//! with its rendered surface and keeps input-method state (composition status,
//! nodes touched by the composition) across bursts. The per-burst
//! `BurstScratch` carries the surface snapshot taken at setup.
//!
//! Resolution strategies used by the handlers:
//! - reconcile: the surface holds the intended text, pull it into the model;
//! - revert and replay: the platform mutation cannot be trusted, restore the
//!   setup snapshot and issue the equivalent structured edit on the model.
//!
//! Embedders re-render the surface from the model after a resolution; the
//! handlers never render.

pub mod api26;
pub mod api28;
mod common;
pub mod host;

pub use common::burst_logger;
pub use host::{
    BurstScratch, Composition, ImeContext, ImeHandler, ImeHost, ImeMatch, ImeScratch, ImeSession,
};

use core_config::{Config, QuirkProfile};
use core_model::DocumentModel;
use core_session::ActionSession;
use core_surface::Surface;
use std::time::Duration;
use tracing::info;

/// Ordered handler list for `profile`. `settle_delay` is how long handlers
/// that must outwait the platform's own surface mutation hold a burst open.
pub fn handlers_for<M, S>(profile: QuirkProfile, settle_delay: Duration) -> Vec<ImeHandler<M, S>>
where
    M: DocumentModel + 'static,
    S: Surface + 'static,
{
    match profile {
        QuirkProfile::Api26 => api26::handlers(),
        QuirkProfile::Api28 => api28::handlers(settle_delay),
    }
}

/// Session with the configured profile, preceded by `burst_logger`.
pub fn session_from_config<M, S>(config: &Config) -> ImeSession<M, S>
where
    M: DocumentModel + 'static,
    S: Surface + 'static,
{
    let mut handlers = vec![burst_logger()];
    handlers.extend(handlers_for(config.profile(), config.settle_delay()));
    info!(
        target: "ime.handlers",
        profile = ?config.profile(),
        handlers = handlers.len(),
        settle_ms = config.settle_delay().as_millis() as u64,
        "handler_set_installed"
    );
    ActionSession::new(handlers, config.session_settings())
}
