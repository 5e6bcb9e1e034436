//! Action session: buffer a burst of input-method notifications and decide
//! which user-level action it was.
//!
//! Components:
//! - `timer`: restartable one-shot idle deadline bounding a burst.
//! - `handler`: named hook bundles, `MatchResult`, `Finisher`.
//! - `registry`: ordered handler list with per-hook subsets.
//! - `session`: the state machine (`Idle` → `Searching` ⇄ `Continuing` → `Idle`).
//!
//! The session is generic over the host `H` (document model, surface, and any
//! per-editor state the handlers need) and the burst scratch `S`. The host is
//! borrowed fresh on every call and never retained; the scratch is reset to
//! `S::default()` on every teardown.
//!
//! Single-threaded and non-reentrant: a hook receives `&mut Context` and has
//! no path back into the session, so it cannot feed a notification into the
//! burst it is handling.

pub mod handler;
pub mod registry;
pub mod session;
pub mod timer;

pub use handler::{Finisher, Handler, HookKind, HookSet, MatchResult};
pub use registry::Registry;
pub use session::{
    ActionSession, Context, Resolution, ResolvedBy, SessionMetrics, SessionMetricsSnapshot,
    SessionState,
};
pub use timer::{ArmToken, IdleInterval, IdleTimer};

use std::time::Duration;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no burst is active")]
    NotActive,
    #[error("{hook} of handler `{handler}` failed: {source}")]
    Hook {
        handler: String,
        hook: HookKind,
        source: BoxError,
    },
    #[error("finisher failed: {source}")]
    Finisher { source: BoxError },
}

impl SessionError {
    pub(crate) fn hook(handler: &str, hook: HookKind, err: anyhow::Error) -> Self {
        SessionError::Hook {
            handler: handler.to_string(),
            hook,
            source: err.into(),
        }
    }

    /// Name of the failing handler, if a named hook failed.
    pub fn handler(&self) -> Option<&str> {
        match self {
            SessionError::Hook { handler, .. } => Some(handler),
            _ => None,
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Session tuning, usually produced by `core-config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Default quiet period closing a burst.
    pub idle: IdleInterval,
    /// Length of one paint tick (`IdleInterval::NextFrame`).
    pub frame_interval: Duration,
    /// A burst reaching this many notifications is closed immediately.
    pub max_burst_len: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle: IdleInterval::NextFrame,
            frame_interval: Duration::from_millis(16),
            max_burst_len: 256,
        }
    }
}
