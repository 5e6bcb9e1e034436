//! Restartable one-shot idle timer.
//!
//! The timer is a deadline, not a thread. Its owner polls `fire_if_due` (or a
//! runtime adapter sleeps until `deadline` and then calls `claim` with the
//! token it was handed). At most one arm is outstanding: `start` implicitly
//! stops the previous arm, and a fired or stopped arm is never delivered.
//!
//! Tokens make stale deliveries detectable. An adapter that slept on an old
//! deadline and wakes after a re-arm holds a token that no longer matches and
//! `claim` rejects it.

use std::time::{Duration, Instant};
use tracing::trace;

/// How long the session waits for the platform to go quiet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleInterval {
    /// The next paint tick (one frame interval).
    NextFrame,
    After(Duration),
}

impl IdleInterval {
    /// `0` means next frame.
    pub fn from_millis(ms: u64) -> Self {
        if ms == 0 {
            IdleInterval::NextFrame
        } else {
            IdleInterval::After(Duration::from_millis(ms))
        }
    }

    pub fn resolve(self, frame: Duration) -> Duration {
        match self {
            IdleInterval::NextFrame => frame,
            IdleInterval::After(d) => d,
        }
    }
}

/// Identity of one arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArmToken(u64);

#[derive(Debug)]
pub struct IdleTimer {
    frame: Duration,
    armed: Option<(ArmToken, Instant)>,
    next_token: u64,
}

impl IdleTimer {
    pub fn new(frame: Duration) -> Self {
        Self {
            frame,
            armed: None,
            next_token: 0,
        }
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame
    }

    /// Arm for `interval` after `now`, replacing any pending arm.
    pub fn start(&mut self, interval: IdleInterval, now: Instant) -> ArmToken {
        let replaced = self.stop();
        self.next_token += 1;
        let token = ArmToken(self.next_token);
        let deadline = now + interval.resolve(self.frame);
        self.armed = Some((token, deadline));
        trace!(target: "ime.timer", token = token.0, ?interval, replaced, "timer_arm");
        token
    }

    /// Cancel the pending arm. Returns false when nothing was armed.
    pub fn stop(&mut self) -> bool {
        match self.armed.take() {
            Some((token, _)) => {
                trace!(target: "ime.timer", token = token.0, "timer_stop");
                true
            }
            None => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.armed.map(|(_, deadline)| deadline)
    }

    pub fn token(&self) -> Option<ArmToken> {
        self.armed.map(|(token, _)| token)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Fire the pending arm if its deadline has passed. Fires exactly once.
    pub fn fire_if_due(&mut self, now: Instant) -> Option<ArmToken> {
        match self.armed {
            Some((token, deadline)) if now >= deadline => {
                self.armed = None;
                trace!(target: "ime.timer", token = token.0, "timer_fire");
                Some(token)
            }
            _ => None,
        }
    }

    /// Fire the arm identified by `token`, regardless of the clock. Stale or
    /// already fired tokens are rejected.
    pub fn claim(&mut self, token: ArmToken) -> bool {
        if self.token() == Some(token) {
            self.armed = None;
            trace!(target: "ime.timer", token = token.0, "timer_claim");
            true
        } else {
            trace!(target: "ime.timer", token = token.0, "timer_claim_stale");
            false
        }
    }
}
