//! # Lifecycle State Machine
//!
//! Every simulated actor goes through the same states:
//!
//! ```text
//! STOPPED ──start()──▶ STARTING ──setup ok──▶ STARTED
//!    ▲                     │                     │
//!    │                  stop()                stop()
//!    │                     ▼                     ▼
//!    └───loop unwound─── STOPPING ◀──────────────┘
//! ```
//!
//! [`Lifecycle`] is the single implementation of that machine. It is shared
//! (behind an `Arc`) between the actor handle the supervisor holds and the
//! task running the behavior, and it owns the actor's cancellation token and
//! time multiplier.
//!
//! All transitions are compare-and-set on a `watch` channel, so concurrent
//! `start()`/`stop()` calls from different tasks can never both win.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default simulated-to-real time ratio: one simulated hour in 3.75 real minutes.
pub const DEFAULT_TIME_MULTIPLIER: f64 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorState {
    Stopped,
    Starting,
    Started,
    Stopping,
}

impl ActorState {
    /// True while a behavioral loop may be executing.
    pub fn is_running(&self) -> bool {
        !matches!(self, ActorState::Stopped)
    }
}

impl fmt::Display for ActorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActorState::Stopped => "STOPPED",
            ActorState::Starting => "STARTING",
            ActorState::Started => "STARTED",
            ActorState::Stopping => "STOPPING",
        };
        f.write_str(s)
    }
}

/// Shared lifecycle controller for one actor.
pub struct Lifecycle {
    name: String,
    tag: &'static str,
    state: watch::Sender<ActorState>,
    token: Mutex<CancellationToken>,
    /// `f64` bits.
    time_multiplier: AtomicU64,
}

impl Lifecycle {
    pub fn new(name: impl Into<String>, tag: &'static str) -> Self {
        let (state, _) = watch::channel(ActorState::Stopped);
        Self {
            name: name.into(),
            tag,
            state,
            token: Mutex::new(CancellationToken::new()),
            time_multiplier: AtomicU64::new(DEFAULT_TIME_MULTIPLIER.to_bits()),
        }
    }

    /// The actor's identity (its login email).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short prefix used for backend log entries (`D` for drivers, `R` for riders).
    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn state(&self) -> ActorState {
        *self.state.borrow()
    }

    /// A receiver that observes every state transition.
    pub fn subscribe(&self) -> watch::Receiver<ActorState> {
        self.state.subscribe()
    }

    /// Resolves once the actor is in `target`.
    pub async fn wait_for_state(&self, target: ActorState) {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so this only errs if it is dropped mid-wait.
        let _ = rx.wait_for(|s| *s == target).await;
    }

    /// Atomically moves `from` to `to`. Returns whether the transition happened.
    fn transition(&self, from: &[ActorState], to: ActorState) -> bool {
        let changed = self.state.send_if_modified(|current| {
            if from.contains(current) {
                *current = to;
                true
            } else {
                false
            }
        });
        if changed {
            debug!(actor = %self.name, state = %to, "State changed");
        }
        changed
    }

    /// `STOPPED → STARTING`, returning the token the new run must observe.
    ///
    /// `None` when the actor is in any other state. A token that already fired
    /// is replaced first, so a new run never starts pre-cancelled.
    pub fn try_begin_start(&self) -> Option<CancellationToken> {
        // Held across the transition so a concurrent stop cancels the new token.
        let mut token = self.token.lock().unwrap_or_else(|e| e.into_inner());
        if !self.transition(&[ActorState::Stopped], ActorState::Starting) {
            return None;
        }
        if token.is_cancelled() {
            *token = CancellationToken::new();
        }
        Some(token.clone())
    }

    /// `STARTING → STARTED`. Ignored if a stop arrived during setup.
    pub fn mark_started(&self) -> bool {
        self.transition(&[ActorState::Starting], ActorState::Started)
    }

    /// `STARTING | STARTED → STOPPING`, then fires the cancellation token.
    ///
    /// A no-op from `STOPPED` or `STOPPING`.
    pub fn request_stop(&self) -> bool {
        let token = self.token.lock().unwrap_or_else(|e| e.into_inner());
        if !self.transition(
            &[ActorState::Starting, ActorState::Started],
            ActorState::Stopping,
        ) {
            return false;
        }
        token.cancel();
        true
    }

    /// Terminal transition once the loop has unwound, from whatever state it was in.
    pub fn mark_stopped(&self) {
        let previous = self.state.send_replace(ActorState::Stopped);
        if previous != ActorState::Stopped {
            debug!(actor = %self.name, state = %ActorState::Stopped, "State changed");
        }
    }

    /// Replaces a fired cancellation token with a fresh one.
    ///
    /// A live token is left alone: it may still belong to a running loop, and
    /// swapping it would make that loop unstoppable.
    pub fn rearm(&self) {
        let mut token = self.token.lock().unwrap_or_else(|e| e.into_inner());
        if token.is_cancelled() {
            *token = CancellationToken::new();
        }
    }

    /// A clone of the current token.
    pub fn token(&self) -> CancellationToken {
        self.token
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn time_multiplier(&self) -> f64 {
        f64::from_bits(self.time_multiplier.load(Ordering::Relaxed))
    }

    /// Sets the simulated-to-real time ratio. Non-positive or non-finite values are ignored.
    pub fn set_time_multiplier(&self, multiplier: f64) -> bool {
        if !(multiplier.is_finite() && multiplier > 0.0) {
            warn!(actor = %self.name, multiplier, "Ignoring invalid time multiplier");
            return false;
        }
        self.time_multiplier
            .store(multiplier.to_bits(), Ordering::Relaxed);
        true
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("state", &self.state())
            .field("time_multiplier", &self.time_multiplier())
            .finish()
    }
}
