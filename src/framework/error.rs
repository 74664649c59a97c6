//! # Framework Errors
//!
//! Cancellation is not a failure, but it still has to unwind an actor's
//! behavioral loop from arbitrarily deep inside it. [`Cancelled`] is the marker
//! every cancellable operation returns; each actor's error enum implements
//! `From<Cancelled>` so `?` carries it out to the runner.

/// The actor's cancellation token fired while an operation was pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("actor cancelled")]
pub struct Cancelled;
