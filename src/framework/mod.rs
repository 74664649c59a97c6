//! Lifecycle framework shared by every simulated actor.
//!
//! # Main Components
//!
//! - [`Lifecycle`] - The `STOPPED → STARTING → STARTED → STOPPING → STOPPED`
//!   state machine, plus the re-armable cancellation token and time multiplier
//! - [`ActorContext`] - Cancellable sleeps, guarded network calls and dual logging
//! - [`ActorBehavior`] - Trait that driver and rider loops implement
//! - [`SimActor`] - Generic runner that executes a behavior under the state machine
//! - [`ManagedActor`] - Object-safe handle the supervisor keeps in its registry
//! - [`Cancelled`] - Marker error for a stop observed mid-operation

pub mod actor;
pub mod context;
pub mod error;
pub mod state;

pub use actor::{ActorBehavior, ManagedActor, SimActor};
pub use context::{ActorContext, WaitOutcome};
pub use error::Cancelled;
pub use state::{ActorState, Lifecycle, DEFAULT_TIME_MULTIPLIER};
