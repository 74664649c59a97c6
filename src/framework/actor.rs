//! # Simulated Actor Runner
//!
//! [`SimActor<B>`] is the handle side of a simulated participant. It owns the
//! [`Lifecycle`] and knows how to run any [`ActorBehavior`] once: sign-in and
//! setup in [`on_start`](ActorBehavior::on_start), then the behavioral loop in
//! [`run`](ActorBehavior::run), then the guaranteed return to `STOPPED`.
//!
//! # Architecture Note
//! Driver and rider share no code with each other. What they share is the
//! *controller*: both behaviors receive an [`ActorContext`] and call into it
//! for sleeps, cancellation checks and logging. The runner is generic over the
//! behavior, so the state machine is implemented exactly once.
//!
//! Each run spawns two tasks: an outer one that always finalizes the
//! lifecycle, and an inner one that executes the behavior. A panic in the
//! inner task surfaces as a `JoinError` in the outer one instead of leaving
//! the actor stuck in `STARTED`.

use super::{ActorContext, ActorState, Cancelled, Lifecycle};
use crate::clients::BackendApi;
use async_trait::async_trait;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, Instrument};

/// The actor-specific part of a simulated participant.
///
/// The behavior value persists across runs, so whatever it remembers (current
/// location, tracked ride) survives a stop/start cycle.
#[async_trait]
pub trait ActorBehavior: Send + 'static {
    /// Error type of one run. Must absorb [`Cancelled`] so `?` can unwind a stop.
    type Error: std::error::Error + From<Cancelled> + Send + Sync + 'static;

    /// Prefix for backend log entries.
    const TAG: &'static str;

    /// Setup performed in `STARTING`. An error ends the run without entering `STARTED`.
    async fn on_start(&mut self, ctx: &ActorContext) -> Result<(), Self::Error>;

    /// The behavioral loop. Normally only returns on error or cancellation.
    async fn run(&mut self, ctx: &ActorContext) -> Result<(), Self::Error>;
}

/// Object-safe view of an actor, used by the supervisor to hold drivers and
/// riders in one registry.
#[async_trait]
pub trait ManagedActor: Send + Sync {
    fn name(&self) -> &str;
    fn state(&self) -> ActorState;
    /// Returns whether a new run was launched.
    fn start(&self) -> bool;
    /// Returns whether a stop was actually requested.
    fn stop(&self) -> bool;
    fn rearm(&self);
    fn set_time_multiplier(&self, multiplier: f64) -> bool;
    /// Waits for the current run, if any, to finish.
    async fn join(&self);
}

pub struct SimActor<B: ActorBehavior> {
    lifecycle: Arc<Lifecycle>,
    behavior: Arc<tokio::sync::Mutex<B>>,
    api: Arc<dyn BackendApi>,
    handle: StdMutex<Option<JoinHandle<()>>>,
}

impl<B: ActorBehavior> SimActor<B> {
    pub fn new(name: impl Into<String>, behavior: B, api: Arc<dyn BackendApi>) -> Self {
        Self {
            lifecycle: Arc::new(Lifecycle::new(name, B::TAG)),
            behavior: Arc::new(tokio::sync::Mutex::new(behavior)),
            api,
            handle: StdMutex::new(None),
        }
    }

    pub fn lifecycle(&self) -> &Arc<Lifecycle> {
        &self.lifecycle
    }

    /// Shared access to the behavior. Locking it waits for any current run to end.
    pub fn behavior(&self) -> &Arc<tokio::sync::Mutex<B>> {
        &self.behavior
    }

    /// Launches one run unless the actor is already running.
    pub fn start(&self) -> bool {
        let Some(token) = self.lifecycle.try_begin_start() else {
            debug!(actor = %self.lifecycle.name(), state = %self.lifecycle.state(), "Start ignored");
            return false;
        };

        let span = tracing::info_span!("actor", name = %self.lifecycle.name(), tag = B::TAG);
        let run = run_once(
            self.lifecycle.clone(),
            self.behavior.clone(),
            self.api.clone(),
            token,
        );
        let handle = tokio::spawn(run.instrument(span));
        *self.handle.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        true
    }

    /// Requests a stop. The loop unwinds asynchronously.
    pub fn stop(&self) -> bool {
        self.lifecycle.request_stop()
    }

    pub fn rearm(&self) {
        self.lifecycle.rearm();
    }

    pub async fn join(&self) {
        let handle = self.handle.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

async fn run_once<B: ActorBehavior>(
    lifecycle: Arc<Lifecycle>,
    behavior: Arc<tokio::sync::Mutex<B>>,
    api: Arc<dyn BackendApi>,
    token: CancellationToken,
) {
    let ctx = ActorContext::new(lifecycle.clone(), token.clone(), api.clone());
    info!("Actor starting");

    let task = tokio::spawn(
        async move {
            let mut behavior = behavior.lock_owned().await;
            if let Err(e) = behavior.on_start(&ctx).await {
                return Err(e);
            }
            if ctx.lifecycle().mark_started() {
                info!("Actor started");
            }
            behavior.run(&ctx).await
        }
        .in_current_span(),
    );

    match task.await {
        Ok(Ok(())) => info!("Loop finished"),
        Ok(Err(e)) if token.is_cancelled() => debug!(reason = %e, "Loop cancelled"),
        Ok(Err(e)) => error!(error = %e, "Actor run failed"),
        Err(e) if e.is_panic() => error!("Actor run panicked"),
        Err(e) => error!(error = %e, "Actor task aborted"),
    }

    lifecycle.mark_stopped();
    api.reset_session();
    info!("Actor stopped");
}

#[async_trait]
impl<B: ActorBehavior> ManagedActor for SimActor<B> {
    fn name(&self) -> &str {
        self.lifecycle.name()
    }

    fn state(&self) -> ActorState {
        self.lifecycle.state()
    }

    fn start(&self) -> bool {
        SimActor::start(self)
    }

    fn stop(&self) -> bool {
        SimActor::stop(self)
    }

    fn rearm(&self) {
        SimActor::rearm(self)
    }

    fn set_time_multiplier(&self, multiplier: f64) -> bool {
        self.lifecycle.set_time_multiplier(multiplier)
    }

    async fn join(&self) {
        SimActor::join(self).await
    }
}
