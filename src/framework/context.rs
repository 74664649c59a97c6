//! # Actor Context
//!
//! What a behavioral loop gets to work with during one run: the backend
//! session, the run's cancellation token, and the shared [`Lifecycle`].
//!
//! Every blocking point in a loop goes through here. [`ActorContext::sleep`]
//! and [`ActorContext::guard`] race their work against the token, so a
//! `stop()` interrupts a 60 second think-time as promptly as it interrupts a
//! slow HTTP call.

use super::{Cancelled, Lifecycle};
use crate::clients::BackendApi;
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// How a cancellable wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The full duration passed.
    Elapsed,
    /// Cancellation fired first.
    Cancelled,
}

#[derive(Clone)]
pub struct ActorContext {
    lifecycle: Arc<Lifecycle>,
    token: CancellationToken,
    api: Arc<dyn BackendApi>,
}

impl ActorContext {
    pub fn new(lifecycle: Arc<Lifecycle>, token: CancellationToken, api: Arc<dyn BackendApi>) -> Self {
        Self {
            lifecycle,
            token,
            api,
        }
    }

    pub fn api(&self) -> &dyn BackendApi {
        self.api.as_ref()
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn name(&self) -> &str {
        self.lifecycle.name()
    }

    pub fn time_multiplier(&self) -> f64 {
        self.lifecycle.time_multiplier()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Fails with [`Cancelled`] if a stop was requested.
    ///
    /// Loops call this right before any backend-mutating action whose
    /// preceding await was not itself cancellable.
    pub fn checkpoint(&self) -> Result<(), Cancelled> {
        if self.token.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Sleeps for `duration` unless cancellation fires first.
    pub async fn wait(&self, duration: Duration) -> WaitOutcome {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => WaitOutcome::Cancelled,
            _ = tokio::time::sleep(duration) => WaitOutcome::Elapsed,
        }
    }

    /// [`wait`](Self::wait) shaped for `?`.
    pub async fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        match self.wait(duration).await {
            WaitOutcome::Elapsed => Ok(()),
            WaitOutcome::Cancelled => Err(Cancelled),
        }
    }

    /// Sleeps a whole number of seconds drawn uniformly from `min..=max`.
    pub async fn sleep_between<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        min: u64,
        max: u64,
    ) -> Result<(), Cancelled> {
        let secs = rng.gen_range(min..=max);
        self.sleep(Duration::from_secs(secs)).await
    }

    /// Runs `fut` to completion unless cancellation fires first, in which case
    /// `fut` is dropped mid-flight.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, Cancelled> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Cancelled),
            output = fut => Ok(output),
        }
    }

    /// Records a significant action locally and in the backend's log stream.
    ///
    /// Posting is best-effort; the client swallows failures and a stop
    /// abandons the post.
    pub async fn log(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        info!(actor = %self.lifecycle.name(), tag = self.lifecycle.tag(), "{message}");
        let _ = self
            .guard(self.api.post_log(self.lifecycle.tag(), message))
            .await;
    }
}

impl std::fmt::Debug for ActorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorContext")
            .field("lifecycle", &self.lifecycle)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}
