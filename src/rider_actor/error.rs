//! Error types for the Rider actor.

use crate::clients::ApiError;
use crate::framework::Cancelled;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiderError {
    #[error("sign-in failed: {0}")]
    SignIn(#[from] ApiError),

    /// Stop requested. Not logged as a failure.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}
