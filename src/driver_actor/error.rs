//! Error types for the Driver actor.

use crate::clients::ApiError;
use crate::framework::Cancelled;
use thiserror::Error;

/// Reasons a driver run ends early.
///
/// Everything here is fatal to the current run only; the supervisor can
/// start the driver again.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The backend has no vehicle assigned to this account.
    #[error("no vehicle found")]
    MissingVehicle,

    /// The backend has no user profile for this account.
    #[error("user not found")]
    MissingProfile,

    #[error("sign-in failed: {0}")]
    SignIn(#[from] ApiError),

    /// Stop requested. Not logged as a failure.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}
