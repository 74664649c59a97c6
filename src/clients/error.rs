//! Error types for the backend client.

use thiserror::Error;

/// Errors that can occur while talking to the ride-hailing backend.
///
/// Only [`BackendApi::sign_in`](super::BackendApi::sign_in) surfaces these to
/// callers; every other operation logs them and returns a sentinel.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No session token is cached; sign in first.
    #[error("not signed in")]
    NotSignedIn,

    /// The identity provider refused the credentials.
    #[error("sign-in rejected with status {status}: {body}")]
    SignInRejected { status: u16, body: String },

    /// The backend answered with an unexpected status code.
    #[error("{operation} returned status {status}")]
    Status { operation: &'static str, status: u16 },

    /// Connection, timeout or body decoding failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A configured URL could not be parsed.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
