//! # Observability & Tracing
//!
//! [`setup_tracing`] installs the process-wide subscriber. Everything else in
//! the crate only emits events.
//!
//! ## What Gets Traced
//!
//! - **Actor Lifecycle**: each run is wrapped in an `actor` span carrying the
//!   actor's email and tag, with `Actor starting` / `Actor started` /
//!   `Actor stopped` events and `State changed` at debug level
//! - **Actor Actions**: every significant step (`Claiming 12`, `Driving (12) ...`,
//!   `Requested ride ...`) is an `info` event, also mirrored to the backend log
//! - **Backend Calls**: client methods are `#[instrument]`ed; failures are
//!   `warn` events with the operation name and the error
//! - **Supervisor**: start/stop fan-out counts, multiplier changes, shutdown
//!
//! ## Usage Examples
//!
//! ```bash
//! # Actor actions and lifecycle (default)
//! RUST_LOG=info ride-sim
//!
//! # Add state transitions, cache hits and refreshed ride states
//! RUST_LOG=debug ride-sim
//!
//! # Only one module
//! RUST_LOG=ride_sim::driver_actor=debug ride-sim
//! ```
//!
//! With `RUST_LOG=info` a driver's first ride looks like:
//!
//! ```text
//! INFO actor: Actor starting name=driver1@example.com tag="D"
//! INFO actor: Actor started name=driver1@example.com tag="D"
//! INFO actor: Claiming 12 actor=driver1@example.com tag="D"
//! INFO actor: Driving (12) [52.52, 13.405] -> Alexanderplatz 1, 10178 Berlin -> ... actor=driver1@example.com tag="D"
//! INFO actor: Finished ride 12, waiting 15s actor=driver1@example.com tag="D"
//! ```

/// Installs a compact fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; only the first call installs anything.
pub fn setup_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
