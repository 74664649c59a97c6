//! Process-level orchestration: configuration, the supervisor, and tracing.
//!
//! # Main Components
//!
//! - [`SimConfig`] - Configuration value built once from the environment
//! - [`SimManager`] - The supervisor that owns every simulated actor
//! - [`SimManagerClient`] - Cloneable command handle (start all, stop all, status, time multiplier)
//! - [`setup_tracing`] - Initializes the tracing/logging infrastructure

pub mod config;
pub mod sim_manager;
pub mod tracing;

pub use config::*;
pub use sim_manager::*;
pub use self::tracing::*;
