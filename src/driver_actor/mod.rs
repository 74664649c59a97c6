//! Simulated driver.
//!
//! After signing in and loading its vehicle and profile, a driver loops
//! forever: think for a while, resume its own active ride or claim the first
//! open one, fetch directions (retrying with backoff), report its position
//! along the densified route in scaled real time, and finally mark the ride
//! finished. A stop mid-route abandons the ride without finishing it.

pub mod driver;
pub mod error;

pub use driver::{DriveOutcome, Driver};
pub use error::*;

use crate::clients::BackendApi;
use crate::framework::SimActor;
use std::sync::Arc;

/// Creates a driver actor bound to its own backend session.
pub fn new(email: &str, password: &str, api: Arc<dyn BackendApi>) -> SimActor<Driver> {
    SimActor::new(email, Driver::new(email, password), api)
}
