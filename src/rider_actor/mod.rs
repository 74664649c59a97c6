//! Simulated rider.
//!
//! A rider signs in, resumes any of its rides that is not finished yet, and
//! then loops: whenever it has no live ride it picks a journey from its
//! city's named points (continuing from the last destination) and requests
//! it, then polls the backend every 5 to 30 seconds for the ride's state.

pub mod error;
pub mod points;
pub mod rider;

pub use error::*;
pub use points::*;
pub use rider::Rider;

use crate::clients::BackendApi;
use crate::framework::SimActor;
use crate::model::CityCatalog;
use std::sync::Arc;

/// Creates a rider actor bound to its own backend session.
pub fn new(
    email: &str,
    password: &str,
    city: &str,
    catalog: Arc<CityCatalog>,
    api: Arc<dyn BackendApi>,
) -> SimActor<Rider> {
    SimActor::new(email, Rider::new(email, password, city, catalog), api)
}
