//! # BackendApi Trait
//!
//! The contract every simulated actor drives. Implementations are
//! **fail-soft**: apart from [`BackendApi::sign_in`], no method returns an
//! error. Failures are logged inside the client and turned into a sentinel
//! (`None`, an empty list, `false`, or nothing at all), so actor loops only
//! ever branch on data.
//!
//! Each actor owns its own implementation instance; sessions are never
//! shared between actors.
use super::ApiError;
use crate::geo::LatLng;
use crate::model::{BackendUser, Directions, NamedPoint, PositionUpdate, RideRequest, Vehicle};
use async_trait::async_trait;

#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Authenticates and caches the session token. A no-op while a token is cached.
    async fn sign_in(&self, email: &str, password: &str) -> Result<(), ApiError>;

    /// Drops the cached session so the next [`sign_in`](Self::sign_in) re-authenticates.
    fn reset_session(&self) {}

    /// The vehicle assigned to the signed-in driver.
    async fn get_vehicle(&self) -> Option<Vehicle>;

    /// The signed-in account's backend profile.
    async fn get_my_user(&self) -> Option<BackendUser>;

    /// Ride requests the caller owns, as rider or as driver.
    async fn get_my_rides(&self) -> Vec<RideRequest>;

    /// Ride requests nobody has claimed yet.
    async fn get_available_ride_requests(&self) -> Vec<RideRequest>;

    /// Tries to claim a ride. `false` usually means another driver won the race.
    async fn claim_ride_request(&self, id: i64) -> bool;

    async fn create_ride_request(&self, from: &NamedPoint, to: &NamedPoint) -> Option<RideRequest>;

    /// Looks a ride up in the caller's own rides.
    async fn get_ride_request(&self, id: i64) -> Option<RideRequest> {
        self.get_my_rides().await.into_iter().find(|ride| ride.id == id)
    }

    async fn finish_ride_request(&self, id: i64) -> bool;

    /// Directions for a ride, optionally starting from `start` instead of the
    /// ride's origin. `None` means the backend could not produce a route right now.
    async fn get_directions(&self, ride_id: i64, start: Option<LatLng>) -> Option<Directions>;

    async fn update_position(&self, vehicle_id: i64, update: PositionUpdate);

    async fn post_log(&self, tag: &str, message: &str);
}
