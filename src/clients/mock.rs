//! # Mock Backend
//!
//! An in-memory [`BackendApi`] for testing actors without a network.
//!
//! [`MockBackend`] behaves like a tiny backend: claiming a ride assigns it to
//! the signed-in user, finishing it moves it to `Finished`, creating one adds
//! it to "my rides". Scripted overrides (a lost claim race, a missing
//! directions response) are queued with the `expect_*` methods and consumed in
//! order. Every call is journaled so tests can assert on exactly what an actor
//! did, and [`MockBackend::wait_for`] lets a test block until a given call
//! happens.
//!
//! ```ignore
//! let backend = MockBackend::new()
//!     .with_user(user)
//!     .with_vehicle(vehicle)
//!     .with_available(vec![ride]);
//! backend.expect_directions(Some(directions));
//!
//! // ... run a driver against `backend` ...
//!
//! backend.wait_for(|c| matches!(c, ApiCall::FinishRideRequest(_))).await;
//! assert_eq!(backend.count(|c| matches!(c, ApiCall::ClaimRideRequest(_))), 1);
//! ```
use super::{ApiError, BackendApi};
use crate::geo::LatLng;
use crate::model::{
    BackendUser, Directions, NamedPoint, PositionUpdate, RideRequest, RideRequestState, Vehicle,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    SignIn { email: String },
    GetVehicle,
    GetMyUser,
    GetMyRides,
    GetAvailableRideRequests,
    ClaimRideRequest(i64),
    CreateRideRequest { from: NamedPoint, to: NamedPoint },
    FinishRideRequest(i64),
    GetDirections { ride_id: i64, start: Option<LatLng> },
    UpdatePosition { vehicle_id: i64, update: PositionUpdate },
    PostLog { tag: String, message: String },
}

#[derive(Debug, Default)]
struct MockState {
    signed_in: bool,
    reject_sign_in: bool,
    vehicle: Option<Vehicle>,
    user: Option<BackendUser>,
    rides: Vec<RideRequest>,
    available: Vec<RideRequest>,
    claim_results: VecDeque<bool>,
    directions: VecDeque<Option<Directions>>,
    default_directions: Option<Directions>,
    reject_create: bool,
    next_ride_id: i64,
    calls: Vec<ApiCall>,
}

/// Scriptable in-memory backend with a call journal.
#[derive(Debug, Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
    notify: Notify,
}

impl MockBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        backend.lock().next_ride_id = 1000;
        backend
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: ApiCall) {
        self.lock().calls.push(call);
        self.notify.notify_waiters();
    }

    // --- Fixture builders ---

    pub fn with_vehicle(self, vehicle: Vehicle) -> Self {
        self.lock().vehicle = Some(vehicle);
        self
    }

    pub fn with_user(self, user: BackendUser) -> Self {
        self.lock().user = Some(user);
        self
    }

    /// Rides the signed-in user already owns.
    pub fn with_my_rides(self, rides: Vec<RideRequest>) -> Self {
        self.lock().rides = rides;
        self
    }

    /// Unclaimed rides.
    pub fn with_available(self, rides: Vec<RideRequest>) -> Self {
        self.lock().available = rides;
        self
    }

    /// Directions returned whenever no scripted response is queued.
    pub fn with_default_directions(self, directions: Directions) -> Self {
        self.lock().default_directions = Some(directions);
        self
    }

    pub fn rejecting_sign_in(self) -> Self {
        self.lock().reject_sign_in = true;
        self
    }

    pub fn rejecting_create(self) -> Self {
        self.lock().reject_create = true;
        self
    }

    // --- Scripted responses ---

    /// Queues the outcome of the next claim; unqueued claims succeed.
    pub fn expect_claim(&self, success: bool) {
        self.lock().claim_results.push_back(success);
    }

    /// Queues the next directions response; `None` simulates a routing failure.
    pub fn expect_directions(&self, directions: Option<Directions>) {
        self.lock().directions.push_back(directions);
    }

    /// Moves an owned ride to `state`, as the backend would on its own.
    pub fn set_ride_state(&self, id: i64, state: RideRequestState) {
        if let Some(ride) = self.lock().rides.iter_mut().find(|r| r.id == id) {
            ride.state = state;
        }
    }

    // --- Inspection ---

    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&ApiCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }

    /// Every position reported so far, in order.
    pub fn positions(&self) -> Vec<PositionUpdate> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                ApiCall::UpdatePosition { update, .. } => Some(*update),
                _ => None,
            })
            .collect()
    }

    pub fn ride(&self, id: i64) -> Option<RideRequest> {
        self.lock().rides.iter().find(|r| r.id == id).cloned()
    }

    /// Resolves once a recorded call matches `pred`.
    pub async fn wait_for(&self, pred: impl Fn(&ApiCall) -> bool) {
        self.wait_for_count(1, pred).await
    }

    /// Resolves once at least `n` recorded calls match `pred`.
    pub async fn wait_for_count(&self, n: usize, pred: impl Fn(&ApiCall) -> bool) {
        loop {
            let notified = self.notify.notified();
            if self.count(&pred) >= n {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl BackendApi for MockBackend {
    async fn sign_in(&self, email: &str, _password: &str) -> Result<(), ApiError> {
        self.record(ApiCall::SignIn {
            email: email.to_string(),
        });
        let mut state = self.lock();
        if state.reject_sign_in {
            return Err(ApiError::SignInRejected {
                status: 400,
                body: "INVALID_PASSWORD".to_string(),
            });
        }
        state.signed_in = true;
        Ok(())
    }

    fn reset_session(&self) {
        self.lock().signed_in = false;
    }

    async fn get_vehicle(&self) -> Option<Vehicle> {
        self.record(ApiCall::GetVehicle);
        self.lock().vehicle.clone()
    }

    async fn get_my_user(&self) -> Option<BackendUser> {
        self.record(ApiCall::GetMyUser);
        self.lock().user.clone()
    }

    async fn get_my_rides(&self) -> Vec<RideRequest> {
        self.record(ApiCall::GetMyRides);
        self.lock().rides.clone()
    }

    async fn get_available_ride_requests(&self) -> Vec<RideRequest> {
        self.record(ApiCall::GetAvailableRideRequests);
        self.lock().available.clone()
    }

    async fn claim_ride_request(&self, id: i64) -> bool {
        self.record(ApiCall::ClaimRideRequest(id));
        let mut state = self.lock();
        let success = state.claim_results.pop_front().unwrap_or(true);
        let Some(index) = state.available.iter().position(|r| r.id == id) else {
            return false;
        };
        if !success {
            return false;
        }
        let mut ride = state.available.remove(index);
        ride.driver_id = state.user.as_ref().map(|u| u.id);
        ride.state = RideRequestState::Accepted;
        state.rides.push(ride);
        true
    }

    async fn create_ride_request(&self, from: &NamedPoint, to: &NamedPoint) -> Option<RideRequest> {
        self.record(ApiCall::CreateRideRequest {
            from: from.clone(),
            to: to.clone(),
        });
        let mut state = self.lock();
        if state.reject_create {
            return None;
        }
        state.next_ride_id += 1;
        let ride = RideRequest {
            id: state.next_ride_id,
            rider_id: state.user.as_ref().map(|u| u.id).unwrap_or_default(),
            driver_id: None,
            from_lat: from.location.lat,
            from_lng: from.location.lng,
            from_name: from.name.clone(),
            to_lat: to.location.lat,
            to_lng: to.location.lng,
            to_name: to.name.clone(),
            state: RideRequestState::Available,
            price: 0.0,
            currency: String::new(),
            created_at: None,
            updated_at: None,
        };
        state.rides.push(ride.clone());
        Some(ride)
    }

    async fn finish_ride_request(&self, id: i64) -> bool {
        self.record(ApiCall::FinishRideRequest(id));
        match self.lock().rides.iter_mut().find(|r| r.id == id) {
            Some(ride) => {
                ride.state = RideRequestState::Finished;
                true
            }
            None => false,
        }
    }

    async fn get_directions(&self, ride_id: i64, start: Option<LatLng>) -> Option<Directions> {
        self.record(ApiCall::GetDirections { ride_id, start });
        let mut state = self.lock();
        match state.directions.pop_front() {
            Some(scripted) => scripted,
            None => state.default_directions.clone(),
        }
    }

    async fn update_position(&self, vehicle_id: i64, update: PositionUpdate) {
        self.record(ApiCall::UpdatePosition { vehicle_id, update });
    }

    async fn post_log(&self, tag: &str, message: &str) {
        self.record(ApiCall::PostLog {
            tag: tag.to_string(),
            message: message.to_string(),
        });
    }
}
