//! Driver behavior: think, acquire a ride, route it, drive it, finish it.

use super::DriverError;
use crate::framework::{ActorBehavior, ActorContext, Cancelled};
use crate::geo::{interpolate_route, LatLng, RouteStep};
use crate::model::{BackendUser, PositionUpdate, RideRequest, Vehicle};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::{debug, instrument};

/// Seconds of idle "think" time between rides.
const THINK_SECS: (u64, u64) = (5, 15);
/// Seconds to wait before polling the open ride requests.
const POLL_DELAY_SECS: (u64, u64) = (1, 5);
/// Seconds to back off when the backend cannot route a ride.
const DIRECTIONS_BACKOFF_SECS: (u64, u64) = (30, 90);
const NO_RIDE_WAIT: Duration = Duration::from_secs(10);
const AFTER_RIDE_WAIT: Duration = Duration::from_secs(15);

/// Result of one [`Driver::drive_once`] cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// A ride was driven to its destination and reported finished.
    Finished { ride_id: i64 },
    /// Nothing to drive (no open rides, or the claim was lost).
    Idle,
}

/// A ride the driver is about to drive.
#[derive(Debug)]
struct Assignment {
    ride: RideRequest,
    /// Freshly claimed, as opposed to resumed from an earlier run.
    claimed: bool,
}

pub struct Driver {
    email: String,
    password: String,
    vehicle: Option<Vehicle>,
    user: Option<BackendUser>,
    current_location: Option<LatLng>,
    rng: StdRng,
}

impl Driver {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            vehicle: None,
            user: None,
            current_location: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Replaces the random source, for reproducible runs.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Last position the driver reported, or the vehicle's last recorded one.
    pub fn current_location(&self) -> Option<LatLng> {
        self.current_location
    }

    pub fn vehicle(&self) -> Option<&Vehicle> {
        self.vehicle.as_ref()
    }

    /// One acquisition cycle without the preceding think time: find or claim a
    /// ride, fetch its route, play it back and mark it finished.
    #[instrument(skip_all, fields(driver = %self.email))]
    pub async fn drive_once(&mut self, ctx: &ActorContext) -> Result<DriveOutcome, DriverError> {
        let vehicle_id = self
            .vehicle
            .as_ref()
            .map(|v| v.id)
            .ok_or(DriverError::MissingVehicle)?;

        let Some(Assignment { ride, claimed }) = self.acquire_ride(ctx).await? else {
            ctx.log("No ride requests found, waiting 10s").await;
            ctx.sleep(NO_RIDE_WAIT).await?;
            return Ok(DriveOutcome::Idle);
        };

        // A resumed ride is re-routed from its own origin.
        let start = if claimed { self.current_location } else { None };
        let steps = self.fetch_route(ctx, ride.id, start).await?;

        let origin = start.map(|p| format!("{p} -> ")).unwrap_or_default();
        ctx.log(format!(
            "Driving ({}) {origin}{} -> {}",
            ride.id, ride.from_name, ride.to_name
        ))
        .await;

        self.play_back(ctx, vehicle_id, &steps).await?;

        if !ctx.guard(ctx.api().finish_ride_request(ride.id)).await? {
            debug!(ride_id = ride.id, "Finish not acknowledged");
        }
        ctx.log(format!("Finished ride {}, waiting 15s", ride.id)).await;
        ctx.sleep(AFTER_RIDE_WAIT).await?;

        Ok(DriveOutcome::Finished { ride_id: ride.id })
    }

    /// Prefers a ride this driver already owns; otherwise claims the first open one.
    async fn acquire_ride(&mut self, ctx: &ActorContext) -> Result<Option<Assignment>, Cancelled> {
        let my_id = self.user.as_ref().map(|u| u.id);
        let mine = ctx.guard(ctx.api().get_my_rides()).await?;
        let resumable = mine
            .into_iter()
            .find(|r| r.driver_id.is_some() && r.driver_id == my_id && r.state.is_active());

        if let Some(ride) = resumable {
            ctx.log(format!("Found in-progress driver ride request {}", ride.id))
                .await;
            return Ok(Some(Assignment {
                ride,
                claimed: false,
            }));
        }

        let (min, max) = POLL_DELAY_SECS;
        ctx.sleep_between(&mut self.rng, min, max).await?;

        let available = ctx.guard(ctx.api().get_available_ride_requests()).await?;
        let Some(candidate) = available.into_iter().next() else {
            return Ok(None);
        };

        ctx.log(format!("Claiming {}", candidate.id)).await;
        if ctx.guard(ctx.api().claim_ride_request(candidate.id)).await? {
            Ok(Some(Assignment {
                ride: candidate,
                claimed: true,
            }))
        } else {
            ctx.log(format!("Failed to claim ride request {}", candidate.id))
                .await;
            Ok(None)
        }
    }

    /// Asks for directions until the backend produces some.
    async fn fetch_route(
        &mut self,
        ctx: &ActorContext,
        ride_id: i64,
        start: Option<LatLng>,
    ) -> Result<Vec<RouteStep>, Cancelled> {
        loop {
            if let Some(directions) = ctx.guard(ctx.api().get_directions(ride_id, start)).await? {
                return Ok(interpolate_route(&directions));
            }
            let (min, max) = DIRECTIONS_BACKOFF_SECS;
            let secs = self.rng.gen_range(min..=max);
            ctx.log(format!("Failed to get directions, sleeping {secs}s"))
                .await;
            ctx.sleep(Duration::from_secs(secs)).await?;
        }
    }

    /// Reports every coordinate of `steps` in order, pacing the reports by
    /// the steps' nominal speed compressed by the time multiplier.
    async fn play_back(
        &mut self,
        ctx: &ActorContext,
        vehicle_id: i64,
        steps: &[RouteStep],
    ) -> Result<(), Cancelled> {
        let mut previous: Option<LatLng> = None;

        for step in steps {
            let mut bearing = step.bearing;

            for (i, &location) in step.locations.iter().enumerate() {
                match previous {
                    None => {
                        let update = PositionUpdate::at(location, bearing, 0.0);
                        ctx.guard(ctx.api().update_position(vehicle_id, update))
                            .await?;
                    }
                    Some(prev) => {
                        let meters = prev.distance_to(location);
                        let seconds = step.travel_seconds(meters);
                        if let Some(next) = step.locations.get(i + 1) {
                            bearing = location.bearing_to(next);
                        }
                        let update =
                            PositionUpdate::at(location, bearing, speed_kmh(meters, seconds));
                        ctx.guard(ctx.api().update_position(vehicle_id, update))
                            .await?;
                        ctx.sleep(scaled(seconds, ctx.time_multiplier())).await?;
                    }
                }
                self.current_location = Some(location);
                previous = Some(location);
            }
        }

        Ok(())
    }
}

fn speed_kmh(meters: f64, seconds: f64) -> f64 {
    if seconds > 0.0 && seconds.is_finite() {
        meters / seconds * 3.6
    } else {
        0.0
    }
}

/// Real time to sleep for `seconds` of simulated travel.
fn scaled(seconds: f64, multiplier: f64) -> Duration {
    let real = seconds / multiplier;
    if real.is_finite() && real > 0.0 {
        Duration::from_secs_f64(real)
    } else {
        Duration::ZERO
    }
}

#[async_trait]
impl ActorBehavior for Driver {
    type Error = DriverError;
    const TAG: &'static str = "D";

    async fn on_start(&mut self, ctx: &ActorContext) -> Result<(), DriverError> {
        ctx.guard(ctx.api().sign_in(&self.email, &self.password))
            .await??;
        let vehicle = ctx.guard(ctx.api().get_vehicle()).await?;
        let user = ctx.guard(ctx.api().get_my_user()).await?;

        let Some(user) = user else {
            ctx.log("User not found").await;
            return Err(DriverError::MissingProfile);
        };
        let Some(vehicle) = vehicle else {
            ctx.log("No vehicle found").await;
            return Err(DriverError::MissingVehicle);
        };

        if let Some(position) = &vehicle.last_recorded_position {
            self.current_location = Some(LatLng::new(position.lat, position.lng));
        }
        debug!(vehicle_id = vehicle.id, user_id = user.id, "Driver ready");
        self.vehicle = Some(vehicle);
        self.user = Some(user);
        Ok(())
    }

    async fn run(&mut self, ctx: &ActorContext) -> Result<(), DriverError> {
        let (min, max) = THINK_SECS;
        loop {
            ctx.sleep_between(&mut self.rng, min, max).await?;
            self.drive_once(ctx).await?;
        }
    }
}
