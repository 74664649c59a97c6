//! Rider behavior: pick a journey, request it, poll until it is finished.

use super::{select_random_points, RiderError};
use crate::framework::{ActorBehavior, ActorContext, Cancelled};
use crate::model::{CityCatalog, NamedPoint, RideRequest};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Seconds between ride status polls.
const POLL_SECS: (u64, u64) = (5, 30);
const SELECTION_RETRY_WAIT: Duration = Duration::from_secs(10);

pub struct Rider {
    email: String,
    password: String,
    city: String,
    catalog: Arc<CityCatalog>,
    current_ride: Option<RideRequest>,
    current_from: Option<NamedPoint>,
    current_to: Option<NamedPoint>,
    rng: StdRng,
}

impl Rider {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        city: impl Into<String>,
        catalog: Arc<CityCatalog>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            city: city.into(),
            catalog,
            current_ride: None,
            current_from: None,
            current_to: None,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    /// The last snapshot of the ride being tracked.
    pub fn current_ride(&self) -> Option<&RideRequest> {
        self.current_ride.as_ref()
    }

    /// Origin and destination of the current journey.
    pub fn journey(&self) -> (Option<&NamedPoint>, Option<&NamedPoint>) {
        (self.current_from.as_ref(), self.current_to.as_ref())
    }

    fn needs_new_ride(&self) -> bool {
        self.current_ride
            .as_ref()
            .map_or(true, |ride| ride.state.is_finished())
    }

    /// Two points for the next journey, starting from the last destination if any.
    async fn select_journey(&mut self, ctx: &ActorContext) -> Result<Option<(NamedPoint, NamedPoint)>, Cancelled> {
        let pool = match ctx.guard(self.catalog.points(&self.city)).await? {
            Ok(pool) => pool,
            Err(e) => {
                warn!(city = %self.city, error = %e, "City data unavailable");
                return Ok(None);
            }
        };

        let points = select_random_points(&pool, self.current_to.as_ref(), 2, &mut self.rng);
        match <[NamedPoint; 2]>::try_from(points) {
            Ok([from, to]) => Ok(Some((from, to))),
            Err(partial) => {
                debug!(city = %self.city, found = partial.len(), "Not enough separated points");
                Ok(None)
            }
        }
    }

    #[instrument(skip_all, fields(rider = %self.email))]
    async fn request_ride(
        &mut self,
        ctx: &ActorContext,
        from: NamedPoint,
        to: NamedPoint,
    ) -> Result<(), Cancelled> {
        ctx.log(format!("Requested ride {} -> {}", from.name, to.name))
            .await;
        self.current_ride = ctx
            .guard(ctx.api().create_ride_request(&from, &to))
            .await?;
        self.current_from = Some(from);
        self.current_to = Some(to);
        Ok(())
    }

    /// Replaces the tracked snapshot with the backend's current view.
    async fn refresh_ride(&mut self, ctx: &ActorContext) -> Result<(), Cancelled> {
        let Some(id) = self.current_ride.as_ref().map(|r| r.id) else {
            return Ok(());
        };
        if let Some(updated) = ctx.guard(ctx.api().get_ride_request(id)).await? {
            debug!(ride_id = id, state = %updated.state, "Ride refreshed");
            self.current_ride = Some(updated);
        }
        Ok(())
    }
}

#[async_trait]
impl ActorBehavior for Rider {
    type Error = RiderError;
    const TAG: &'static str = "R";

    async fn on_start(&mut self, ctx: &ActorContext) -> Result<(), RiderError> {
        ctx.guard(ctx.api().sign_in(&self.email, &self.password))
            .await??;

        let mine = ctx.guard(ctx.api().get_my_rides()).await?;
        if let Some(ride) = mine.into_iter().find(|r| !r.state.is_finished()) {
            ctx.log(format!("Found existing rider requested ride {}", ride.id))
                .await;
            self.current_from = Some(NamedPoint::new(ride.from_name.clone(), ride.from()));
            self.current_to = Some(NamedPoint::new(ride.to_name.clone(), ride.to()));
            self.current_ride = Some(ride);
        }
        Ok(())
    }

    async fn run(&mut self, ctx: &ActorContext) -> Result<(), RiderError> {
        let (min, max) = POLL_SECS;
        loop {
            if self.needs_new_ride() {
                let Some((from, to)) = self.select_journey(ctx).await? else {
                    ctx.log("Failed to get 2 random points, waiting 10s").await;
                    ctx.sleep(SELECTION_RETRY_WAIT).await?;
                    continue;
                };
                self.request_ride(ctx, from, to).await?;
            }

            ctx.sleep_between(&mut self.rng, min, max).await?;
            self.refresh_ride(ctx).await?;
        }
    }
}
