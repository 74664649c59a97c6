//! # Simulation Supervisor
//!
//! [`SimManager`] owns the registry of simulated actors. Like every other
//! stateful component here it is an actor itself: a single task holds the
//! registry and processes [`SupervisorRequest`]s one at a time, and the rest
//! of the process talks to it through cheap, cloneable [`SimManagerClient`]s.
//! Nobody else ever touches the registry, so it needs no lock.
//!
//! ```ignore
//! let manager = SimManager::new(&config)?;
//! let client = manager.client();
//!
//! client.start_all().await?;
//! client.set_time_multiplier(60.0).await?;
//! for status in client.status().await? {
//!     println!("{} {} {}", status.role, status.email, status.state);
//! }
//! client.stop_all().await?;
//!
//! manager.shutdown().await?;
//! ```

use super::{SimConfig, UserConfig};
use crate::clients::{ApiError, BackendApi, HttpBackend};
use crate::framework::{ActorState, ManagedActor};
use crate::model::CityCatalog;
use crate::{driver_actor, rider_actor};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const COMMAND_BUFFER: usize = 32;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("supervisor closed")]
    Closed,
    #[error("supervisor dropped response channel")]
    Dropped,
    #[error("invalid time multiplier {0}")]
    InvalidMultiplier(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActorRole {
    Driver,
    Rider,
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorRole::Driver => f.write_str("driver"),
            ActorRole::Rider => f.write_str("rider"),
        }
    }
}

/// One row of the fleet status report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActorStatus {
    pub email: String,
    pub role: ActorRole,
    pub state: ActorState,
}

pub type Response<T> = oneshot::Sender<Result<T, SupervisorError>>;

#[derive(Debug)]
pub enum SupervisorRequest {
    StartAll {
        respond_to: Response<Vec<ActorStatus>>,
    },
    StopAll {
        respond_to: Response<Vec<ActorStatus>>,
    },
    SetTimeMultiplier {
        multiplier: f64,
        respond_to: Response<()>,
    },
    Status {
        respond_to: Response<Vec<ActorStatus>>,
    },
    /// Stop every actor, wait for all loops to unwind, then exit.
    Shutdown { respond_to: Response<()> },
}

/// Cloneable handle for commanding the supervisor.
#[derive(Debug, Clone)]
pub struct SimManagerClient {
    sender: mpsc::Sender<SupervisorRequest>,
}

impl SimManagerClient {
    async fn request<T>(
        &self,
        make: impl FnOnce(Response<T>) -> SupervisorRequest,
    ) -> Result<T, SupervisorError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(make(respond_to))
            .await
            .map_err(|_| SupervisorError::Closed)?;
        response.await.map_err(|_| SupervisorError::Dropped)?
    }

    /// Starts every stopped actor; returns the resulting status snapshot.
    pub async fn start_all(&self) -> Result<Vec<ActorStatus>, SupervisorError> {
        self.request(|respond_to| SupervisorRequest::StartAll { respond_to })
            .await
    }

    /// Stops every actor and re-arms its cancellation so the fleet can be started again.
    pub async fn stop_all(&self) -> Result<Vec<ActorStatus>, SupervisorError> {
        self.request(|respond_to| SupervisorRequest::StopAll { respond_to })
            .await
    }

    pub async fn set_time_multiplier(&self, multiplier: f64) -> Result<(), SupervisorError> {
        self.request(|respond_to| SupervisorRequest::SetTimeMultiplier {
            multiplier,
            respond_to,
        })
        .await
    }

    pub async fn status(&self) -> Result<Vec<ActorStatus>, SupervisorError> {
        self.request(|respond_to| SupervisorRequest::Status { respond_to })
            .await
    }
}

struct Entry {
    role: ActorRole,
    actor: Box<dyn ManagedActor>,
}

/// The supervisor: its task handle plus a client for talking to it.
pub struct SimManager {
    client: SimManagerClient,
    handle: JoinHandle<()>,
}

impl SimManager {
    /// Builds one actor per configured user, each with its own HTTP session.
    pub fn new(config: &SimConfig) -> Result<Self, ApiError> {
        let base_url = config.api_base_url.clone();
        let auth = config.auth_settings();
        Self::with_backends(config, |_| {
            let backend = HttpBackend::new(base_url.clone(), auth.clone())?;
            Ok(Arc::new(backend) as Arc<dyn BackendApi>)
        })
    }

    /// Like [`new`](Self::new), with each actor's backend produced by `make_backend`.
    pub fn with_backends<F>(config: &SimConfig, make_backend: F) -> Result<Self, ApiError>
    where
        F: Fn(&UserConfig) -> Result<Arc<dyn BackendApi>, ApiError>,
    {
        let catalog = Arc::new(CityCatalog::new(config.city_data_dir.clone()));
        let mut entries = Vec::with_capacity(config.users.len());

        for user in &config.users {
            let api = make_backend(user)?;
            let actor: Box<dyn ManagedActor> = match user.role() {
                ActorRole::Driver => Box::new(driver_actor::new(&user.email, &user.password, api)),
                ActorRole::Rider => Box::new(rider_actor::new(
                    &user.email,
                    &user.password,
                    &user.city,
                    catalog.clone(),
                    api,
                )),
            };
            actor.set_time_multiplier(config.time_multiplier);
            debug!(email = %user.email, role = %user.role(), "Registered actor");
            entries.push(Entry {
                role: user.role(),
                actor,
            });
        }

        let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
        let handle = tokio::spawn(supervise(receiver, entries));

        Ok(Self {
            client: SimManagerClient { sender },
            handle,
        })
    }

    pub fn client(&self) -> SimManagerClient {
        self.client.clone()
    }

    /// Stops every actor, waits for their loops to finish and ends the supervisor task.
    pub async fn shutdown(self) -> Result<(), SupervisorError> {
        info!("Shutting down simulation...");
        let result = self
            .client
            .request(|respond_to| SupervisorRequest::Shutdown { respond_to })
            .await;
        drop(self.client);

        if let Err(e) = self.handle.await {
            error!("Supervisor task failed: {:?}", e);
            return Err(SupervisorError::Dropped);
        }
        info!("Simulation shutdown complete.");
        result
    }
}

fn snapshot(entries: &[Entry]) -> Vec<ActorStatus> {
    entries
        .iter()
        .map(|e| ActorStatus {
            email: e.actor.name().to_string(),
            role: e.role,
            state: e.actor.state(),
        })
        .collect()
}

/// Starts every actor that can start. Returns the ones that did not.
///
/// An actor still unwinding from a stop is skipped; it needs another start
/// once it reports `STOPPED`.
fn start_entries(entries: &[Entry]) -> Vec<&str> {
    let mut skipped = Vec::new();
    for entry in entries {
        if entry.actor.start() {
            continue;
        }
        let state = entry.actor.state();
        if state == ActorState::Stopping {
            info!(actor = %entry.actor.name(), %state, "Start skipped while still stopping; retry once STOPPED");
        } else {
            debug!(actor = %entry.actor.name(), %state, "Start skipped, already running");
        }
        skipped.push(entry.actor.name());
    }
    skipped
}

async fn stop_and_join(entries: &[Entry]) {
    for entry in entries {
        entry.actor.stop();
    }
    for entry in entries {
        entry.actor.join().await;
    }
}

async fn supervise(mut receiver: mpsc::Receiver<SupervisorRequest>, entries: Vec<Entry>) {
    info!(actors = entries.len(), "Supervisor started");

    while let Some(request) = receiver.recv().await {
        match request {
            SupervisorRequest::StartAll { respond_to } => {
                let skipped = start_entries(&entries);
                info!(
                    started = entries.len() - skipped.len(),
                    total = entries.len(),
                    "Start all"
                );
                let _ = respond_to.send(Ok(snapshot(&entries)));
            }
            SupervisorRequest::StopAll { respond_to } => {
                let mut stopped = 0;
                for entry in &entries {
                    if entry.actor.stop() {
                        stopped += 1;
                    }
                    entry.actor.rearm();
                }
                info!(stopped, total = entries.len(), "Stop all");
                let _ = respond_to.send(Ok(snapshot(&entries)));
            }
            SupervisorRequest::SetTimeMultiplier {
                multiplier,
                respond_to,
            } => {
                if !(multiplier.is_finite() && multiplier > 0.0) {
                    warn!(multiplier, "Rejected time multiplier");
                    let _ = respond_to.send(Err(SupervisorError::InvalidMultiplier(multiplier)));
                    continue;
                }
                for entry in &entries {
                    entry.actor.set_time_multiplier(multiplier);
                }
                info!(multiplier, "Time multiplier set");
                let _ = respond_to.send(Ok(()));
            }
            SupervisorRequest::Status { respond_to } => {
                let _ = respond_to.send(Ok(snapshot(&entries)));
            }
            SupervisorRequest::Shutdown { respond_to } => {
                stop_and_join(&entries).await;
                let _ = respond_to.send(Ok(()));
                break;
            }
        }
    }

    // Every client is gone or shutdown was requested; leave nothing running.
    stop_and_join(&entries).await;
    info!("Supervisor stopped");
}
