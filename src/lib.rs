#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Ride Simulator
//!
//! > **A fleet of simulated drivers and riders for a ride-hailing backend.**
//!
//! Every configured account becomes an independent actor running its own
//! long-lived Tokio task. Riders pick random journeys across a city and request
//! rides; drivers claim those rides, fetch directions and report their
//! position along the route in compressed real time. A supervisor starts,
//! stops and restarts the whole fleet on command.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### One state machine, many behaviors
//! Drivers and riders do very different things but stop and start the same
//! way. The lifecycle (`STOPPED → STARTING → STARTED → STOPPING → STOPPED`)
//! lives in one controller, [`Lifecycle`](framework::Lifecycle), and each
//! behavior is plugged into the generic [`SimActor<B>`](framework::SimActor)
//! runner through the [`ActorBehavior`](framework::ActorBehavior) trait.
//!
//! ### Cooperative cancellation
//! A stop must interrupt an actor halfway through a 90 second backoff or a
//! long route. Every blocking point goes through the
//! [`ActorContext`](framework::ActorContext), which races it against the run's
//! `CancellationToken`. Fired tokens are replaced on re-arm, so a stopped
//! fleet can start again.
//!
//! ### Fail-soft backend
//! Apart from sign-in, no [`BackendApi`](clients::BackendApi) call returns an
//! error. Failures are logged by the client and turned into `None`, `false` or
//! an empty list, so actor loops only ever branch on data.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! - **Role**: Lifecycle state machine, cancellable waits, the generic runner.
//! - **Key items**: [`SimActor`](framework::SimActor), [`ActorContext`](framework::ActorContext).
//!
//! ### 2. The Orchestrator ([`lifecycle`])
//! - **Role**: Configuration, the supervisor that owns every actor, tracing setup.
//! - **Key items**: [`SimManager`](lifecycle::SimManager), [`SimConfig`](lifecycle::SimConfig).
//!
//! ### 3. The Interface ([`clients`])
//! - **Role**: The backend contract, its HTTP implementation, and an in-memory mock.
//! - **Key items**: [`BackendApi`](clients::BackendApi), [`HttpBackend`](clients::HttpBackend),
//!   [`MockBackend`](clients::mock::MockBackend).
//!
//! ### 4. The Implementation ([`driver_actor`], [`rider_actor`])
//! - **Role**: Concrete [`ActorBehavior`](framework::ActorBehavior)s.
//!
//! ### 5. The Support ([`geo`], [`model`])
//! - **Role**: Polyline decoding, distances, route densification, and the
//!   serde types exchanged with the backend.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! export API_BASE_URL=http://localhost:8080
//! export FIREBASE_API_KEY=...
//! export SIM_USERS='[{"email":"d1@example.com","password":"pw"},
//!                    {"email":"r1@example.com","password":"pw","isRider":true,"city":"berlin"}]'
//! RUST_LOG=info cargo run
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test
//! ```

pub mod clients;
pub mod driver_actor;
pub mod framework;
pub mod geo;
pub mod lifecycle;
pub mod model;
pub mod rider_actor;
