//! The backend boundary: the [`BackendApi`] contract, its reqwest
//! implementation and an in-memory [`mock`] for tests.

pub mod backend;
pub mod error;
pub mod http_client;
pub mod mock;

pub use backend::*;
pub use error::*;
pub use http_client::*;
