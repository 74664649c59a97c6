//! Pure data structures exchanged with the backend and read from city datasets.

pub mod city;
pub mod directions;
pub mod ride;

pub use city::*;
pub use directions::*;
pub use ride::*;
