//! Verification logic and its collaborators.
//!
//! This module contains the ordered verification checks, the clock
//! abstraction they depend on, and metrics collection.

pub mod clock;
pub mod metrics;
pub mod verification;

pub use clock::*;
pub use metrics::*;
pub use verification::*;
