//! Configuration structures and loading utilities.
//!
//! This module contains the signing configuration used by the verification
//! gate and the logging setup, including environment variable loading and
//! default values.

pub mod signing;
pub mod telemetry;

pub use signing::*;
pub use telemetry::*;
