//! Utility functions and helper modules.
//!
//! This module contains signature generation and request metadata helpers.

pub mod http;
pub mod signature;

pub use http::*;
pub use signature::*;
