//! Error and audit types shared by the verification layers.

pub mod audit;
pub mod error;

pub use audit::*;
pub use error::*;
