//! Request-interception middleware.

pub mod verify_slack;

pub use verify_slack::*;
