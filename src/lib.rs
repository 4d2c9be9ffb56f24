//! Slack Verify - request signature verification for Slack webhook receivers
//!
//! This crate provides an Actix Web middleware that authenticates requests
//! sent by Slack before they reach application handlers:
//! - `v0` HMAC-SHA256 signature generation
//! - Constant-time signature comparison
//! - Replay-window (freshness) enforcement with an injectable clock
//! - Body buffering that leaves the payload readable downstream
//! - Structured audit logging and Prometheus metrics
//!
//! ## Architecture
//!
//! The codebase is organized into focused modules:
//! - `utils/` - Signature generation and request metadata helpers
//! - `services/` - Ordered verification checks, clocks and metrics
//! - `middleware/` - The `VerifySlackRequests` gate
//! - `models/` - Rejection taxonomy and audit events
//! - `config/` - Signing and logging configuration from the environment
//!
//! ## Quick Start
//!
//! ```no_run
//! use actix_web::{App, HttpResponse, HttpServer, web};
//! use slack_verify::{SlackSigningConfig, VerifySlackRequests};
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!     let config = SlackSigningConfig::from_env();
//!
//!     HttpServer::new(move || {
//!         App::new()
//!             .wrap(VerifySlackRequests::from_config(&config))
//!             .route("/slack/events", web::post().to(|| async { HttpResponse::Ok().finish() }))
//!     })
//!     .bind("127.0.0.1:8080")?
//!     .run()
//!     .await
//! }
//! ```
//!
//! Replay deduplication is out of scope: an identical signed request is
//! accepted every time it arrives inside the freshness window.

// Core modules
pub mod config;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types and functions for convenience
pub use config::{
    DEFAULT_MAX_BODY_BYTES, LogFormat, MAX_PERMITTED_REQUEST_AGE, SigningSecret,
    SlackSigningConfig, TelemetryConfig, init_tracing,
};
pub use middleware::{VerifySlackRequests, VerifySlackRequestsMiddleware};
pub use models::{VerificationAuditEvent, VerificationError, VerificationOutcome};
pub use services::{
    Clock, FixedClock, RequestVerifier, SIGNATURE_HEADER, SignedHeaders, SystemClock,
    TIMESTAMP_HEADER, VerificationMetrics,
};
pub use utils::{SIGNATURE_VERSION, generate_expected_signature, signatures_match};
