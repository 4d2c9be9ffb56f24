//! Audit records for Slack request verification decisions.

use crate::models::VerificationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Whether the request reached the downstream handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    Accepted,
    Rejected,
}

/// Structured audit log entry for one verification decision
///
/// Carries request metadata only. The signing secret, the provided
/// signature and the body are never recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationAuditEvent {
    pub outcome: VerificationOutcome,
    pub reason: Option<String>,
    pub status: Option<u16>,
    pub timestamp: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub method: String,
    pub endpoint: String,
    pub request_id: Option<String>,
}

impl VerificationAuditEvent {
    /// Event for a request that passed every check
    pub fn accepted(ip_address: String, method: String, endpoint: String) -> Self {
        Self {
            outcome: VerificationOutcome::Accepted,
            reason: None,
            status: None,
            timestamp: Utc::now(),
            ip_address,
            user_agent: None,
            method,
            endpoint,
            request_id: None,
        }
    }

    /// Event for a request stopped by `error`
    pub fn rejected(
        error: &VerificationError,
        ip_address: String,
        method: String,
        endpoint: String,
    ) -> Self {
        use actix_web::ResponseError;

        Self {
            outcome: VerificationOutcome::Rejected,
            reason: Some(error.reason().to_string()),
            status: Some(error.status_code().as_u16()),
            ..Self::accepted(ip_address, method, endpoint)
        }
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    /// Log the audit event using structured logging
    pub fn log(&self) {
        info!(
            target: "slack_verify_audit",
            outcome = ?self.outcome,
            reason = ?self.reason,
            status = ?self.status,
            timestamp = %self.timestamp,
            ip_address = %self.ip_address,
            user_agent = ?self.user_agent,
            method = %self.method,
            endpoint = %self.endpoint,
            request_id = ?self.request_id,
            "Slack verification audit event"
        );
    }
}
