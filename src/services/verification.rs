//! Ordered verification checks for signed Slack requests.
//!
//! Each check either returns the value the next step needs or a
//! [`VerificationError`]; the first failure ends verification. The header
//! checks run before the body is read so a rejected request never has its
//! payload consumed.

use crate::{
    config::{SigningSecret, SlackSigningConfig},
    models::VerificationError,
    services::clock::{Clock, SystemClock},
    utils::signature::{generate_expected_signature, signatures_match},
};
use actix_web::http::header::HeaderMap;
use std::sync::Arc;

/// Header carrying the Unix time at which Slack signed the request
pub const TIMESTAMP_HEADER: &str = "X-Slack-Request-Timestamp";

/// Header carrying the `v0=` signature
pub const SIGNATURE_HEADER: &str = "X-Slack-Signature";

/// Header values that passed the pre-body checks
#[derive(Debug, Clone)]
pub struct SignedHeaders {
    /// Timestamp exactly as sent; the signature covers this text, not the parsed value
    pub timestamp: String,
    pub signature: Vec<u8>,
}

/// Read the raw timestamp header
pub fn extract_timestamp(headers: &HeaderMap) -> Result<&[u8], VerificationError> {
    match headers.get(TIMESTAMP_HEADER) {
        Some(value) if !value.is_empty() => Ok(value.as_bytes()),
        _ => Err(VerificationError::MissingTimestamp),
    }
}

/// Parse a timestamp header value as base-10 seconds since the epoch
pub fn parse_timestamp(raw: &[u8]) -> Result<(String, i64), VerificationError> {
    let text = std::str::from_utf8(raw).map_err(|_| VerificationError::InvalidTimestamp)?;
    let seconds = text
        .parse::<i64>()
        .map_err(|_| VerificationError::InvalidTimestamp)?;
    Ok((text.to_string(), seconds))
}

/// Reject requests signed more than `max_age_seconds` before `now`
///
/// A request exactly `max_age_seconds` old is still fresh.
pub fn check_freshness(
    timestamp: i64,
    now: i64,
    max_age_seconds: u64,
) -> Result<(), VerificationError> {
    let max_age = i64::try_from(max_age_seconds).unwrap_or(i64::MAX);
    if now > timestamp.saturating_add(max_age) {
        return Err(VerificationError::RequestTooOld);
    }
    Ok(())
}

/// Read the raw signature header
pub fn extract_signature(headers: &HeaderMap) -> Result<&[u8], VerificationError> {
    match headers.get(SIGNATURE_HEADER) {
        Some(value) if !value.is_empty() => Ok(value.as_bytes()),
        _ => Err(VerificationError::MissingSignature),
    }
}

/// Compare the provided signature with the one computed from the request
pub fn check_signature(
    timestamp: &str,
    body: &[u8],
    provided: &[u8],
    secret: &SigningSecret,
) -> Result<(), VerificationError> {
    let expected = generate_expected_signature(timestamp, body, secret);
    if signatures_match(provided, expected.as_bytes()) {
        Ok(())
    } else {
        Err(VerificationError::InvalidSignature)
    }
}

/// Verifies Slack request signatures against a shared secret and a clock
///
/// Holds no per-request state, so one instance can serve any number of
/// concurrent requests.
#[derive(Clone)]
pub struct RequestVerifier {
    secret: SigningSecret,
    clock: Arc<dyn Clock>,
    max_request_age_seconds: u64,
}

impl RequestVerifier {
    /// Create a verifier using the wall clock and default freshness window
    pub fn new(secret: impl Into<SigningSecret>) -> Self {
        Self::from_config(&SlackSigningConfig::new(secret))
    }

    pub fn from_config(config: &SlackSigningConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            clock: Arc::new(SystemClock),
            max_request_age_seconds: config.max_request_age_seconds,
        }
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replace the freshness window
    pub fn with_max_request_age(mut self, seconds: u64) -> Self {
        self.max_request_age_seconds = seconds;
        self
    }

    pub fn max_request_age_seconds(&self) -> u64 {
        self.max_request_age_seconds
    }

    /// Run every check that only needs headers: timestamp presence, timestamp
    /// parse, freshness and signature presence, in that order
    pub fn check_headers(&self, headers: &HeaderMap) -> Result<SignedHeaders, VerificationError> {
        let raw_timestamp = extract_timestamp(headers)?;
        let (timestamp, seconds) = parse_timestamp(raw_timestamp)?;
        check_freshness(seconds, self.clock.now().timestamp(), self.max_request_age_seconds)?;
        let signature = extract_signature(headers)?.to_vec();

        Ok(SignedHeaders {
            timestamp,
            signature,
        })
    }

    /// Check the signature over a fully buffered body
    pub fn check_body(&self, signed: &SignedHeaders, body: &[u8]) -> Result<(), VerificationError> {
        check_signature(&signed.timestamp, body, &signed.signature, &self.secret)
    }

    /// Run the whole pipeline against headers and an already buffered body
    pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), VerificationError> {
        let signed = self.check_headers(headers)?;
        self.check_body(&signed, body)
    }
}

impl std::fmt::Debug for RequestVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestVerifier")
            .field("secret", &self.secret)
            .field("max_request_age_seconds", &self.max_request_age_seconds)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::clock::FixedClock;
    use actix_web::http::header::{HeaderName, HeaderValue};

    const SECRET: &str = "supersneakysecrets";
    const SIGNED_AT: i64 = 1_262_311_380;
    const BODY: &[u8] = b"token=abbcbdbebdabddb&team_id=V1C2D3T4GH";

    fn headers(pairs: &[(&'static str, &[u8])]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for &(name, value) in pairs {
            map.insert(
                HeaderName::from_static(name),
                HeaderValue::from_bytes(value).unwrap(),
            );
        }
        map
    }

    fn verifier_at(now: i64) -> RequestVerifier {
        RequestVerifier::new(SECRET).with_clock(FixedClock::from_unix(now).unwrap())
    }

    fn signed_headers(timestamp: &str, body: &[u8]) -> HeaderMap {
        let signature = generate_expected_signature(timestamp, body, &SigningSecret::from(SECRET));
        headers(&[
            ("x-slack-request-timestamp", timestamp.as_bytes()),
            ("x-slack-signature", signature.as_bytes()),
        ])
    }

    #[test]
    fn test_missing_timestamp() {
        let verifier = verifier_at(SIGNED_AT);

        assert_eq!(
            verifier.verify(&HeaderMap::new(), BODY),
            Err(VerificationError::MissingTimestamp)
        );
        assert_eq!(
            verifier.verify(&headers(&[("x-slack-request-timestamp", &b""[..])]), BODY),
            Err(VerificationError::MissingTimestamp)
        );
    }

    #[test]
    fn test_unparsable_timestamp() {
        let verifier = verifier_at(SIGNED_AT);

        for bad in [&b"yesterday"[..], b"12.5", b"0x10", b" 1262311380", b"\xff\xfe"] {
            assert_eq!(
                verifier.verify(&headers(&[("x-slack-request-timestamp", bad)]), BODY),
                Err(VerificationError::InvalidTimestamp),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn test_freshness_boundary() {
        assert_eq!(check_freshness(SIGNED_AT, SIGNED_AT + 100, 100), Ok(()));
        assert_eq!(
            check_freshness(SIGNED_AT, SIGNED_AT + 101, 100),
            Err(VerificationError::RequestTooOld)
        );
        // Only staleness is checked
        assert_eq!(check_freshness(SIGNED_AT, SIGNED_AT - 3600, 100), Ok(()));
        assert_eq!(check_freshness(i64::MAX, i64::MAX, u64::MAX), Ok(()));
    }

    #[test]
    fn test_stale_request_is_rejected_before_signature_check() {
        let verifier = verifier_at(SIGNED_AT + 101);
        let timestamp = SIGNED_AT.to_string();

        assert_eq!(
            verifier.verify(&headers(&[("x-slack-request-timestamp", timestamp.as_bytes())]), BODY),
            Err(VerificationError::RequestTooOld)
        );
    }

    #[test]
    fn test_missing_signature() {
        let verifier = verifier_at(SIGNED_AT + 100);
        let timestamp = SIGNED_AT.to_string();

        assert_eq!(
            verifier.verify(&headers(&[("x-slack-request-timestamp", timestamp.as_bytes())]), BODY),
            Err(VerificationError::MissingSignature)
        );
    }

    #[test]
    fn test_invalid_signature() {
        let verifier = verifier_at(SIGNED_AT);
        let timestamp = SIGNED_AT.to_string();
        let map = headers(&[
            ("x-slack-request-timestamp", timestamp.as_bytes()),
            ("x-slack-signature", &b"v0=aaabbbcccdddeee1233454567"[..]),
        ]);

        assert_eq!(verifier.verify(&map, BODY), Err(VerificationError::InvalidSignature));
    }

    #[test]
    fn test_valid_signature_is_accepted_repeatedly() {
        let verifier = verifier_at(SIGNED_AT + 100);
        let map = signed_headers(&SIGNED_AT.to_string(), BODY);

        for _ in 0..3 {
            assert_eq!(verifier.verify(&map, BODY), Ok(()));
        }
    }

    #[test]
    fn test_signature_covers_raw_timestamp_text() {
        let verifier = verifier_at(SIGNED_AT);
        // "+1262311380" parses to the same instant but is a different signed string
        let signed_plain = generate_expected_signature(
            &SIGNED_AT.to_string(),
            BODY,
            &SigningSecret::from(SECRET),
        );
        let map = headers(&[
            ("x-slack-request-timestamp", format!("+{SIGNED_AT}").as_bytes()),
            ("x-slack-signature", signed_plain.as_bytes()),
        ]);

        assert_eq!(verifier.verify(&map, BODY), Err(VerificationError::InvalidSignature));
    }

    #[test]
    fn test_body_tampering_is_detected() {
        let verifier = verifier_at(SIGNED_AT);
        let map = signed_headers(&SIGNED_AT.to_string(), BODY);

        assert_eq!(
            verifier.verify(&map, b"token=abbcbdbebdabddb&team_id=EVIL"),
            Err(VerificationError::InvalidSignature)
        );
    }

    #[test]
    fn test_custom_max_age() {
        let verifier = verifier_at(SIGNED_AT + 20).with_max_request_age(10);
        let map = signed_headers(&SIGNED_AT.to_string(), BODY);

        assert_eq!(verifier.max_request_age_seconds(), 10);
        assert_eq!(verifier.verify(&map, BODY), Err(VerificationError::RequestTooOld));
    }

    #[test]
    fn test_debug_hides_secret() {
        let verifier = RequestVerifier::new(SECRET);
        assert!(!format!("{verifier:?}").contains(SECRET));
    }
}
