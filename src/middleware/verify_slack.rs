//! Slack request verification middleware.

use crate::{
    config::{SigningSecret, SlackSigningConfig},
    models::{VerificationAuditEvent, VerificationError},
    services::{Clock, RequestVerifier, VerificationMetrics},
    utils::{extract_client_ip, extract_request_id, extract_user_agent},
};
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::EitherBody,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web::{Bytes, BytesMut},
};
use futures::StreamExt;
use std::{
    future::{Ready, ready},
    pin::Pin,
    rc::Rc,
    time::Instant,
};

/// Slack verification middleware factory
///
/// Wraps a downstream service so it only sees requests carrying a fresh,
/// valid `X-Slack-Signature`. Rejected requests get a plain-text error
/// response and never reach the downstream service. Accepted requests are
/// forwarded with their body intact.
///
/// ```no_run
/// use actix_web::{App, HttpResponse, web};
/// use slack_verify::VerifySlackRequests;
///
/// let app = App::new()
///     .wrap(VerifySlackRequests::new("signing-secret"))
///     .route("/slack/events", web::post().to(|| async { HttpResponse::Ok().finish() }));
/// ```
#[derive(Clone)]
pub struct VerifySlackRequests {
    verifier: RequestVerifier,
    max_body_bytes: usize,
    metrics: Option<VerificationMetrics>,
}

impl VerifySlackRequests {
    /// Create a gate using the wall clock and default limits
    pub fn new(secret: impl Into<SigningSecret>) -> Self {
        Self::from_config(&SlackSigningConfig::new(secret))
    }

    pub fn from_config(config: &SlackSigningConfig) -> Self {
        Self {
            verifier: RequestVerifier::from_config(config),
            max_body_bytes: config.max_body_bytes,
            metrics: None,
        }
    }

    /// Use `clock` instead of the wall clock for the freshness check
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.verifier = self.verifier.with_clock(clock);
        self
    }

    pub fn with_max_request_age(mut self, seconds: u64) -> Self {
        self.verifier = self.verifier.with_max_request_age(seconds);
        self
    }

    /// Bodies larger than this are treated as unreadable
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn with_metrics(mut self, metrics: VerificationMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for VerifySlackRequests
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = VerifySlackRequestsMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(VerifySlackRequestsMiddleware {
            service: Rc::new(service),
            gate: Rc::new(self.clone()),
        }))
    }
}

/// The actual Slack verification middleware service
pub struct VerifySlackRequestsMiddleware<S> {
    service: Rc<S>,
    gate: Rc<VerifySlackRequests>,
}

impl<S, B> Service<ServiceRequest> for VerifySlackRequestsMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let gate = Rc::clone(&self.gate);

        Box::pin(async move {
            let started = Instant::now();

            let signed = match gate.verifier.check_headers(req.headers()) {
                Ok(signed) => signed,
                Err(error) => return Ok(gate.reject(req, error, started)),
            };

            let body = match read_body(req.take_payload(), gate.max_body_bytes).await {
                Ok(body) => body,
                Err(error) => return Ok(gate.reject(req, error, started)),
            };

            if let Err(error) = gate.verifier.check_body(&signed, &body) {
                return Ok(gate.reject(req, error, started));
            }

            req.set_payload(bytes_to_payload(body));
            gate.accept(&req, started);

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

impl VerifySlackRequests {
    fn audit_event(
        req: &ServiceRequest,
        error: Option<&VerificationError>,
    ) -> VerificationAuditEvent {
        let http_req = req.request();
        let ip_address = extract_client_ip(http_req);
        let method = req.method().to_string();
        let endpoint = req.path().to_string();

        let event = match error {
            Some(error) => VerificationAuditEvent::rejected(error, ip_address, method, endpoint),
            None => VerificationAuditEvent::accepted(ip_address, method, endpoint),
        };

        event
            .with_user_agent(extract_user_agent(http_req))
            .with_request_id(extract_request_id(http_req))
    }

    fn accept(&self, req: &ServiceRequest, started: Instant) {
        tracing::debug!(
            target: "slack_verify",
            method = %req.method(),
            path = %req.path(),
            "Slack request verified"
        );
        Self::audit_event(req, None).log();

        if let Some(metrics) = &self.metrics {
            metrics.record_accepted(started.elapsed());
        }
    }

    fn reject<B>(
        &self,
        req: ServiceRequest,
        error: VerificationError,
        started: Instant,
    ) -> ServiceResponse<EitherBody<B>> {
        if error.is_client_error() {
            tracing::warn!(
                target: "slack_verify",
                method = %req.method(),
                path = %req.path(),
                reason = error.reason(),
                status = error.status_code().as_u16(),
                max_request_age = self.verifier.max_request_age_seconds(),
                "Slack request rejected: {error}"
            );
        } else {
            tracing::error!(
                target: "slack_verify",
                method = %req.method(),
                path = %req.path(),
                reason = error.reason(),
                status = error.status_code().as_u16(),
                "Slack request rejected: {error}"
            );
        }
        Self::audit_event(&req, Some(&error)).log();

        if let Some(metrics) = &self.metrics {
            metrics.record_rejected(&error, started.elapsed());
        }

        req.into_response(error.error_response()).map_into_right_body()
    }
}

/// Buffer the whole request body, failing on stream errors or when it exceeds `limit`
async fn read_body(mut payload: Payload, limit: usize) -> Result<Bytes, VerificationError> {
    let mut body = BytesMut::new();

    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|error| {
            tracing::error!(target: "slack_verify", %error, "Failed to read request body");
            VerificationError::BodyRead
        })?;

        if body.len() + chunk.len() > limit {
            tracing::error!(
                target: "slack_verify",
                limit,
                "Request body exceeds the verification limit"
            );
            return Err(VerificationError::BodyRead);
        }

        body.extend_from_slice(&chunk);
    }

    Ok(body.freeze())
}

/// Wrap buffered bytes in a fresh payload so downstream extractors can read them
fn bytes_to_payload(body: Bytes) -> Payload {
    let (_, mut payload) = actix_http::h1::Payload::create(true);
    payload.unread_data(body);
    Payload::from(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{services::FixedClock, utils::generate_expected_signature};
    use actix_http::BoxedPayloadStream;
    use actix_web::{App, HttpResponse, error::PayloadError, http::StatusCode, test, web};
    use futures::stream;

    const SECRET: &str = "supersneakysecrets";
    const SIGNED_AT: i64 = 1_262_311_380;

    async fn echo(body: Bytes) -> HttpResponse {
        HttpResponse::Ok().body(body)
    }

    fn gate(now: i64) -> VerifySlackRequests {
        VerifySlackRequests::new(SECRET).with_clock(FixedClock::from_unix(now).unwrap())
    }

    #[actix_web::test]
    async fn test_oversized_body_is_a_read_failure() {
        let app = test::init_service(
            App::new()
                .wrap(gate(SIGNED_AT).with_max_body_bytes(8))
                .route("/", web::post().to(echo)),
        )
        .await;

        let timestamp = SIGNED_AT.to_string();
        let body = "a body longer than eight bytes";
        let signature =
            generate_expected_signature(&timestamp, body.as_bytes(), &SigningSecret::from(SECRET));
        let req = test::TestRequest::post()
            .uri("/")
            .insert_header(("X-Slack-Request-Timestamp", timestamp))
            .insert_header(("X-Slack-Signature", signature))
            .set_payload(body)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(test::read_body(resp).await, "failed to read body\n");
    }

    fn failing_payload() -> Payload {
        let chunks: BoxedPayloadStream = Box::pin(stream::iter(vec![
            Ok(Bytes::from_static(b"token=abc")),
            Err(PayloadError::Incomplete(None)),
        ]));
        Payload::from(chunks)
    }

    #[actix_web::test]
    async fn test_stream_error_is_a_read_failure() {
        let result = read_body(failing_payload(), 1024).await;

        assert_eq!(result, Err(VerificationError::BodyRead));
    }

    #[actix_web::test]
    async fn test_body_at_exact_limit_is_read() {
        let payload = bytes_to_payload(Bytes::from_static(b"12345678"));
        let body = read_body(payload, 8).await.unwrap();

        assert_eq!(&body[..], b"12345678");
    }

    #[actix_web::test]
    async fn test_gate_answers_stream_error_with_500() {
        let srv = gate(SIGNED_AT)
            .new_transform(test::ok_service())
            .await
            .unwrap();

        let mut req = test::TestRequest::post()
            .uri("/")
            .insert_header(("X-Slack-Request-Timestamp", SIGNED_AT.to_string()))
            .insert_header(("X-Slack-Signature", "v0=anything"))
            .to_srv_request();
        req.set_payload(failing_payload());

        let resp = srv.call(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(test::read_body(resp).await, "failed to read body\n");
    }

    #[actix_web::test]
    async fn test_read_body_collects_all_chunks() {
        let payload = bytes_to_payload(Bytes::from_static(b"token=abc&team_id=T1"));
        let body = read_body(payload, 1024).await.unwrap();

        assert_eq!(&body[..], b"token=abc&team_id=T1");
    }

    #[actix_web::test]
    async fn test_metrics_record_each_decision() {
        let metrics = VerificationMetrics::new().unwrap();
        let app = test::init_service(
            App::new()
                .wrap(gate(SIGNED_AT).with_metrics(metrics.clone()))
                .route("/", web::post().to(echo)),
        )
        .await;

        let req = test::TestRequest::post().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let timestamp = SIGNED_AT.to_string();
        let signature =
            generate_expected_signature(&timestamp, b"ok", &SigningSecret::from(SECRET));
        let req = test::TestRequest::post()
            .uri("/")
            .insert_header(("X-Slack-Request-Timestamp", timestamp))
            .insert_header(("X-Slack-Signature", signature))
            .set_payload("ok")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        assert_eq!(
            metrics
                .requests_total
                .with_label_values(&["rejected", "missing_timestamp"])
                .get(),
            1.0
        );
        assert_eq!(
            metrics
                .requests_total
                .with_label_values(&["accepted", "none"])
                .get(),
            1.0
        );
    }
}
