//! Request gate
//!
//! Every inbound request passes through [`Gate::intercept`] before it reaches
//! a handler. Decisions, first match wins:
//!
//! 1. Path under the API prefix: origin must be in the allow-list, else 403.
//! 2. Allowed origin + `OPTIONS`: empty 200 carrying CORS headers, no handler.
//! 3. Allowed origin, any other method: handler runs, CORS headers attached.
//! 4. Any other path: session cookie handed to the refresher, handler runs,
//!    renewed cookie (if any) attached.
//!
//! [`Gate::evaluate`] is the pure part; it holds no state between calls.

pub mod cors;
pub mod request;
pub mod token_status;

pub use cors::{check_origin, CorsHeaders};
pub use request::{extract_cookie, RequestMeta};
pub use token_status::token_status;

use hyper::header::{HeaderValue, SET_COOKIE};
use hyper::{Request, Response, StatusCode};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::auth::{unix_now, Claims, JwtValidator};
use crate::config::GateConfig;
use crate::server::response::{empty_response, BoxBody};
use crate::session::{SessionOutcome, SessionRefresher};
use crate::types::GateError;

/// What the gate does with one request
#[derive(Debug)]
pub enum Decision {
    /// Turn the request away
    Reject(GateError),
    /// Answer the preflight directly
    Preflight(CorsHeaders),
    /// Run the handler, then attach CORS headers
    PassThrough(CorsHeaders),
    /// Let the session refresher look at the cookie, then run the handler
    RefreshSession,
}

/// Decide what happens to a request. Pure over its inputs.
pub fn evaluate(config: &GateConfig, meta: &RequestMeta) -> Decision {
    if !config.is_api_path(&meta.path) {
        return Decision::RefreshSession;
    }

    match check_origin(config, meta) {
        Err(e) => Decision::Reject(e),
        Ok(cors) if meta.is_preflight() => Decision::Preflight(cors),
        Ok(cors) => Decision::PassThrough(cors),
    }
}

/// The gate with its read-only configuration and collaborators
#[derive(Clone)]
pub struct Gate {
    config: Arc<GateConfig>,
    jwt: JwtValidator,
    refresher: Arc<dyn SessionRefresher>,
}

impl Gate {
    pub fn new(
        config: Arc<GateConfig>,
        jwt: JwtValidator,
        refresher: Arc<dyn SessionRefresher>,
    ) -> Self {
        Self {
            config,
            jwt,
            refresher,
        }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn evaluate(&self, meta: &RequestMeta) -> Decision {
        evaluate(&self.config, meta)
    }

    /// Token-status query against the current clock
    pub fn token_status(&self, token: Option<&str>) -> Result<Claims, GateError> {
        token_status(
            &self.jwt,
            token,
            self.config.expiry_lookahead_secs,
            unix_now(),
        )
    }

    /// Run `req` through the gate, invoking `next` only if it is admitted
    pub async fn intercept<B, F, Fut>(&self, req: Request<B>, next: F) -> Response<BoxBody>
    where
        F: FnOnce(Request<B>) -> Fut,
        Fut: Future<Output = Response<BoxBody>>,
    {
        let meta = RequestMeta::from_request(&req, &self.config.session_cookie);

        match self.evaluate(&meta) {
            Decision::Reject(err) => {
                warn!(
                    method = %meta.method,
                    path = %meta.path,
                    origin = meta.origin_str().unwrap_or("<none>"),
                    "Rejected: {}",
                    err
                );
                err.into_response()
            }
            Decision::Preflight(cors) => {
                debug!(path = %meta.path, "Answering CORS preflight");
                let mut response = empty_response(StatusCode::OK);
                cors.apply(response.headers_mut());
                response
            }
            Decision::PassThrough(cors) => {
                let mut response = next(req).await;
                cors.apply(response.headers_mut());
                response
            }
            Decision::RefreshSession => {
                let outcome = match self.refresher.refresh(meta.session_token.as_deref()).await {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        error!(path = %meta.path, "Session refresh failed: {}", err);
                        return err.into_response();
                    }
                };

                let mut response = next(req).await;
                if let SessionOutcome::Renewed { cookie, .. } = outcome {
                    match HeaderValue::from_str(&cookie) {
                        Ok(value) => {
                            response.headers_mut().append(SET_COOKIE, value);
                        }
                        Err(e) => warn!("Renewed session cookie not a valid header: {}", e),
                    }
                }
                response
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, TokenInput};
    use crate::config::{ExecutionMode, DEV_ORIGIN};
    use crate::server::response::json_response;
    use async_trait::async_trait;
    use http_body_util::BodyExt;
    use hyper::header::{
        ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
        ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
    };
    use hyper::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records calls and always renews
    #[derive(Default)]
    struct CountingRefresher {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SessionRefresher for CountingRefresher {
        async fn refresh(&self, token: Option<&str>) -> Result<SessionOutcome, GateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match token {
                Some(_) => Ok(SessionOutcome::Renewed {
                    cookie: "session=renewed; Path=/".into(),
                    expires_at: 0,
                }),
                None => Ok(SessionOutcome::Unchanged),
            }
        }
    }

    struct FailingRefresher;

    #[async_trait]
    impl SessionRefresher for FailingRefresher {
        async fn refresh(&self, _token: Option<&str>) -> Result<SessionOutcome, GateError> {
            Err(GateError::SessionRefresh("store unavailable".into()))
        }
    }

    fn jwt() -> JwtValidator {
        JwtValidator::new("gate-test-secret-that-is-at-least-32-chars".into(), 3600).unwrap()
    }

    fn production_gate(refresher: Arc<dyn SessionRefresher>) -> Gate {
        let config = GateConfig::new(ExecutionMode::Production, Some("https://example.com".into()));
        Gate::new(Arc::new(config), jwt(), refresher)
    }

    fn request(method: Method, path: &str, origin: Option<&str>, cookie: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(origin) = origin {
            builder = builder.header("Origin", origin);
        }
        if let Some(cookie) = cookie {
            builder = builder.header("Cookie", cookie);
        }
        builder.body(()).unwrap()
    }

    async fn run(gate: &Gate, req: Request<()>, handler_calls: &AtomicUsize) -> Response<BoxBody> {
        gate.intercept(req, |_req| async move {
            handler_calls.fetch_add(1, Ordering::SeqCst);
            json_response(StatusCode::OK, &serde_json::json!({ "jobs": [] }))
        })
        .await
    }

    async fn body_bytes(response: Response<BoxBody>) -> bytes::Bytes {
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn test_disallowed_origin_forbidden() {
        let refresher = Arc::new(CountingRefresher::default());
        let gate = production_gate(refresher.clone());
        let handler = AtomicUsize::new(0);

        let response = run(
            &gate,
            request(Method::GET, "/api/jobs", Some("https://evil.com"), None),
            &handler,
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(handler.load(Ordering::SeqCst), 0);
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);

        let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(body["code"], "ORIGIN_NOT_ALLOWED");
    }

    #[tokio::test]
    async fn test_non_utf8_origin_forbidden() {
        let gate = production_gate(Arc::new(CountingRefresher::default()));
        let handler = AtomicUsize::new(0);

        let mut req = request(Method::GET, "/api/jobs", None, None);
        req.headers_mut().insert(
            hyper::header::ORIGIN,
            hyper::header::HeaderValue::from_bytes(b"https://ex\xffample.com").unwrap(),
        );

        let response = run(&gate, req, &handler).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        assert_eq!(handler.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_origin_forbidden() {
        let gate = production_gate(Arc::new(CountingRefresher::default()));
        let handler = AtomicUsize::new(0);

        let response = run(&gate, request(Method::POST, "/api/jobs", None, None), &handler).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(handler.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_preflight_short_circuits() {
        let gate = production_gate(Arc::new(CountingRefresher::default()));
        let handler = AtomicUsize::new(0);

        let response = run(
            &gate,
            request(Method::OPTIONS, "/api/jobs", Some("https://example.com"), None),
            &handler,
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(handler.load(Ordering::SeqCst), 0);

        let headers = response.headers();
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://example.com");
        assert_eq!(
            headers[ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type, Authorization, X-CSRF-Token"
        );
        assert_eq!(
            headers[ACCESS_CONTROL_ALLOW_METHODS],
            "GET, POST, PUT, DELETE, OPTIONS"
        );
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[ACCESS_CONTROL_MAX_AGE], "86400");

        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_allowed_origin_passes_through_with_cors() {
        let refresher = Arc::new(CountingRefresher::default());
        let gate = production_gate(refresher.clone());
        let handler = AtomicUsize::new(0);

        let response = run(
            &gate,
            request(
                Method::PUT,
                "/api/jobs/12",
                Some("https://example.com"),
                Some("session=abc"),
            ),
            &handler,
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(handler.load(Ordering::SeqCst), 1);
        assert_eq!(
            response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://example.com"
        );
        // API paths never touch the session refresher
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 0);
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_non_api_path_delegates_to_refresher() {
        let refresher = Arc::new(CountingRefresher::default());
        let gate = production_gate(refresher.clone());
        let handler = AtomicUsize::new(0);

        // A hostile origin is irrelevant off the API surface
        let response = run(
            &gate,
            request(
                Method::GET,
                "/jobs/12",
                Some("https://evil.com"),
                Some("session=abc"),
            ),
            &handler,
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(handler.load(Ordering::SeqCst), 1);
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(response.headers()[SET_COOKIE], "session=renewed; Path=/");
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[tokio::test]
    async fn test_non_api_without_cookie_is_unchanged() {
        let refresher = Arc::new(CountingRefresher::default());
        let gate = production_gate(refresher.clone());
        let handler = AtomicUsize::new(0);

        let response = run(&gate, request(Method::GET, "/", None, None), &handler).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(refresher.calls.load(Ordering::SeqCst), 1);
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_refresher_failure_is_terminal() {
        let gate = production_gate(Arc::new(FailingRefresher));
        let handler = AtomicUsize::new(0);

        let response = run(&gate, request(Method::GET, "/profile", None, None), &handler).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(handler.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let config = GateConfig::new(ExecutionMode::Production, Some("https://example.com".into()));
        let req = request(Method::GET, "/api/jobs", Some("https://example.com"), None);
        let meta = RequestMeta::from_request(&req, "session");

        for _ in 0..3 {
            match evaluate(&config, &meta) {
                Decision::PassThrough(cors) => assert_eq!(cors.origin(), "https://example.com"),
                other => panic!("unexpected decision {:?}", other),
            }
        }

        let bad = RequestMeta {
            origin: Some(HeaderValue::from_static("https://evil.com")),
            ..meta
        };
        for _ in 0..3 {
            assert!(matches!(
                evaluate(&config, &bad),
                Decision::Reject(GateError::OriginNotAllowed(Some(_)))
            ));
        }
    }

    #[test]
    fn test_dev_mode_allows_localhost() {
        let config = GateConfig::new(ExecutionMode::Development, None);
        let req = request(Method::OPTIONS, "/api/profile", Some(DEV_ORIGIN), None);
        let meta = RequestMeta::from_request(&req, "session");

        assert!(matches!(evaluate(&config, &meta), Decision::Preflight(_)));
    }

    #[test]
    fn test_gate_token_status() {
        let gate = production_gate(Arc::new(CountingRefresher::default()));
        let now = unix_now();
        let input = TokenInput {
            subject: "admin-1".into(),
            role: Role::Admin,
        };

        assert!(matches!(
            gate.token_status(None),
            Err(GateError::Unauthenticated)
        ));

        let soon = jwt().issue_token(input.clone(), now, now + 600).unwrap();
        assert!(matches!(
            gate.token_status(Some(&soon)),
            Err(GateError::ExpiringSoon { .. })
        ));

        let later = jwt().issue_token(input, now, now + 3600).unwrap();
        let claims = gate.token_status(Some(&later)).unwrap();
        assert!(claims.is_admin());
    }
}
