//! Authenticated HTTP transport.
//!
//! Every outbound call to the backend passes through
//! `AuthenticatedTransport`. It attaches the current bearer token at send
//! time, and on a 401 coordinates a single deduplicated refresh cycle:
//! whichever request observes the failure first performs the refresh,
//! every concurrent 401 waits for that cycle instead of issuing its own,
//! and each request is replayed at most once with the new token.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::auth::{SessionManager, TokenPair};

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow processing responses while failing fast enough
/// for good UX. The core imposes no other timeout of its own.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Token refresh endpoint
const REFRESH_PATH: &str = "/api/auth/refresh";

/// A replayable outbound request.
///
/// Bodies are owned values (JSON document or raw multipart parts) so a
/// request rejected with 401 can be rebuilt byte-for-byte and re-sent
/// once the token pair has been rotated.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<MultipartPart>),
}

/// One part of a multipart form, held as raw bytes so the form can be
/// rebuilt for a replay (reqwest forms are consumed on send).
#[derive(Debug, Clone)]
pub struct MultipartPart {
    pub name: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl RequestSpec {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn multipart(mut self, parts: Vec<MultipartPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }
}

/// A fully-read response: status plus the complete body. Reading the body
/// eagerly keeps replays and error normalization simple.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ApiError::Unexpected(format!("Failed to parse response: {}", e)))
    }
}

/// Low-level sender seam.
///
/// `AuthenticatedTransport` owns the refresh/retry policy; this trait owns
/// only the wire. Tests drive the policy against a fake implementation.
#[async_trait]
pub trait HttpSend: Send + Sync {
    async fn send(
        &self,
        url: &str,
        spec: &RequestSpec,
        bearer: Option<&str>,
    ) -> Result<RawResponse, ApiError>;
}

/// Production sender backed by reqwest.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ReqwestSender {
    client: Client,
}

impl ReqwestSender {
    pub fn new() -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpSend for ReqwestSender {
    async fn send(
        &self,
        url: &str,
        spec: &RequestSpec,
        bearer: Option<&str>,
    ) -> Result<RawResponse, ApiError> {
        let mut request = self.client.request(spec.method.clone(), url);

        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        for (name, value) in &spec.headers {
            request = request.header(name, value);
        }

        request = match &spec.body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(value),
            RequestBody::Multipart(parts) => {
                let mut form = reqwest::multipart::Form::new();
                for part in parts {
                    let piece = reqwest::multipart::Part::bytes(part.bytes.clone())
                        .file_name(part.file_name.clone())
                        .mime_str(&part.content_type)?;
                    form = form.part(part.name.clone(), piece);
                }
                request.multipart(form)
            }
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        Ok(RawResponse { status, body })
    }
}

/// Bearer-authenticated transport with single-flight token refresh.
///
/// Clone is cheap; clones share the sender, the session, and the refresh
/// gate, so the at-most-one-cycle invariant holds across all of them.
#[derive(Clone)]
pub struct AuthenticatedTransport {
    sender: Arc<dyn HttpSend>,
    session: SessionManager,
    base_url: String,
    refresh_gate: Arc<Mutex<()>>,
}

impl AuthenticatedTransport {
    pub fn new(
        sender: Arc<dyn HttpSend>,
        session: SessionManager,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            sender,
            session,
            base_url: base_url.trim_end_matches('/').to_string(),
            refresh_gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Send an authenticated request.
    ///
    /// The bearer token is read from the session at send time, never from
    /// a captured snapshot, so a login or refresh that lands before this
    /// call is always honored. On 401 the request joins the refresh cycle
    /// and is replayed at most once with the rotated token; a second 401
    /// surfaces as an expired session rather than looping.
    pub async fn request(&self, spec: RequestSpec) -> Result<RawResponse, ApiError> {
        let url = self.url(&spec.path);
        let token = self.session.access_token();

        let response = self.sender.send(&url, &spec, token.as_deref()).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        debug!(path = %spec.path, "Request rejected with 401, joining refresh cycle");
        let fresh = self.refresh_after_unauthorized(token.as_deref()).await?;

        let retried = self.sender.send(&url, &spec, Some(&fresh)).await?;
        if retried.status == StatusCode::UNAUTHORIZED {
            warn!(path = %spec.path, "Replay rejected with the refreshed token");
            return Err(ApiError::SessionExpired);
        }
        Ok(retried)
    }

    /// Send without a bearer header and without the 401 machinery. Used
    /// for the identity endpoints, which are called while logged out.
    pub async fn request_anonymous(&self, spec: RequestSpec) -> Result<RawResponse, ApiError> {
        let url = self.url(&spec.path);
        self.sender.send(&url, &spec, None).await
    }

    /// Single-flight refresh cycle.
    ///
    /// The gate makes check-then-act atomic: the first 401 through it
    /// performs the refresh call, and every 401 queued behind it finds the
    /// access token already rotated and replays without a second call. The
    /// gate is FIFO-fair, so waiters are released in attachment order. A
    /// waiter whose caller was torn down simply leaves the queue; the
    /// cycle's bookkeeping is untouched.
    async fn refresh_after_unauthorized(&self, stale: Option<&str>) -> Result<String, ApiError> {
        let _gate = self.refresh_gate.lock().await;

        // Logged out, or a failed cycle ahead of us already cleared the
        // session: there is nothing to refresh with.
        let Some(current) = self.session.current_tokens() else {
            return Err(ApiError::SessionExpired);
        };

        // A cycle ahead of us already rotated the pair.
        if stale != Some(current.access_token.as_str()) {
            debug!("Token already rotated by an earlier refresh cycle");
            return Ok(current.access_token);
        }

        info!("Refreshing access token");
        match self.call_refresh_endpoint(&current.refresh_token).await {
            Ok(pair) => {
                let access = pair.access_token.clone();
                self.session.login(pair).map_err(|e| {
                    ApiError::Unexpected(format!("Failed to persist refreshed session: {:#}", e))
                })?;
                info!("Access token refreshed");
                Ok(access)
            }
            Err(err) => {
                // Surface the expired session, not the refresh call's own
                // error shape; waiters must all see the same outcome.
                warn!(error = %err, "Token refresh failed, logging out");
                if let Err(e) = self.session.logout() {
                    warn!(error = %e, "Failed to clear session after refresh failure");
                }
                Err(ApiError::SessionExpired)
            }
        }
    }

    /// The refresh call itself: sent raw, with no bearer header and no
    /// retry, so it can never recurse into another cycle.
    async fn call_refresh_endpoint(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let spec = RequestSpec::post(REFRESH_PATH)
            .json(serde_json::json!({ "refresh_token": refresh_token }));
        let response = self.request_anonymous(spec).await?;

        if !response.status.is_success() {
            return Err(ApiError::from_status(response.status, &response.body));
        }
        response.json::<TokenPair>()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
