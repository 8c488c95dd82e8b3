//! Request gateway
//!
//! Turns a [`RequestDescriptor`] into an [`ApiResponse`] or an [`Error`],
//! attaching the bearer credential and resolving an expired access token
//! with at most one refresh and one retry per call.

use crate::auth::RefreshCoordinator;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::request::{ApiResponse, RequestDescriptor, ResponseBody};
use crate::session::{Session, Token};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Anything able to execute a [`RequestDescriptor`]
///
/// Implemented by [`RequestGateway`]; resource clients and list controllers
/// depend on this seam only.
#[async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(&self, request: &RequestDescriptor) -> Result<ApiResponse>;
}

/// Session lifecycle signals broadcast by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Credentials were rejected and could not be refreshed; the session
    /// has been cleared and the user must log in again.
    Expired,
}

/// Authenticated HTTP gateway to the compliance platform API
#[derive(Debug, Clone)]
pub struct RequestGateway {
    config: Arc<ClientConfig>,
    http_client: reqwest::Client,
    session: Arc<Session>,
    refresher: Arc<RefreshCoordinator>,
    events: broadcast::Sender<SessionEvent>,
}

impl RequestGateway {
    /// Create a gateway for `config` sharing `session`
    pub fn new(config: ClientConfig, session: Arc<Session>) -> Result<Self> {
        config.validate()?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let refresher = RefreshCoordinator::new(http_client.clone(), config.refresh_url(), session.clone());
        let (events, _) = broadcast::channel(16);

        Ok(Self {
            config: Arc::new(config),
            http_client,
            session,
            refresher: Arc::new(refresher),
            events,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Receive [`SessionEvent`]s, e.g. to force navigation to the login flow
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Number of refresh requests sent over the gateway's lifetime
    pub fn refresh_count(&self) -> u64 {
        self.refresher.refresh_count()
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Returns `false` on any failure without touching the session; the
    /// caller decides whether to clear it.
    pub async fn refresh(&self) -> bool {
        self.refresher.refresh().await.is_ok()
    }

    /// `GET path` and decode the JSON body of the successful response
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(&RequestDescriptor::get(path)).await
    }

    /// Execute and decode the JSON body of a successful response
    pub async fn send_json<T: DeserializeOwned>(&self, request: &RequestDescriptor) -> Result<T> {
        self.execute(request).await?.decode()
    }

    async fn execute_inner(&self, request: &RequestDescriptor) -> Result<ApiResponse> {
        let sent_token = if request.requires_auth {
            self.session.access_token()
        } else {
            None
        };

        let response = self.send(request, sent_token.as_ref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED || !request.requires_auth {
            return read_response(response).await;
        }

        debug!(path = %request.path, "Access token rejected");
        if self.session.refresh_token().is_none() {
            return Err(self.expire_session("no refresh token"));
        }

        let token = match self.refresher.refresh_after(sent_token.as_ref()).await {
            Ok(token) => token,
            Err(failure) => return Err(self.expire_session(&failure.to_string())),
        };

        // Exactly one retry; a second 401 surfaces as Unauthorized.
        debug!(path = %request.path, "Retrying with refreshed access token");
        let retry = self.send(request, Some(&token)).await?;
        read_response(retry).await
    }

    async fn send(&self, request: &RequestDescriptor, token: Option<&Token>) -> Result<reqwest::Response> {
        let url = self.config.url(&request.path);
        let mut builder = self
            .http_client
            .request(request.method.clone(), &url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token.as_str());
        }

        debug!(method = %request.method, path = %request.path, "Sending request");
        let response = builder.send().await.map_err(|e| {
            warn!(method = %request.method, path = %request.path, error = %e, "Request failed before a response arrived");
            Error::Network(e)
        })?;
        debug!(path = %request.path, status = response.status().as_u16(), "Response received");

        Ok(response)
    }

    fn expire_session(&self, reason: &str) -> Error {
        warn!(reason, "Session expired");
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear persisted session");
        }
        // No subscribers is fine; the error still reaches the caller.
        let _ = self.events.send(SessionEvent::Expired);
        Error::SessionExpired
    }
}

#[async_trait]
impl RequestExecutor for RequestGateway {
    async fn execute(&self, request: &RequestDescriptor) -> Result<ApiResponse> {
        self.execute_inner(request).await
    }
}

/// Parse the body and map non-2xx statuses to errors
async fn read_response(response: reqwest::Response) -> Result<ApiResponse> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = response.bytes().await?;

    let body = match ResponseBody::parse(content_type.as_deref(), &bytes) {
        Ok(body) => body,
        // Error pages sometimes claim JSON without being JSON.
        Err(_) if !status.is_success() => ResponseBody::Text(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => return Err(e),
    };

    if status.is_success() {
        return Ok(ApiResponse {
            status: status.as_u16(),
            body,
        });
    }

    Err(error_from_body(status, &body))
}

fn error_from_body(status: StatusCode, body: &ResponseBody) -> Error {
    let fallback = || {
        format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown Status")
        )
    };

    match body {
        ResponseBody::Json(value) => {
            let discriminator = value.get("error").and_then(|v| v.as_str());
            let message = value
                .get("message")
                .and_then(|v| v.as_str())
                .or(discriminator)
                .map(str::to_string)
                .unwrap_or_else(fallback);
            Error::from_status(status, discriminator, message)
        }
        ResponseBody::Text(_) | ResponseBody::Empty => Error::from_status(status, None, fallback()),
    }
}
