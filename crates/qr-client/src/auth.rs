//! Access token refresh
//!
//! Exchanges the refresh token for a new access token. Concurrent callers
//! that hit a 401 with the same stale token share a single in-flight refresh
//! instead of racing each other; the refresh request itself bypasses the
//! gateway so it can never trigger another refresh.

use crate::session::{Session, Token};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome shared between every caller awaiting the same refresh
pub type RefreshResult = std::result::Result<Token, RefreshFailure>;

type InFlightRefresh = Shared<BoxFuture<'static, RefreshResult>>;

/// Why a refresh did not produce a new access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshFailure {
    /// No refresh token in the session
    MissingRefreshToken,
    /// The refresh endpoint could not be reached
    Network(String),
    /// The refresh endpoint answered with a non-2xx status
    Rejected(u16),
    /// 2xx response without a usable access token
    InvalidResponse(String),
}

impl std::fmt::Display for RefreshFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshFailure::MissingRefreshToken => write!(f, "no refresh token"),
            RefreshFailure::Network(e) => write!(f, "network error: {}", e),
            RefreshFailure::Rejected(status) => write!(f, "refresh rejected with status {}", status),
            RefreshFailure::InvalidResponse(e) => write!(f, "invalid refresh response: {}", e),
        }
    }
}

/// Body of a successful refresh
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    /// Present only when the server rotates refresh tokens
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Deduplicating access token refresher
pub struct RefreshCoordinator {
    http_client: reqwest::Client,
    refresh_url: String,
    session: Arc<Session>,
    in_flight: Arc<Mutex<Option<InFlightRefresh>>>,
    refresh_count: Arc<AtomicU64>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("refresh_url", &self.refresh_url)
            .field("in_flight", &self.in_flight.lock().is_some())
            .field("refresh_count", &self.refresh_count())
            .finish()
    }
}

impl RefreshCoordinator {
    pub fn new(http_client: reqwest::Client, refresh_url: String, session: Arc<Session>) -> Self {
        Self {
            http_client,
            refresh_url,
            session,
            in_flight: Arc::new(Mutex::new(None)),
            refresh_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of refresh requests actually sent
    pub fn refresh_count(&self) -> u64 {
        self.refresh_count.load(Ordering::Relaxed)
    }

    /// Obtain an access token to replace `stale`, the token a request was
    /// rejected with.
    ///
    /// Joins the in-flight refresh if there is one. If the session already
    /// holds a different access token, a refresh has completed since the
    /// request was sent and that token is returned without a new request.
    pub async fn refresh_after(&self, stale: Option<&Token>) -> RefreshResult {
        let refresh = {
            let mut slot = self.in_flight.lock();
            match slot.as_ref() {
                Some(existing) => {
                    debug!("Joining in-flight token refresh");
                    existing.clone()
                }
                None => {
                    let credentials = self.session.current();
                    if let Some(current) = credentials.access_token {
                        if stale != Some(&current) {
                            debug!("Access token already replaced, skipping refresh");
                            return Ok(current);
                        }
                    }
                    let refresh_token = credentials
                        .refresh_token
                        .ok_or(RefreshFailure::MissingRefreshToken)?;
                    let refresh = self.start(refresh_token);
                    *slot = Some(refresh.clone());
                    refresh
                }
            }
        };

        refresh.await
    }

    /// Unconditionally exchange the current refresh token, joining any
    /// in-flight refresh
    pub async fn refresh(&self) -> RefreshResult {
        let refresh = {
            let mut slot = self.in_flight.lock();
            match slot.as_ref() {
                Some(existing) => existing.clone(),
                None => {
                    let refresh_token = self
                        .session
                        .refresh_token()
                        .ok_or(RefreshFailure::MissingRefreshToken)?;
                    let refresh = self.start(refresh_token);
                    *slot = Some(refresh.clone());
                    refresh
                }
            }
        };

        refresh.await
    }

    fn start(&self, refresh_token: Token) -> InFlightRefresh {
        let http_client = self.http_client.clone();
        let refresh_url = self.refresh_url.clone();
        let session = self.session.clone();
        let in_flight = self.in_flight.clone();
        let refresh_count = self.refresh_count.clone();

        async move {
            refresh_count.fetch_add(1, Ordering::Relaxed);
            let result = request_token(&http_client, &refresh_url, &refresh_token).await;

            match &result {
                Ok(response) => {
                    let access = Token::new(response.access_token.clone());
                    if let Err(e) = session.set_access_token(access) {
                        warn!(error = %e, "Refreshed access token could not be persisted");
                    }
                    if let Some(rotated) = &response.refresh_token {
                        if let Err(e) = session.set_refresh_token(Token::new(rotated.clone())) {
                            warn!(error = %e, "Rotated refresh token could not be persisted");
                        }
                    }
                    info!("Access token refreshed");
                }
                Err(failure) => warn!(reason = %failure, "Access token refresh failed"),
            }

            // The session is updated before the slot is released, so late
            // arrivals see the new token instead of starting another refresh.
            *in_flight.lock() = None;

            result.map(|response| Token::new(response.access_token))
        }
        .boxed()
        .shared()
    }
}

async fn request_token(
    http_client: &reqwest::Client,
    refresh_url: &str,
    refresh_token: &Token,
) -> std::result::Result<RefreshResponse, RefreshFailure> {
    let response = http_client
        .post(refresh_url)
        .bearer_auth(refresh_token.as_str())
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .send()
        .await
        .map_err(|e| RefreshFailure::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(RefreshFailure::Rejected(status.as_u16()));
    }

    let body: RefreshResponse = response
        .json()
        .await
        .map_err(|e| RefreshFailure::InvalidResponse(e.to_string()))?;
    if body.access_token.is_empty() {
        return Err(RefreshFailure::InvalidResponse("empty accessToken".into()));
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn coordinator(server: &MockServer, session: Arc<Session>) -> RefreshCoordinator {
        RefreshCoordinator::new(
            reqwest::Client::new(),
            format!("{}/api/auth/refresh", server.uri()),
            session,
        )
    }

    #[tokio::test]
    async fn test_refresh_stores_new_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .and(header("Authorization", "Bearer r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "accessToken": "a2",
                "expiresIn": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = Arc::new(Session::in_memory());
        session.set_tokens("a1".into(), "r1".into()).unwrap();
        let refresher = coordinator(&server, session.clone());

        let token = refresher.refresh_after(Some(&Token::new("a1"))).await.unwrap();

        assert_eq!(token, Token::new("a2"));
        assert_eq!(session.access_token(), Some(Token::new("a2")));
        assert_eq!(session.refresh_token(), Some(Token::new("r1")));
        assert_eq!(refresher.refresh_count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_refresh_leaves_session_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": "invalid_user",
                "message": "User not found or inactive"
            })))
            .mount(&server)
            .await;

        let session = Arc::new(Session::in_memory());
        session.set_tokens("a1".into(), "r1".into()).unwrap();
        let refresher = coordinator(&server, session.clone());

        let result = refresher.refresh_after(Some(&Token::new("a1"))).await;

        assert_eq!(result, Err(RefreshFailure::Rejected(401)));
        assert_eq!(session.access_token(), Some(Token::new("a1")));
        assert_eq!(session.refresh_token(), Some(Token::new("r1")));
    }

    #[tokio::test]
    async fn test_replaced_token_skips_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let session = Arc::new(Session::in_memory());
        session.set_tokens("a2".into(), "r1".into()).unwrap();
        let refresher = coordinator(&server, session);

        let token = refresher.refresh_after(Some(&Token::new("a1"))).await.unwrap();
        assert_eq!(token, Token::new("a2"));
        assert_eq!(refresher.refresh_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_refresh_token() {
        let server = MockServer::start().await;
        let session = Arc::new(Session::in_memory());
        session.set_access_token("a1".into()).unwrap();
        let refresher = coordinator(&server, session);

        let result = refresher.refresh_after(Some(&Token::new("a1"))).await;
        assert_eq!(result, Err(RefreshFailure::MissingRefreshToken));
    }

    #[tokio::test]
    async fn test_rotated_refresh_token_is_stored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "accessToken": "a2",
                "refreshToken": "r2"
            })))
            .mount(&server)
            .await;

        let session = Arc::new(Session::in_memory());
        session.set_tokens("a1".into(), "r1".into()).unwrap();
        let refresher = coordinator(&server, session.clone());

        refresher.refresh().await.unwrap();
        assert_eq!(session.refresh_token(), Some(Token::new("r2")));
    }
}
