//! Account operations: registration, email verification, login and profile

use crate::error::{Error, Result};
use crate::gateway::RequestExecutor;
use crate::request::{ApiResponse, RequestDescriptor};
use crate::resources::RegistrationRequest;
use crate::session::{Session, Token};
use crate::validation::{require, validate_email, validate_otp};
use qr_common::UserProfile;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of a registration: the account awaits email verification
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingVerification {
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Token grant returned by login and email verification
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenGrant {
    access_token: Token,
    refresh_token: Token,
    #[serde(default)]
    user: Option<UserProfile>,
}

#[derive(Deserialize)]
struct ProfileEnvelope {
    user: UserProfile,
}

/// Authentication endpoints bound to the shared [`Session`]
#[derive(Clone)]
pub struct AuthApi {
    executor: Arc<dyn RequestExecutor>,
    session: Arc<Session>,
}

impl AuthApi {
    pub fn new(executor: Arc<dyn RequestExecutor>, session: Arc<Session>) -> Self {
        Self { executor, session }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Log in and store the issued credentials and profile
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<UserProfile>> {
        validate_email(email)?;
        require("Password", password)?;

        let request = RequestDescriptor::post("/api/auth/login")
            .public()
            .with_body(json!({ "email": email.trim(), "password": password }));
        let response = self.executor.execute(&request).await?;
        let profile = self.store_grant(&response)?;

        info!(email = email.trim(), "Logged in");
        Ok(profile)
    }

    pub async fn register(&self, registration: &RegistrationRequest) -> Result<PendingVerification> {
        registration.validate()?;
        let request = RequestDescriptor::post("/api/auth/register")
            .public()
            .with_json(registration)?;

        let pending: PendingVerification = self.executor.execute(&request).await?.decode()?;
        info!(user_id = %pending.user_id, "Registration pending email verification");
        Ok(pending)
    }

    /// Confirm the emailed one-time code; a verified account is logged in
    pub async fn verify_email(&self, email: &str, otp_code: &str) -> Result<Option<UserProfile>> {
        validate_email(email)?;
        validate_otp(otp_code)?;

        let request = RequestDescriptor::post("/api/auth/verify-email")
            .public()
            .with_body(json!({ "email": email.trim(), "otpCode": otp_code.trim() }));
        let response = self.executor.execute(&request).await?;
        let profile = self.store_grant(&response)?;

        info!(email = email.trim(), "Email verified");
        Ok(profile)
    }

    pub async fn resend_otp(&self, email: &str) -> Result<()> {
        validate_email(email)?;
        let request = RequestDescriptor::post("/api/auth/resend-otp")
            .public()
            .with_body(json!({ "email": email.trim() }));
        self.executor.execute(&request).await?;
        debug!(email = email.trim(), "Verification code resent");
        Ok(())
    }

    /// Fetch the current user's profile and cache it in the session
    pub async fn profile(&self) -> Result<UserProfile> {
        let envelope: ProfileEnvelope = self
            .executor
            .execute(&RequestDescriptor::get("/api/auth/profile"))
            .await?
            .decode()?;
        self.session.set_user_profile(&envelope.user)?;
        Ok(envelope.user)
    }

    /// Update profile fields; the server ignores fields it does not accept
    pub async fn update_profile(&self, changes: Value) -> Result<UserProfile> {
        if !changes.is_object() {
            return Err(Error::Validation("Profile changes must be an object".into()));
        }
        let request = RequestDescriptor::put("/api/auth/profile").with_body(changes);
        let envelope: ProfileEnvelope = self.executor.execute(&request).await?.decode()?;
        self.session.set_user_profile(&envelope.user)?;
        Ok(envelope.user)
    }

    pub fn logout(&self) -> Result<()> {
        self.session.clear()
    }

    fn store_grant(&self, response: &ApiResponse) -> Result<Option<UserProfile>> {
        let grant: TokenGrant = response.decode()?;
        self.session.set_tokens(grant.access_token, grant.refresh_token)?;
        if let Some(profile) = &grant.user {
            self.session.set_user_profile(profile)?;
        }
        Ok(grant.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use async_trait::async_trait;

    /// Fails every call so tests can prove validation happens first
    struct Unreachable;

    #[async_trait]
    impl RequestExecutor for Unreachable {
        async fn execute(&self, request: &RequestDescriptor) -> Result<ApiResponse> {
            panic!("unexpected request to {}", request.path);
        }
    }

    fn api() -> AuthApi {
        AuthApi::new(Arc::new(Unreachable), Arc::new(Session::in_memory()))
    }

    #[tokio::test]
    async fn test_login_validates_locally() {
        let err = api().login("not-an-email", "secret").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);

        let err = api().login("ada@example.com", "").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[tokio::test]
    async fn test_verify_email_requires_six_digits() {
        let err = api().verify_email("ada@example.com", "12ab").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[tokio::test]
    async fn test_update_profile_requires_object() {
        let err = api().update_profile(json!(["x"])).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }
}
