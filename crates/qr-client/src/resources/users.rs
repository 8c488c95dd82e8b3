use super::{FilterSpec, ResourceAdapter};
use crate::error::{Error, Result};
use crate::request::RequestDescriptor;
use crate::validation::{require, validate_email, validate_password};
use qr_common::User;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const FILTERS: &[FilterSpec] = &[
    FilterSpec::text("search"),
    FilterSpec::discrete("status"),
    FilterSpec::discrete("industry"),
];

/// Platform users, as seen from the admin console
#[derive(Debug, Clone, Copy, Default)]
pub struct UsersAdapter;

impl UsersAdapter {
    /// Activate or deactivate an account
    pub fn toggle_status_request(&self, id: &str) -> RequestDescriptor {
        RequestDescriptor::post(format!("{}/toggle-status", self.entity_path(id)))
    }
}

impl ResourceAdapter for UsersAdapter {
    type Entity = User;

    fn resource(&self) -> &'static str {
        "users"
    }

    fn entity_name(&self) -> &'static str {
        "user"
    }

    fn collection_path(&self) -> String {
        "/api/admin/users".to_string()
    }

    fn entity_path(&self, id: &str) -> String {
        format!("/api/admin/users/{}", id)
    }

    fn filters(&self) -> &'static [FilterSpec] {
        FILTERS
    }

    /// Accounts are created through self-registration
    fn create_request(&self, body: Value) -> Result<RequestDescriptor> {
        let registration: RegistrationRequest = serde_json::from_value(body)
            .map_err(|e| Error::Validation(format!("Invalid registration: {}", e)))?;
        registration.validate()?;
        RequestDescriptor::post("/api/auth/register")
            .public()
            .with_json(&registration)
    }

    fn update_request(&self, _id: &str, _body: Value) -> Result<RequestDescriptor> {
        Err(Error::Unsupported(
            "users edit their own profile; admins can only toggle status".into(),
        ))
    }
}

/// Self-registration form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub organization_name: String,
    pub industry: String,
    pub role: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl RegistrationRequest {
    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        require("First name", &self.first_name)?;
        require("Last name", &self.last_name)?;
        require("Organization name", &self.organization_name)?;
        require("Industry", &self.industry)?;
        require("Role", &self.role)?;
        require("Country", &self.country)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    fn registration() -> Value {
        json!({
            "email": "ada@example.com",
            "password": "Sup3rSecret",
            "firstName": "Ada",
            "lastName": "Lovelace",
            "organizationName": "Analytical Engines",
            "industry": "technology",
            "role": "CTO",
            "country": "UK"
        })
    }

    #[test]
    fn test_create_is_public_registration() {
        let request = UsersAdapter.create_request(registration()).unwrap();
        assert_eq!(request.path, "/api/auth/register");
        assert!(!request.requires_auth);
        assert_eq!(request.body.as_ref().and_then(|b| b.get("firstName")), Some(&json!("Ada")));
        assert!(request.body.as_ref().and_then(|b| b.get("phone")).is_none());
    }

    #[test]
    fn test_create_validates_before_sending() {
        let mut body = registration();
        body["password"] = json!("weak");
        let err = UsersAdapter.create_request(body).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);

        let mut body = registration();
        body["country"] = json!("");
        assert!(UsersAdapter.create_request(body).is_err());
    }

    #[test]
    fn test_update_is_unsupported() {
        let err = UsersAdapter.update_request("u-1", json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn test_toggle_status_path() {
        let request = UsersAdapter.toggle_status_request("u-1");
        assert_eq!(request.path, "/api/admin/users/u-1/toggle-status");
        assert_eq!(request.method, reqwest::Method::POST);
    }
}
