//! Entity models as returned by the compliance platform API.
//!
//! Timestamps are serialized by the platform without a UTC offset, so they
//! are modelled as [`NaiveDateTime`] values in UTC.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Platform user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub organization_name: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// "user" or "admin"
    #[serde(default = "default_user_role")]
    pub user_role: String,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub last_login: Option<NaiveDateTime>,
    /// Only present on admin listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment_count: Option<u32>,
}

impl User {
    /// Display name, preferring the server-computed full name
    pub fn display_name(&self) -> String {
        match &self.full_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("{} {}", self.first_name, self.last_name).trim().to_string(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.user_role == "admin"
    }
}

/// The profile cached alongside the session credentials.
pub type UserProfile = User;

fn default_true() -> bool {
    true
}

fn default_user_role() -> String {
    "user".to_string()
}

/// Per-stage completion percentages of an assessment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentProgress {
    pub overall: f64,
    pub stage_1: f64,
    pub stage_2: f64,
    pub stage_3: f64,
    pub stage_4: f64,
}

/// ISO 42001 readiness assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub assessment_name: String,
    #[serde(default)]
    pub organization_name: String,
    #[serde(default)]
    pub ai_system_description: Option<String>,
    #[serde(default)]
    pub industry: String,
    /// "low", "medium", "high" or "critical"
    #[serde(default)]
    pub risk_level: String,
    /// "draft", "in_progress" or "completed"
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub current_stage: u8,
    #[serde(default)]
    pub progress: AssessmentProgress,
    #[serde(default)]
    pub certificate_generated: bool,
    #[serde(default)]
    pub certificate_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub completed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub response_count: u32,
    #[serde(default)]
    pub file_count: u32,
}

impl Assessment {
    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }
}

/// Issued compliance certificate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub assessment_id: String,
    pub certificate_id: String,
    #[serde(default)]
    pub organization_name: String,
    #[serde(default)]
    pub ai_system_name: Option<String>,
    #[serde(default)]
    pub compliance_score: Option<f64>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub issued_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub valid_until: Option<NaiveDateTime>,
    #[serde(default)]
    pub status: String,
}

/// Evidence file attached to an assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub assessment_id: String,
    #[serde(default)]
    pub user_id: String,
    pub original_filename: String,
    #[serde(default)]
    pub file_size: u64,
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub control_id: Option<String>,
    #[serde(default)]
    pub stage: Option<String>,
    /// "pending", "clean" or "infected"
    #[serde(default)]
    pub scan_status: String,
    #[serde(default)]
    pub is_processed: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub file_metadata: serde_json::Value,
    #[serde(default)]
    pub uploaded_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub processed_at: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_from_admin_listing() {
        let user: User = serde_json::from_value(json!({
            "id": "u-1",
            "email": "ada@example.com",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "full_name": "Ada Lovelace",
            "organization_name": "Analytical Engines",
            "industry": "technology",
            "role": "CTO",
            "is_verified": true,
            "is_active": false,
            "user_role": "admin",
            "created_at": "2024-03-01T09:30:00.123456",
            "last_login": null,
            "assessment_count": 3
        }))
        .unwrap();

        assert_eq!(user.display_name(), "Ada Lovelace");
        assert!(user.is_admin());
        assert!(!user.is_active);
        assert_eq!(user.assessment_count, Some(3));
        assert!(user.created_at.is_some());
        assert!(user.last_login.is_none());
    }

    #[test]
    fn test_user_defaults_for_sparse_payload() {
        let user: User = serde_json::from_value(json!({
            "id": "u-2",
            "email": "bob@example.com",
            "first_name": "Bob",
            "last_name": "Stone"
        }))
        .unwrap();

        assert!(user.is_active);
        assert_eq!(user.user_role, "user");
        assert_eq!(user.display_name(), "Bob Stone");
    }

    #[test]
    fn test_assessment_progress() {
        let assessment: Assessment = serde_json::from_value(json!({
            "id": "a-1",
            "assessment_name": "Chatbot review",
            "status": "completed",
            "risk_level": "high",
            "current_stage": 4,
            "progress": {"overall": 87.5, "stage_1": 100.0}
        }))
        .unwrap();

        assert!(assessment.is_completed());
        assert_eq!(assessment.progress.overall, 87.5);
        assert_eq!(assessment.progress.stage_2, 0.0);
    }

    #[test]
    fn test_certificate_camel_case() {
        let cert: Certificate = serde_json::from_value(json!({
            "assessmentId": "a-1",
            "certificateId": "QRY-2024-0001",
            "organizationName": "Acme",
            "complianceScore": 81.0,
            "issuedDate": "2024-05-01T00:00:00",
            "validUntil": "2025-05-01T00:00:00",
            "status": "Valid"
        }))
        .unwrap();

        assert_eq!(cert.certificate_id, "QRY-2024-0001");
        assert_eq!(cert.compliance_score, Some(81.0));
        assert!(cert.valid_until > cert.issued_date);
    }
}
