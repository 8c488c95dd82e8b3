use super::{FilterSpec, ResourceAdapter};
use crate::error::Result;
use crate::request::RequestDescriptor;
use crate::validation::require;
use qr_common::Assessment;
use serde_json::Value;

const FILTERS: &[FilterSpec] = &[
    FilterSpec::text("search"),
    FilterSpec::discrete("status"),
    FilterSpec::discrete("risk_level"),
];

/// Output format of an assessment report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Pdf,
}

impl ReportFormat {
    fn as_str(self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Pdf => "pdf",
        }
    }
}

/// Compliance assessments. Listing goes through the admin endpoint, single
/// assessments through the owner endpoints.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssessmentsAdapter;

impl AssessmentsAdapter {
    /// Fetch an assessment together with its control responses
    pub fn get_with_responses_request(&self, id: &str) -> RequestDescriptor {
        self.get_request(id).with_query("include_responses", "true")
    }

    pub fn advance_stage_request(&self, id: &str) -> RequestDescriptor {
        RequestDescriptor::post(format!("{}/advance-stage", self.entity_path(id)))
    }

    pub fn calculate_score_request(&self, id: &str) -> RequestDescriptor {
        RequestDescriptor::post(format!("{}/calculate-score", self.entity_path(id)))
    }

    /// Record answers for one control
    pub fn submit_response_request(&self, id: &str, response: Value) -> RequestDescriptor {
        RequestDescriptor::put(format!("{}/responses", self.entity_path(id))).with_body(response)
    }

    pub fn report_request(&self, id: &str, format: ReportFormat, report_type: &str) -> RequestDescriptor {
        RequestDescriptor::get(format!("{}/report", self.entity_path(id)))
            .with_query("format", format.as_str())
            .with_query("type", report_type)
    }

    /// ISO 42001 control catalogue, optionally for one stage
    pub fn controls_request(&self, stage: Option<u8>) -> RequestDescriptor {
        let request = RequestDescriptor::get("/api/assessments/controls");
        match stage {
            Some(stage) => request.with_query("stage", stage.to_string()),
            None => request,
        }
    }
}

impl ResourceAdapter for AssessmentsAdapter {
    type Entity = Assessment;

    fn resource(&self) -> &'static str {
        "assessments"
    }

    fn entity_name(&self) -> &'static str {
        "assessment"
    }

    fn collection_path(&self) -> String {
        "/api/admin/assessments".to_string()
    }

    fn entity_path(&self, id: &str) -> String {
        format!("/api/assessments/{}", id)
    }

    fn filters(&self) -> &'static [FilterSpec] {
        FILTERS
    }

    fn create_request(&self, body: Value) -> Result<RequestDescriptor> {
        let name = body
            .get("assessmentName")
            .or_else(|| body.get("assessment_name"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        require("Assessment name", name)?;
        Ok(RequestDescriptor::post("/api/assessments").with_body(body))
    }
}
