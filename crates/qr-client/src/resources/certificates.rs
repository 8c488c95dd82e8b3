use super::{FilterSpec, ResourceAdapter};
use crate::error::{Error, Result};
use crate::request::RequestDescriptor;
use qr_common::Certificate;
use serde_json::Value;

const FILTERS: &[FilterSpec] = &[
    FilterSpec::text("search"),
    // Issued within the last N days
    FilterSpec::discrete("date"),
];

/// Issued certificates. Certificates are generated from completed
/// assessments and are otherwise read-only.
#[derive(Debug, Clone, Copy, Default)]
pub struct CertificatesAdapter;

impl CertificatesAdapter {
    pub fn generate_request(&self, assessment_id: &str) -> RequestDescriptor {
        RequestDescriptor::post(format!("/api/certificates/generate/{}", assessment_id))
    }

    pub fn download_request(&self, assessment_id: &str) -> RequestDescriptor {
        RequestDescriptor::get(format!("/api/certificates/download/{}", assessment_id))
    }
}

impl ResourceAdapter for CertificatesAdapter {
    type Entity = Certificate;

    fn resource(&self) -> &'static str {
        "certificates"
    }

    fn entity_name(&self) -> &'static str {
        "certificate"
    }

    fn collection_path(&self) -> String {
        "/api/admin/certificates".to_string()
    }

    /// Looked up through the public verification endpoint
    fn entity_path(&self, id: &str) -> String {
        format!("/api/certificates/verify/{}", id)
    }

    fn filters(&self) -> &'static [FilterSpec] {
        FILTERS
    }

    fn create_request(&self, _body: Value) -> Result<RequestDescriptor> {
        Err(Error::Unsupported(
            "certificates are generated from a completed assessment".into(),
        ))
    }

    fn update_request(&self, _id: &str, _body: Value) -> Result<RequestDescriptor> {
        Err(Error::Unsupported("certificates are immutable".into()))
    }
}
