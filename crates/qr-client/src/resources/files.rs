use super::{FilterSpec, ResourceAdapter};
use crate::error::{Error, Result};
use crate::request::RequestDescriptor;
use qr_common::FileRecord;
use serde_json::Value;

const FILTERS: &[FilterSpec] = &[
    FilterSpec::text("search"),
    FilterSpec::discrete("file_type"),
    FilterSpec::discrete("control_id"),
];

/// Evidence files of one assessment
#[derive(Debug, Clone)]
pub struct FilesAdapter {
    assessment_id: String,
}

impl FilesAdapter {
    pub fn new(assessment_id: impl Into<String>) -> Self {
        Self {
            assessment_id: assessment_id.into(),
        }
    }

    pub fn assessment_id(&self) -> &str {
        &self.assessment_id
    }

    pub fn delete_request(&self, id: &str) -> RequestDescriptor {
        RequestDescriptor::delete(self.entity_path(id))
    }

    pub fn download_request(&self, id: &str) -> RequestDescriptor {
        RequestDescriptor::get(format!("{}/download", self.entity_path(id)))
    }
}

impl ResourceAdapter for FilesAdapter {
    type Entity = FileRecord;

    fn resource(&self) -> &'static str {
        "files"
    }

    fn entity_name(&self) -> &'static str {
        "file"
    }

    fn collection_path(&self) -> String {
        format!("/api/files/assessment/{}", self.assessment_id)
    }

    fn entity_path(&self, id: &str) -> String {
        format!("/api/files/{}", id)
    }

    fn filters(&self) -> &'static [FilterSpec] {
        FILTERS
    }

    fn create_request(&self, _body: Value) -> Result<RequestDescriptor> {
        Err(Error::Unsupported("file upload requires a multipart form".into()))
    }

    /// Only the metadata of a stored file can change
    fn update_request(&self, id: &str, body: Value) -> Result<RequestDescriptor> {
        Ok(RequestDescriptor::put(format!("{}/metadata", self.entity_path(id))).with_body(body))
    }
}
