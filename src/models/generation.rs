//! Domain models for the image-generation workflow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a generation job.
///
/// A job is `Created` by a successful upload and transitions to `Completed`
/// or `Failed` when the process call resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Created,
    Completed,
    Failed,
}

/// One unit of the backend's image-processing workflow, identified by an
/// opaque id. The id is immutable once assigned by the upload call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationJob {
    pub id: String,
    pub status: GenerationStatus,
    #[serde(rename = "car_image_url", default)]
    pub car_image_ref: Option<String>,
    #[serde(rename = "rim_image_url", default)]
    pub rim_image_ref: Option<String>,
    #[serde(rename = "processed_image_url", default)]
    pub result_ref: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// An image supplied to the upload phase of the workflow.
///
/// Bytes are owned so a request rejected for authorization reasons can be
/// rebuilt and replayed after a token refresh.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageAsset {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// An asset with no bytes is treated as absent and rejected locally
    /// before any network round trip.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
