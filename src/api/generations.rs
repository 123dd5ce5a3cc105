//! Two-phase generation workflow client.
//!
//! Phase one uploads the car and rim images as multipart form data and
//! yields a job id; phase two triggers processing for that id. Failures
//! from either phase reach the caller already normalized into the single
//! error taxonomy.

use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

use crate::models::{GenerationJob, GenerationStatus, ImageAsset};

use super::transport::{AuthenticatedTransport, MultipartPart, RequestSpec};
use super::ApiError;

/// Upload endpoint for the two input images
const UPLOAD_PATH: &str = "/api/generations/upload";

/// Listing endpoint, filtered to finished jobs
const COMPLETED_PATH: &str = "/api/generations?status=completed";

/// Multipart field names expected by the backend
const CAR_FIELD: &str = "car_file";
const RIM_FIELD: &str = "rim_file";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ProcessResponse {
    #[serde(default)]
    processed_image_url: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Clone)]
pub struct GenerationClient {
    transport: AuthenticatedTransport,
}

impl GenerationClient {
    pub fn new(transport: AuthenticatedTransport) -> Self {
        Self { transport }
    }

    /// Upload both input images and create a job.
    ///
    /// Both images are required; an empty asset is rejected locally with a
    /// validation error, no network round trip. Upload is deliberately not
    /// idempotent: the same images uploaded twice create two jobs.
    pub async fn upload(
        &self,
        car: &ImageAsset,
        rim: &ImageAsset,
    ) -> Result<GenerationJob, ApiError> {
        if car.is_empty() {
            return Err(ApiError::Validation(
                "Please upload a car image.".to_string(),
            ));
        }
        if rim.is_empty() {
            return Err(ApiError::Validation(
                "Please upload a rim image.".to_string(),
            ));
        }

        let spec = RequestSpec::post(UPLOAD_PATH)
            .multipart(vec![form_part(CAR_FIELD, car), form_part(RIM_FIELD, rim)]);
        let response = self.transport.request(spec).await?;

        if !response.status.is_success() {
            return Err(ApiError::from_status(response.status, &response.body));
        }

        let parsed: UploadResponse = response.json()?;
        debug!(id = %parsed.id, "Upload accepted");
        Ok(GenerationJob {
            id: parsed.id,
            status: GenerationStatus::Created,
            car_image_ref: None,
            rim_image_ref: None,
            result_ref: None,
            error_message: None,
            created_at: Utc::now(),
        })
    }

    /// Trigger processing for an uploaded job.
    ///
    /// Resolves to a completed job carrying the result URL, or to a failed
    /// job when the backend finished without producing one.
    pub async fn process(&self, job: &GenerationJob) -> Result<GenerationJob, ApiError> {
        let spec = RequestSpec::post(format!("/api/generations/{}/process", job.id));
        let response = self.transport.request(spec).await?;

        if !response.status.is_success() {
            return Err(ApiError::from_status(response.status, &response.body));
        }

        let parsed: ProcessResponse = response.json()?;
        let mut processed = job.clone();
        match parsed.processed_image_url {
            Some(url) => {
                debug!(id = %job.id, "Processing completed");
                processed.status = GenerationStatus::Completed;
                processed.result_ref = Some(url);
            }
            None => {
                debug!(id = %job.id, "Processing reported failure");
                processed.status = GenerationStatus::Failed;
                processed.error_message = Some(
                    parsed
                        .error_message
                        .unwrap_or_else(|| "Processing failed.".to_string()),
                );
            }
        }
        Ok(processed)
    }

    /// Fetch the user's finished jobs (the history gallery reads this).
    pub async fn list_completed(&self) -> Result<Vec<GenerationJob>, ApiError> {
        let response = self.transport.request(RequestSpec::get(COMPLETED_PATH)).await?;

        if !response.status.is_success() {
            return Err(ApiError::from_status(response.status, &response.body));
        }
        response.json()
    }
}

fn form_part(name: &str, asset: &ImageAsset) -> MultipartPart {
    MultipartPart {
        name: name.to_string(),
        file_name: asset.file_name.clone(),
        content_type: asset.content_type.clone(),
        bytes: asset.bytes.clone(),
    }
}
