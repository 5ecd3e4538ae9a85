use std::sync::Arc;

use serde_json::Value;

use crate::{
    api::{ApiClient, ApiRequest, MultipartForm},
    config::UploadStrategy,
    errors::{AppError, AppResult},
    models::dto::{
        request::{PresignedUploadRequest, ProcessUploadRequest},
        response::{PresignedUpload, UploadOutcome},
    },
};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
const PDF_MAGIC: &[u8] = b"%PDF-";

/// An exam paper waiting to be ingested.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PdfUpload {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl PdfUpload {
    pub fn new(file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            data,
        }
    }

    pub fn validate(&self, max_bytes: usize) -> AppResult<()> {
        if self.data.is_empty() {
            return Err(AppError::ValidationError("File is empty".to_string()));
        }
        if self.data.len() > max_bytes {
            return Err(AppError::ValidationError(format!(
                "File is {} bytes; the limit is {}",
                self.data.len(),
                max_bytes
            )));
        }

        let named_pdf = self.file_name.to_ascii_lowercase().ends_with(".pdf");
        if !named_pdf && !self.data.starts_with(PDF_MAGIC) {
            return Err(AppError::ValidationError(format!(
                "'{}' is not a PDF file",
                self.file_name
            )));
        }
        Ok(())
    }
}

/// Sends exam PDFs for server-side processing.
pub struct UploadService {
    client: Arc<ApiClient>,
    strategy: UploadStrategy,
    max_bytes: usize,
}

impl UploadService {
    pub fn new(client: Arc<ApiClient>, strategy: UploadStrategy, max_bytes: usize) -> Self {
        Self {
            client,
            strategy,
            max_bytes,
        }
    }

    pub fn strategy(&self) -> UploadStrategy {
        self.strategy
    }

    pub async fn upload_exam_pdf(&self, subject_id: i64, file: PdfUpload) -> AppResult<UploadOutcome> {
        file.validate(self.max_bytes)?;

        log::info!(
            "Uploading '{}' ({} bytes) for subject {} via {:?}",
            file.file_name,
            file.data.len(),
            subject_id,
            self.strategy
        );

        let response = match self.strategy {
            UploadStrategy::Multipart => self.upload_multipart(subject_id, file).await?,
            UploadStrategy::Presigned => self.upload_presigned(subject_id, file).await?,
        };

        let outcome = UploadOutcome::from_response(response);
        match outcome.exam_id {
            Some(id) => log::info!("Processing created exam {}", id),
            None => log::warn!("Processing response named no exam"),
        }
        Ok(outcome)
    }

    async fn upload_multipart(&self, subject_id: i64, file: PdfUpload) -> AppResult<Value> {
        let form = MultipartForm::new()
            .file("file", file.file_name, PDF_CONTENT_TYPE, file.data)
            .text("subjectId", subject_id.to_string());

        self.client
            .execute(ApiRequest::post("/admin/upload").multipart(form))
            .await
    }

    async fn upload_presigned(&self, subject_id: i64, file: PdfUpload) -> AppResult<Value> {
        let target: PresignedUpload = self
            .client
            .post(
                "/admin/upload/presigned-url",
                &PresignedUploadRequest {
                    file_name: file.file_name.clone(),
                    content_type: PDF_CONTENT_TYPE.to_string(),
                    subject_id,
                },
            )
            .await?;

        self.client
            .transfer(&target.upload_url, file.data, PDF_CONTENT_TYPE)
            .await?;

        self.client
            .post(
                "/admin/upload/process",
                &ProcessUploadRequest {
                    key: target.key,
                    subject_id,
                },
            )
            .await
    }
}
