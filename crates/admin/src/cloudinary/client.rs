//! Cloudinary upload API client.
//!
//! Uploads are unsigned (an upload preset) unless an API secret is
//! configured, in which case requests carry a SHA-256 signature.

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use tracing::{debug, error, instrument};

use super::error::CloudinaryError;
use super::types::{ErrorResponse, ImageUpload, UploadResponse};
use crate::config::CloudinaryConfig;

/// Cloudinary API base URL.
const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Client for the image upload endpoint.
#[derive(Clone)]
pub struct CloudinaryClient {
    client: Client,
    endpoint: String,
    upload_preset: Option<String>,
    api_key: Option<String>,
    api_secret: Option<SecretString>,
    folder: Option<String>,
}

impl std::fmt::Debug for CloudinaryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryClient")
            .field("endpoint", &self.endpoint)
            .field("upload_preset", &self.upload_preset)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl CloudinaryClient {
    #[must_use]
    pub fn new(config: &CloudinaryConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{CLOUDINARY_API_BASE}/{}/image/upload", config.cloud_name),
            upload_preset: config.upload_preset.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            folder: config.folder.clone(),
        }
    }

    /// Send uploads to another endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Whether uploads are signed with the API secret.
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        self.api_key.is_some() && self.api_secret.is_some()
    }

    /// Validate and upload an image.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any request is made, or an error if
    /// the request fails or Cloudinary rejects the upload.
    #[instrument(skip(self, upload), fields(file_name = %upload.file_name, size = upload.bytes.len()))]
    pub async fn upload_image(&self, upload: ImageUpload) -> Result<UploadResponse, CloudinaryError> {
        upload.validate()?;

        let part = Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)
            .map_err(|e| CloudinaryError::UnsupportedType(e.to_string()))?;

        let mut form = Form::new().part("file", part);
        for (name, value) in self.form_fields(chrono::Utc::now().timestamp()) {
            form = form.text(name, value);
        }

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CloudinaryError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map_or_else(|_| body.chars().take(200).collect(), |e| e.error.message);
            error!(status = status.as_u16(), %message, "Cloudinary rejected upload");
            return Err(CloudinaryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| CloudinaryError::Response(e.to_string()))?;

        debug!(public_id = %uploaded.public_id, "Image uploaded");
        Ok(uploaded)
    }

    /// Text fields sent alongside the file.
    fn form_fields(&self, timestamp: i64) -> Vec<(&'static str, String)> {
        let mut params: Vec<(&'static str, String)> = Vec::new();
        if let Some(folder) = &self.folder {
            params.push(("folder", folder.clone()));
        }
        if let Some(preset) = &self.upload_preset {
            params.push(("upload_preset", preset.clone()));
        }

        if let (Some(api_key), Some(secret)) = (&self.api_key, &self.api_secret) {
            params.push(("timestamp", timestamp.to_string()));
            let signature = sign(&params, secret);
            params.push(("api_key", api_key.clone()));
            params.push(("signature", signature));
            params.push(("signature_algorithm", "sha256".to_string()));
        }
        params
    }
}

/// Request signature: the parameters sorted by name, joined as
/// `a=1&b=2`, followed by the API secret, hashed with SHA-256.
fn sign(params: &[(&str, String)], secret: &SecretString) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let payload = sorted
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    hex::encode(Sha256::digest(format!("{payload}{}", secret.expose_secret())))
}
