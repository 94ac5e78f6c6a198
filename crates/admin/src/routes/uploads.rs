//! Image upload endpoint used by the product and settings forms.
//!
//! The browser posts the file here; the handler forwards it to Cloudinary and
//! answers with the hosted URL, which the script writes into the image field.

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::cloudinary::{ImageUpload, optimized_url};
use crate::error::AppError;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Multipart field carrying the image.
pub const FILE_FIELD: &str = "file";

/// Body limit for the upload route: the image cap plus room for the
/// multipart framing.
pub const BODY_LIMIT: usize = crate::cloudinary::MAX_UPLOAD_BYTES + 64 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadedImage {
    pub secure_url: String,
    pub thumbnail_url: String,
}

#[derive(Debug, Serialize)]
struct UploadFailure {
    error: String,
}

/// JSON error body with the status the error maps to.
fn failure(error: &AppError) -> Response {
    let body = UploadFailure {
        error: error.public_message(),
    };
    (error.status(), Json(body)).into_response()
}

async fn read_upload(multipart: &mut Multipart) -> Result<ImageUpload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed upload: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("image").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed upload: {e}")))?;
        return Ok(ImageUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    Err(AppError::BadRequest(format!(
        "Missing \"{FILE_FIELD}\" field"
    )))
}

/// Upload an image to Cloudinary.
#[instrument(skip_all, fields(admin = %admin.email))]
pub async fn upload_image(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Response {
    let Some(client) = state.cloudinary() else {
        return failure(&AppError::BadRequest(
            "Image uploads are not configured".to_string(),
        ));
    };

    let upload = match read_upload(&mut multipart).await {
        Ok(upload) => upload,
        Err(e) => {
            warn!(error = %e, "Rejected upload");
            return failure(&e);
        }
    };

    match client.upload_image(upload).await {
        Ok(uploaded) => {
            info!(public_id = %uploaded.public_id, "Image uploaded");
            let body = UploadedImage {
                thumbnail_url: optimized_url(&uploaded.secure_url, 300, 300),
                secure_url: uploaded.secure_url,
            };
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(e) => {
            let error = AppError::Upload(e);
            if error.status().is_server_error() {
                tracing::error!(error = %error, "Image upload failed");
            } else {
                warn!(error = %error, "Image rejected");
            }
            failure(&error)
        }
    }
}
