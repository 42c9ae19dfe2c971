//! Character portrait uploads, stored on disk and served back under `/uploads`.

use std::path::{Path, PathBuf};

use axum::{
    Json, Router, debug_handler,
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tower_http::services::ServeDir;
use tracing::info;

use crate::{AppError, AppResult, AppState};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
pub const CHARACTERS_DIR: &str = "characters";

/// Multipart framing on top of the image itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub image_url: String,
}

#[derive(Debug, Clone)]
pub struct UploadDir(pub PathBuf);

pub fn router(upload_dir: &Path) -> Router<AppState> {
    Router::new()
        .route(
            "/api/upload/character-image",
            post(upload_character_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + MULTIPART_OVERHEAD)),
        )
        .nest_service("/uploads", ServeDir::new(upload_dir))
}

/// Maps an accepted image content type to its file extension.
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some(".jpg"),
        "image/png" => Some(".png"),
        "image/gif" => Some(".gif"),
        _ => None,
    }
}

/// Whether a file name extension (lowercase, with dot) is one the content type is served as.
fn extension_fits(content_ext: &str, ext: &str) -> bool {
    ext == content_ext || (content_ext == ".jpg" && ext == ".jpeg")
}

/// `{unix_millis}-{random}{ext}`. The uploaded file's extension is kept only when it
/// agrees with the content type, so a file is never served back as anything but an image.
fn stored_name(original: Option<&str>, content_ext: &str) -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let suffix: u32 = rand::random();

    let ext = original
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .filter(|ext| extension_fits(content_ext, ext))
        .unwrap_or_else(|| content_ext.to_owned());

    format!("{millis}-{suffix}{ext}")
}

#[debug_handler(state = crate::AppState)]
pub async fn upload_character_image(
    State(UploadDir(upload_dir)): State<UploadDir>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::new(e.status(), e))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_owned();
        let Some(content_ext) = image_extension(&content_type) else {
            return Err(AppError::bad_request(
                "invalid file type, only JPEG, PNG and GIF are allowed",
            ));
        };
        let file_name = stored_name(field.file_name(), content_ext);

        let bytes = field.bytes().await.map_err(|e| AppError::new(e.status(), e))?;
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::new(
                axum::http::StatusCode::PAYLOAD_TOO_LARGE,
                anyhow::anyhow!("image exceeds {MAX_IMAGE_BYTES} bytes"),
            ));
        }

        let dir = upload_dir.join(CHARACTERS_DIR);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), &bytes).await?;
        info!(%file_name, size = bytes.len(), "stored character image");

        return Ok(Json(UploadResponse {
            image_url: format!("/uploads/{CHARACTERS_DIR}/{file_name}"),
        }));
    }

    Err(AppError::bad_request("no image was uploaded"))
}
