//! The endpoint for uploading images, e.g. avatars and receipt photos.

use std::path::{Path, PathBuf};

use axum::{
    Json,
    extract::{
        FromRef, Multipart, State,
        multipart::{Field, MultipartRejection},
    },
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{AppState, Error, endpoints};

/// The largest request body accepted by the upload endpoint.
pub const UPLOAD_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// The name of the multipart field holding the file.
const FILE_FIELD: &str = "file";

/// The accepted image formats: content type, stored file extension and the
/// bytes every file of that format starts with.
const IMAGE_FORMATS: [(&str, &str, &[u8]); 5] = [
    ("image/png", "png", b"\x89PNG\r\n\x1a\n"),
    ("image/jpeg", "jpg", b"\xff\xd8\xff"),
    ("image/gif", "gif", b"GIF87a"),
    ("image/gif", "gif", b"GIF89a"),
    ("image/webp", "webp", b"RIFF"),
];

/// The state needed to store uploaded files.
#[derive(Debug, Clone)]
pub struct UploadState {
    /// The directory that uploaded files are saved to.
    pub upload_dir: PathBuf,
}

impl FromRef<AppState> for UploadState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            upload_dir: state.upload_dir.clone(),
        }
    }
}

/// Where an uploaded file can be downloaded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// The path of the stored file, e.g. "/uploads/<sha256>.png".
    pub url: String,
}

/// Save the image in the `file` field of a multipart form.
///
/// Only PNG, JPEG, GIF and WebP images are accepted. Both the declared content
/// type and the leading bytes of the file must match one of these formats.
/// The file is named after the SHA-256 digest of its contents plus the
/// extension of its format, so uploading the same image twice gives the same
/// URL. The client's file name is never used.
///
/// # Errors
///
/// Responds with 400 if the body is not a multipart form, there is no `file`
/// field or the file is not an accepted image.
pub async fn upload_file(
    State(state): State<UploadState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, Error> {
    let mut multipart = multipart?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| Error::MultipartError(error.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let (extension, data) = read_image_field(field).await?;
        let file_name = content_addressed_name(&data, extension);
        save_file(&state.upload_dir, &file_name, &data).await?;

        tracing::info!("Saved upload {file_name} ({} bytes)", data.len());

        return Ok(Json(UploadResponse {
            url: format!("{}/{file_name}", endpoints::UPLOADS),
        }));
    }

    Err(Error::MissingFile)
}

async fn read_image_field(field: Field<'_>) -> Result<(&'static str, Vec<u8>), Error> {
    let content_type = match field.content_type() {
        Some(content_type) if content_type.starts_with("image/") => content_type.to_owned(),
        _ => return Err(Error::NotAnImage),
    };

    let data = field
        .bytes()
        .await
        .map_err(|error| Error::MultipartError(error.body_text()))?;

    if data.is_empty() {
        return Err(Error::MissingFile);
    }

    let extension = image_extension(&content_type, &data).ok_or_else(|| {
        tracing::debug!("Rejected upload declared as {content_type}");
        Error::NotAnImage
    })?;

    Ok((extension, data.to_vec()))
}

/// The file extension for an image declared as `content_type` whose contents are `data`.
///
/// Returns `None` if `content_type` is not an accepted format or `data` is not
/// a file of that format.
fn image_extension(content_type: &str, data: &[u8]) -> Option<&'static str> {
    let content_type = content_type.trim().to_ascii_lowercase();

    IMAGE_FORMATS
        .iter()
        .find(|(format_type, _, magic)| {
            *format_type == content_type
                && data.starts_with(magic)
                // A WebP file is a RIFF container tagged "WEBP" at bytes 8..12.
                && (*format_type != "image/webp" || data.get(8..12) == Some(b"WEBP".as_slice()))
        })
        .map(|(_, extension, _)| *extension)
}

fn content_addressed_name(data: &[u8], extension: &str) -> String {
    format!("{:x}.{extension}", Sha256::digest(data))
}

async fn save_file(upload_dir: &Path, file_name: &str, data: &[u8]) -> Result<(), Error> {
    tokio::fs::create_dir_all(upload_dir).await.map_err(|error| {
        tracing::error!("Could not create upload directory {upload_dir:?}: {error}");
        Error::FileSystemError(error.to_string())
    })?;

    let path = upload_dir.join(file_name);
    tokio::fs::write(&path, data).await.map_err(|error| {
        tracing::error!("Could not write upload to {path:?}: {error}");
        Error::FileSystemError(error.to_string())
    })
}
