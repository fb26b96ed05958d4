use std::path::{Path, PathBuf};

use actix_files::NamedFile;
use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use futures_util::TryStreamExt;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::config::AppConfig;
use crate::errors::ApiError;
use crate::models::{ApiResponse, UploadResponse};

const MAX_FILE_BYTES: usize = 5 * 1024 * 1024;
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];
const PROOF_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png"];

fn extension_of(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

// Both routes are registered at the application root, outside the
// versioned API scope, so the stored paths resolve as returned.
fn image_url(stored_name: &str) -> String {
    format!("/uploads/{stored_name}")
}

fn proof_url(stored_name: &str) -> String {
    format!("/download/{stored_name}")
}

/// Multipart upload. `image` fields land in the public image directory,
/// `proof` fields in the admin-only proof directory. Files are renamed to
/// a fresh UUID so a client-supplied name never touches the filesystem.
#[post("/upload")]
pub async fn upload_files(
    config: web::Data<AppConfig>,
    _caller: AuthenticatedUser,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let image_dir = PathBuf::from(&config.upload_dir).join("images");
    let proof_dir = PathBuf::from(&config.upload_dir).join("proofs");
    for dir in [&image_dir, &proof_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ApiError::Internal(format!("upload dir unavailable: {e}")))?;
    }

    let mut stored = UploadResponse::default();

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ApiError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        let (allowed, dir): (&[&str], &PathBuf) = match field_name.as_str() {
            "image" => (IMAGE_EXTENSIONS, &image_dir),
            "proof" => (PROOF_EXTENSIONS, &proof_dir),
            _ => {
                return Err(ApiError::Validation(format!(
                    "Unexpected multipart field '{field_name}'"
                )))
            }
        };

        let original = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();
        let extension = extension_of(&original)
            .filter(|ext| allowed.contains(&ext.as_str()))
            .ok_or_else(|| {
                ApiError::Validation(format!("Unsupported file type for '{field_name}'"))
            })?;

        let stored_name = format!("{}.{extension}", Uuid::new_v4());
        let path = dir.join(&stored_name);
        let mut file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| ApiError::Internal(format!("could not store upload: {e}")))?;

        let mut written = 0usize;
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| ApiError::Validation(format!("Upload stream error: {e}")))?
        {
            written += chunk.len();
            if written > MAX_FILE_BYTES {
                drop(file);
                let _ = tokio::fs::remove_file(&path).await;
                return Err(ApiError::Validation(
                    "File exceeds the 5 MB upload limit".into(),
                ));
            }
            file.write_all(&chunk)
                .await
                .map_err(|e| ApiError::Internal(format!("could not store upload: {e}")))?;
        }

        match field_name.as_str() {
            "image" => stored.images.push(image_url(&stored_name)),
            _ => stored.proofs.push(proof_url(&stored_name)),
        }
    }

    if stored.images.is_empty() && stored.proofs.is_empty() {
        return Err(ApiError::Validation("No files were uploaded".into()));
    }

    Ok(HttpResponse::Created().json(ApiResponse::success(stored)))
}

/// Proof-document download for moderators. Only bare filenames are
/// accepted, so the route can never escape the proof directory.
#[get("/download/{filename}")]
pub async fn download_file(
    config: web::Data<AppConfig>,
    caller: AuthenticatedUser,
    req: HttpRequest,
    filename: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    caller.require_admin()?;

    let filename = filename.into_inner();
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(ApiError::Validation("Invalid file name".into()));
    }

    let path = PathBuf::from(&config.upload_dir)
        .join("proofs")
        .join(&filename);
    let file = NamedFile::open(path).map_err(|_| ApiError::NotFound("File not found".into()))?;

    Ok(file.into_response(&req))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_paths_match_root_level_routes() {
        assert_eq!(image_url("a.png"), "/uploads/a.png");
        assert_eq!(proof_url("b.pdf"), "/download/b.pdf");
    }

    #[test]
    fn extension_is_lowercased_and_optional() {
        assert_eq!(extension_of("proof.PDF").as_deref(), Some("pdf"));
        assert_eq!(extension_of("photo.jpeg").as_deref(), Some("jpeg"));
        assert_eq!(extension_of("no_extension"), None);
    }
}
