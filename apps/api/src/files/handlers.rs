//! Axum handlers for document upload.

use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::repo;
use crate::models::file::{FileKind, FileRow};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub cv_id: Uuid,
    pub report_id: Uuid,
}

/// POST /upload
///
/// Multipart form with two required file fields, `cv` and `report`. Both
/// are stored to S3 under a fresh UUID key and recorded as immutable file
/// rows; the response carries the ids to pass to `POST /evaluate`.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut cv: Option<(String, Bytes)> = None;
    let mut report: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read field '{name}': {e}")))?;

        match name.as_str() {
            "cv" => cv = Some((file_name, data)),
            "report" => report = Some((file_name, data)),
            _ => {} // unknown fields are ignored
        }
    }

    let (cv_name, cv_bytes) =
        cv.ok_or_else(|| AppError::Validation("Missing file field 'cv'".to_string()))?;
    let (report_name, report_bytes) =
        report.ok_or_else(|| AppError::Validation("Missing file field 'report'".to_string()))?;

    if cv_bytes.is_empty() {
        return Err(AppError::Validation("'cv' file is empty".to_string()));
    }
    if report_bytes.is_empty() {
        return Err(AppError::Validation("'report' file is empty".to_string()));
    }

    let cv_row = store_file(&state, FileKind::Cv, &cv_name, &cv_bytes).await?;
    let report_row = store_file(&state, FileKind::Report, &report_name, &report_bytes).await?;

    info!(
        "Uploaded cv={} ({} bytes) report={} ({} bytes)",
        cv_row.id,
        cv_bytes.len(),
        report_row.id,
        report_bytes.len()
    );

    Ok(Json(UploadResponse {
        cv_id: cv_row.id,
        report_id: report_row.id,
    }))
}

async fn store_file(
    state: &AppState,
    kind: FileKind,
    original_name: &str,
    data: &Bytes,
) -> Result<FileRow, AppError> {
    let key = format!("uploads/{}{}", Uuid::new_v4(), extension_of(original_name));

    state
        .s3
        .put_object()
        .bucket(&state.config.s3_bucket)
        .key(&key)
        .body(data.to_vec().into())
        .send()
        .await
        .map_err(|e| AppError::S3(format!("Failed to store {}: {e}", kind.as_str())))?;

    let row = repo::create_file(&state.db, kind, original_name, &key).await?;
    Ok(row)
}

/// Returns the original file extension including the dot, or "".
fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => format!(".{ext}"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of_pdf() {
        assert_eq!(extension_of("resume.pdf"), ".pdf");
    }

    #[test]
    fn test_extension_of_multi_dot() {
        assert_eq!(extension_of("my.resume.final.PDF"), ".PDF");
    }

    #[test]
    fn test_extension_of_none() {
        assert_eq!(extension_of("resume"), "");
        assert_eq!(extension_of(".hidden"), "");
    }
}
