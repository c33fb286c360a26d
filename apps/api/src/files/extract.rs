//! Document text extraction and S3 object retrieval.

use anyhow::{Context, Result};
use tracing::warn;

/// Extracts plain text from an uploaded document held in memory.
///
/// PDFs (by extension or magic bytes) go through `pdf-extract`; anything
/// else is treated as UTF-8 text. Extraction failure yields an empty
/// string — the pipeline reports empty documents as input errors, so
/// failures surface there with the document named.
pub fn extract_text(original_name: &str, data: &[u8]) -> String {
    let looks_like_pdf =
        original_name.to_ascii_lowercase().ends_with(".pdf") || data.starts_with(b"%PDF");

    if looks_like_pdf {
        match pdf_extract::extract_text_from_mem(data) {
            Ok(text) => text,
            Err(e) => {
                warn!("PDF extraction failed for {original_name}: {e}");
                String::new()
            }
        }
    } else {
        match std::str::from_utf8(data) {
            Ok(text) => text.to_string(),
            Err(_) => {
                warn!("{original_name} is neither a PDF nor valid UTF-8 text");
                String::new()
            }
        }
    }
}

/// Downloads an object from the uploads bucket into memory.
pub async fn fetch_object(s3: &aws_sdk_s3::Client, bucket: &str, key: &str) -> Result<Vec<u8>> {
    let output = s3
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .with_context(|| format!("Failed to fetch s3://{bucket}/{key}"))?;

    let data = output
        .body
        .collect()
        .await
        .with_context(|| format!("Failed to read body of s3://{bucket}/{key}"))?;

    Ok(data.into_bytes().to_vec())
}
