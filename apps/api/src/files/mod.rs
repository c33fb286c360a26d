// Uploaded-document handling: multipart intake to S3 and text extraction.

pub mod extract;
pub mod handlers;

pub use extract::{extract_text, fetch_object};
