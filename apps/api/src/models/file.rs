use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// What an uploaded document is: the candidate's CV or their project report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "file_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Cv,
    Report,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Cv => "cv",
            FileKind::Report => "report",
        }
    }
}

/// An uploaded document. Immutable once created; `path` is the S3 object key.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FileRow {
    pub id: Uuid,
    pub kind: FileKind,
    pub original_name: String,
    pub path: String,
    pub uploaded_at: DateTime<Utc>,
}
