use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Job lifecycle: `queued → processing → {completed | failed}`.
/// `queued` is set at creation; the two terminal states are only left via an
/// external re-enqueue by the queue layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

/// One evaluation request: a job title plus references to a CV file and a
/// project-report file. Mutated only by the pipeline orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobRow {
    pub id: Uuid,
    pub job_title: String,
    pub cv_file_id: Uuid,
    pub report_file_id: Uuid,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub result_json: Option<Value>,
}

/// One step of a job's execution history. Opened at stage entry, closed
/// (end timestamp + log fragment) at stage exit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StageRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub logs: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Processing).unwrap(),
            "\"processing\""
        );
        assert_eq!(
            serde_json::to_string(&JobStatus::Failed).unwrap(),
            "\"failed\""
        );
    }

    #[test]
    fn test_kind_roundtrip() {
        let kind: super::super::file::FileKind = serde_json::from_str("\"report\"").unwrap();
        assert_eq!(kind.as_str(), "report");
    }
}
