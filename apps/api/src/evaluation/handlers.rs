//! Axum handlers for creating evaluation jobs and reading results.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::repo;
use crate::models::file::FileKind;
use crate::models::job::{JobStatus, StageRow};
use crate::state::AppState;
use crate::worker;

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub job_title: String,
    pub cv_id: Uuid,
    pub report_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub id: Uuid,
    pub status: JobStatus,
}

/// POST /evaluate
///
/// Creates a `queued` job referencing two previously uploaded files and
/// enqueues it for the worker. Both files must exist and carry the right
/// kind; the invariant is checked here, at job-creation time.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, AppError> {
    if request.job_title.trim().is_empty() {
        return Err(AppError::Validation("job_title cannot be empty".to_string()));
    }

    let cv = repo::get_file(&state.db, request.cv_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("file {}", request.cv_id)))?;
    if cv.kind != FileKind::Cv {
        return Err(AppError::Validation(format!(
            "file {} is a {} upload, not a cv",
            cv.id,
            cv.kind.as_str()
        )));
    }

    let report = repo::get_file(&state.db, request.report_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("file {}", request.report_id)))?;
    if report.kind != FileKind::Report {
        return Err(AppError::Validation(format!(
            "file {} is a {} upload, not a report",
            report.id,
            report.kind.as_str()
        )));
    }

    let job = repo::create_job(&state.db, request.job_title.trim(), cv.id, report.id).await?;
    worker::enqueue(&state.redis, job.id).await?;

    info!("Job {} queued for '{}'", job.id, job.job_title);
    Ok(Json(EvaluateResponse {
        id: job.id,
        status: job.status,
    }))
}

#[derive(Debug, Serialize)]
pub struct StageView {
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub logs: Option<String>,
}

impl From<StageRow> for StageView {
    fn from(row: StageRow) -> Self {
        Self {
            name: row.name,
            started_at: row.started_at,
            ended_at: row.ended_at,
            logs: row.logs,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub id: Uuid,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    pub stages: Vec<StageView>,
}

/// GET /result/:id
///
/// Queryable at any time: status plus whatever result and stage history
/// exist so far. A failed job carries its error description inside the
/// result payload.
pub async fn handle_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResultResponse>, AppError> {
    let job = repo::get_job(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("job {id}")))?;
    let stages = repo::stages_for_job(&state.db, id).await?;

    Ok(Json(ResultResponse {
        id: job.id,
        status: job.status,
        result: job.result_json,
        stages: stages.into_iter().map(StageView::from).collect(),
    }))
}
