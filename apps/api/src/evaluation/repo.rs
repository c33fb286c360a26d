//! Persistence operations for files, jobs, and stages. Thin sqlx queries;
//! callers own transaction/error semantics.

use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::evaluation::models::EvaluationResult;
use crate::models::file::{FileKind, FileRow};
use crate::models::job::{JobRow, JobStatus, StageRow};

// Files

pub async fn create_file(
    pool: &PgPool,
    kind: FileKind,
    original_name: &str,
    path: &str,
) -> Result<FileRow, sqlx::Error> {
    sqlx::query_as::<_, FileRow>(
        r#"
        INSERT INTO files (id, kind, original_name, path)
        VALUES ($1, $2, $3, $4)
        RETURNING id, kind, original_name, path, uploaded_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(kind)
    .bind(original_name)
    .bind(path)
    .fetch_one(pool)
    .await
}

pub async fn get_file(pool: &PgPool, id: Uuid) -> Result<Option<FileRow>, sqlx::Error> {
    sqlx::query_as::<_, FileRow>(
        "SELECT id, kind, original_name, path, uploaded_at FROM files WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

// Jobs

pub async fn create_job(
    pool: &PgPool,
    job_title: &str,
    cv_file_id: Uuid,
    report_file_id: Uuid,
) -> Result<JobRow, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        r#"
        INSERT INTO jobs (id, job_title, cv_file_id, report_file_id, status)
        VALUES ($1, $2, $3, $4, 'queued')
        RETURNING id, job_title, cv_file_id, report_file_id, status,
                  created_at, updated_at, result_json
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(job_title)
    .bind(cv_file_id)
    .bind(report_file_id)
    .fetch_one(pool)
    .await
}

pub async fn get_job(pool: &PgPool, id: Uuid) -> Result<Option<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        r#"
        SELECT id, job_title, cv_file_id, report_file_id, status,
               created_at, updated_at, result_json
        FROM jobs WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn set_job_status(
    pool: &PgPool,
    id: Uuid,
    status: JobStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE jobs SET status = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_job_result(
    pool: &PgPool,
    id: Uuid,
    result: &EvaluationResult,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE jobs SET result_json = $2, updated_at = now() WHERE id = $1")
        .bind(id)
        .bind(Json(result))
        .execute(pool)
        .await?;
    Ok(())
}

// Stages

pub async fn start_stage(pool: &PgPool, job_id: Uuid, name: &str) -> Result<StageRow, sqlx::Error> {
    sqlx::query_as::<_, StageRow>(
        r#"
        INSERT INTO stages (id, job_id, name)
        VALUES ($1, $2, $3)
        RETURNING id, job_id, name, started_at, ended_at, logs
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(job_id)
    .bind(name)
    .fetch_one(pool)
    .await
}

/// Closes a stage: sets the end timestamp and appends the log fragment.
pub async fn end_stage(
    pool: &PgPool,
    stage_id: Uuid,
    logs: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE stages
        SET ended_at = now(),
            logs = coalesce(logs, '') || coalesce($2, '')
        WHERE id = $1
        "#,
    )
    .bind(stage_id)
    .bind(logs)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn stages_for_job(pool: &PgPool, job_id: Uuid) -> Result<Vec<StageRow>, sqlx::Error> {
    sqlx::query_as::<_, StageRow>(
        r#"
        SELECT id, job_id, name, started_at, ended_at, logs
        FROM stages WHERE job_id = $1
        ORDER BY started_at ASC
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await
}
