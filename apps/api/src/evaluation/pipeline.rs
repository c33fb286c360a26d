//! The evaluation pipeline orchestrator.
//!
//! Drives a job through six strictly sequential stages, each bracketed by
//! a stage record: parse_cv → parse_report → context → cv → project →
//! aggregate (the last four named by the active backend). Status follows
//! `queued → processing → {completed | failed}`; the failure path writes
//! an error result record before handing the error back to the queue
//! layer, which owns outer retries.

use std::sync::Arc;

use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use crate::evaluation::models::EvaluationResult;
use crate::evaluation::repo;
use crate::evaluation::strategy::Evaluator;
use crate::evaluation::EvalError;
use crate::files;
use crate::models::job::{JobRow, JobStatus};

/// Everything a pipeline run needs, injected by the worker. No global
/// handles: tests substitute fakes by constructing their own context.
pub struct PipelineContext {
    pub db: PgPool,
    pub s3: aws_sdk_s3::Client,
    pub bucket: String,
    pub evaluator: Arc<dyn Evaluator>,
}

/// Runs the full pipeline for one job. On success the job ends `completed`
/// with the result payload written; on any stage error it ends `failed`
/// with an error record in the same slot, and the error is returned so the
/// queue layer can apply its retry policy.
pub async fn run_evaluation(
    ctx: &PipelineContext,
    job: &JobRow,
) -> Result<EvaluationResult, EvalError> {
    repo::set_job_status(&ctx.db, job.id, JobStatus::Processing).await?;
    info!(
        "Job {}: starting evaluation ({} backend)",
        job.id,
        ctx.evaluator.backend()
    );

    match execute_stages(ctx, job).await {
        Ok(result) => {
            repo::set_job_result(&ctx.db, job.id, &result).await?;
            repo::set_job_status(&ctx.db, job.id, JobStatus::Completed).await?;
            info!("Job {}: evaluation complete", job.id);
            Ok(result)
        }
        Err(err) => {
            error!("Job {}: evaluation failed: {err}", job.id);
            let failure = EvaluationResult::failure(&err.to_string());
            // Best effort: the original error outranks persistence trouble.
            if let Err(db_err) = repo::set_job_result(&ctx.db, job.id, &failure).await {
                error!("Job {}: could not persist failure result: {db_err}", job.id);
            }
            if let Err(db_err) = repo::set_job_status(&ctx.db, job.id, JobStatus::Failed).await {
                error!("Job {}: could not persist failed status: {db_err}", job.id);
            }
            Err(err)
        }
    }
}

async fn execute_stages(
    ctx: &PipelineContext,
    job: &JobRow,
) -> Result<EvaluationResult, EvalError> {
    let names = ctx.evaluator.stages();

    // Stage 1: parse CV
    let stage = repo::start_stage(&ctx.db, job.id, "parse_cv").await?;
    let cv_text = parse_document(ctx, job.cv_file_id, "CV").await?;
    repo::end_stage(
        &ctx.db,
        stage.id,
        Some(&format!("CV parsed: {} characters\n", cv_text.chars().count())),
    )
    .await?;

    // Stage 2: parse project report
    let stage = repo::start_stage(&ctx.db, job.id, "parse_report").await?;
    let report_text = parse_document(ctx, job.report_file_id, "Project report").await?;
    repo::end_stage(
        &ctx.db,
        stage.id,
        Some(&format!(
            "Report parsed: {} characters\n",
            report_text.chars().count()
        )),
    )
    .await?;

    // Stage 3: reference context
    let stage = repo::start_stage(&ctx.db, job.id, names.context).await?;
    let context_log = ctx.evaluator.prepare_context(&job.job_title).await?;
    repo::end_stage(&ctx.db, stage.id, Some(&context_log)).await?;

    // Stage 4: CV evaluation
    let stage = repo::start_stage(&ctx.db, job.id, names.cv).await?;
    let cv = ctx.evaluator.evaluate_cv(&cv_text, &job.job_title).await?;
    repo::end_stage(
        &ctx.db,
        stage.id,
        Some(&format!("CV Match Rate: {:.2}\n", cv.cv_match_rate)),
    )
    .await?;

    // Stage 5: project evaluation
    let stage = repo::start_stage(&ctx.db, job.id, names.project).await?;
    let project = ctx.evaluator.evaluate_project(&report_text).await?;
    repo::end_stage(
        &ctx.db,
        stage.id,
        Some(&format!("Project Score: {:.2}/5\n", project.project_score)),
    )
    .await?;

    // Stage 6: final aggregation
    let stage = repo::start_stage(&ctx.db, job.id, names.aggregate).await?;
    let assessment = ctx
        .evaluator
        .aggregate(&cv, &project, &job.job_title)
        .await?;
    repo::end_stage(
        &ctx.db,
        stage.id,
        Some(&format!("Overall Score: {:.2}/5\n", assessment.overall_score)),
    )
    .await?;

    Ok(EvaluationResult::assemble(cv, project, assessment))
}

/// Loads a file row, fetches its object, and extracts text. Empty text is
/// an input error naming the document; it fails the job without retry.
async fn parse_document(
    ctx: &PipelineContext,
    file_id: Uuid,
    which: &'static str,
) -> Result<String, EvalError> {
    let file = repo::get_file(&ctx.db, file_id)
        .await?
        .ok_or(EvalError::MissingFile(file_id))?;

    info!("Parsing {which} from {}", file.path);
    let data = files::fetch_object(&ctx.s3, &ctx.bucket, &file.path)
        .await
        .map_err(|e| EvalError::Storage(e.to_string()))?;

    let text = files::extract_text(&file.original_name, &data);
    if text.trim().is_empty() {
        return Err(EvalError::EmptyDocument(which));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_error_names_the_document() {
        let err = EvalError::EmptyDocument("CV");
        assert_eq!(err.to_string(), "CV is empty or could not be parsed");
        let failure = EvaluationResult::failure(&err.to_string());
        assert!(failure.error.as_deref().unwrap_or("").contains("CV"));
        assert!(!failure.cv_feedback.is_empty());
    }

    #[test]
    fn test_stage_log_formats() {
        assert_eq!(
            format!("CV Match Rate: {:.2}\n", 0.8),
            "CV Match Rate: 0.80\n"
        );
        assert_eq!(
            format!("Project Score: {:.2}/5\n", 4.5),
            "Project Score: 4.50/5\n"
        );
        assert_eq!(
            format!("Overall Score: {:.2}/5\n", 4.4),
            "Overall Score: 4.40/5\n"
        );
    }
}
