//! LLM + RAG evaluator: one structured-output model call per stage, with
//! retrieved context substituted into the prompt templates. The model owns
//! the weighted arithmetic its prompt states; this module owns shape and
//! range validation of what comes back.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::evaluation::models::{CvEvaluation, FinalAssessment, ProjectEvaluation};
use crate::evaluation::prompts;
use crate::evaluation::strategy::{Evaluator, StageNames};
use crate::evaluation::EvalError;
use crate::llm_client::{LlmClient, DEFAULT_TEMPERATURE};
use crate::rag::ingest::{self, CASE_STUDY, JOB_DESCRIPTIONS, SCORING_RUBRICS};
use crate::rag::store::ContextStore;

/// Low temperature for CV scoring keeps repeat evaluations consistent.
const CV_TEMPERATURE: f32 = 0.3;

pub struct LlmEvaluator {
    llm: LlmClient,
    context: Arc<ContextStore>,
    docs_dir: PathBuf,
}

impl LlmEvaluator {
    pub fn new(llm: LlmClient, context: Arc<ContextStore>, docs_dir: PathBuf) -> Self {
        Self {
            llm,
            context,
            docs_dir,
        }
    }
}

#[async_trait]
impl Evaluator for LlmEvaluator {
    fn backend(&self) -> &'static str {
        "llm"
    }

    fn stages(&self) -> StageNames {
        StageNames {
            context: "initialize_rag",
            cv: "evaluate_cv",
            project: "evaluate_project",
            aggregate: "final_aggregation",
        }
    }

    async fn prepare_context(&self, _job_title: &str) -> Result<String, EvalError> {
        if !self.llm.available() {
            return Err(EvalError::LlmUnavailable);
        }

        if self.context.collection_exists(JOB_DESCRIPTIONS).await {
            info!("RAG already initialized");
            return Ok("RAG system ready\n".to_string());
        }

        info!("RAG not initialized, running ingestion...");
        match ingest::run(&self.context, &self.docs_dir).await {
            Ok(total) => Ok(format!("RAG system ready: {total} chunks indexed\n")),
            Err(e) => {
                // Evaluation proceeds with empty retrieval context.
                warn!("Could not initialize RAG: {e}");
                Ok("RAG system ready (ingestion failed, using empty context)\n".to_string())
            }
        }
    }

    async fn evaluate_cv(
        &self,
        cv_text: &str,
        job_title: &str,
    ) -> Result<CvEvaluation, EvalError> {
        info!("Starting CV evaluation with RAG");

        let job_description = self
            .context
            .retrieve(
                &format!("job description requirements for {job_title}"),
                JOB_DESCRIPTIONS,
                3,
            )
            .await?;
        let scoring_rubric = self
            .context
            .retrieve("CV evaluation scoring rubric parameters", SCORING_RUBRICS, 2)
            .await?;

        let prompt = prompts::build_cv_evaluation_prompt(cv_text, &job_description, &scoring_rubric);
        let result: CvEvaluation = self
            .llm
            .call_json(&prompt, prompts::CV_EVALUATION_SYSTEM, CV_TEMPERATURE)
            .await?;
        result.validate_model_output()?;

        info!("CV evaluation completed: match_rate={}", result.cv_match_rate);
        Ok(result)
    }

    async fn evaluate_project(&self, report_text: &str) -> Result<ProjectEvaluation, EvalError> {
        info!("Starting project evaluation with RAG");

        let case_study_brief = self
            .context
            .retrieve("case study brief requirements and deliverables", CASE_STUDY, 3)
            .await?;
        let scoring_rubric = self
            .context
            .retrieve(
                "project evaluation scoring rubric parameters",
                SCORING_RUBRICS,
                2,
            )
            .await?;

        let prompt = prompts::build_project_evaluation_prompt(
            report_text,
            &case_study_brief,
            &scoring_rubric,
        );
        let result: ProjectEvaluation = self
            .llm
            .call_json(&prompt, prompts::PROJECT_EVALUATION_SYSTEM, DEFAULT_TEMPERATURE)
            .await?;
        result.validate_model_output()?;

        info!("Project evaluation completed: score={}", result.project_score);
        Ok(result)
    }

    async fn aggregate(
        &self,
        cv: &CvEvaluation,
        project: &ProjectEvaluation,
        job_title: &str,
    ) -> Result<FinalAssessment, EvalError> {
        info!("Starting final aggregation");

        let prompt = prompts::build_final_aggregation_prompt(cv, project, job_title);
        let result: FinalAssessment = self
            .llm
            .call_json(&prompt, prompts::FINAL_AGGREGATION_SYSTEM, DEFAULT_TEMPERATURE)
            .await?;
        result.validate_model_output()?;

        info!(
            "Final aggregation completed: overall_score={}",
            result.overall_score
        );
        Ok(result)
    }
}
