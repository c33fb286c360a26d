//! The pluggable evaluator seam.
//!
//! Two backends implement this trait: `HeuristicEvaluator` (deterministic
//! keyword overlap, no network) and `LlmEvaluator` (LLM + RAG). The
//! orchestrator never knows which one it drives; `AppState` carries an
//! `Arc<dyn Evaluator>` chosen once at startup from `EVAL_BACKEND`.

use async_trait::async_trait;

use crate::evaluation::models::{CvEvaluation, FinalAssessment, ProjectEvaluation};
use crate::evaluation::EvalError;

/// Stage-name vocabulary for the four strategy-owned stages. The two
/// parsing stages (`parse_cv`, `parse_report`) belong to the orchestrator
/// and are shared by both backends.
#[derive(Debug, Clone, Copy)]
pub struct StageNames {
    pub context: &'static str,
    pub cv: &'static str,
    pub project: &'static str,
    pub aggregate: &'static str,
}

#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Short backend label, recorded in logs ("heuristic" | "llm").
    fn backend(&self) -> &'static str;

    /// The stage names this backend's runs are recorded under.
    fn stages(&self) -> StageNames;

    /// Third stage: make reference context available (ingest documents on
    /// first use). Returns the stage's log fragment.
    async fn prepare_context(&self, job_title: &str) -> Result<String, EvalError>;

    /// Fourth stage: score the CV against the job description.
    async fn evaluate_cv(
        &self,
        cv_text: &str,
        job_title: &str,
    ) -> Result<CvEvaluation, EvalError>;

    /// Fifth stage: score the project report against the case-study brief.
    async fn evaluate_project(&self, report_text: &str) -> Result<ProjectEvaluation, EvalError>;

    /// Sixth stage: combine both evaluations into the final assessment.
    async fn aggregate(
        &self,
        cv: &CvEvaluation,
        project: &ProjectEvaluation,
        job_title: &str,
    ) -> Result<FinalAssessment, EvalError>;
}
