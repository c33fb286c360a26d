//! Deterministic evaluator: keyword overlap against the reference
//! documents drives every score. No model calls, no embeddings — suitable
//! for local runs and as a baseline for the llm backend.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::evaluation::models::{
    CvEvaluation, FinalAssessment, ProjectEvaluation, Recommendation,
};
use crate::evaluation::scoring::{bounded_to_scale, keyword_overlap_score, round_to};
use crate::evaluation::strategy::{Evaluator, StageNames};
use crate::evaluation::EvalError;
use crate::rag::ingest::{self, CASE_STUDY, JOB_DESCRIPTIONS};
use crate::rag::store::ContextStore;

/// Overall blend: 20% CV (rescaled onto 1-5) / 80% project.
const CV_WEIGHT: f64 = 0.2;
const PROJECT_WEIGHT: f64 = 0.8;

/// Raw Jaccard between a report and a brief rarely exceeds this; it maps
/// to a full 5.0 project score.
const PROJECT_OVERLAP_CEILING: f64 = 0.6;

const CV_FEEDBACK_GOOD: &str =
    "Good alignment between the CV and the job description keywords.";
const CV_FEEDBACK_PARTIAL: &str =
    "Partial alignment between the CV and the job description keywords.";
const CV_FEEDBACK_LOW: &str =
    "Low alignment between the CV and the job description keywords.";

const PROJECT_FEEDBACK_GOOD: &str = "The report covers the case-study brief well.";
const PROJECT_FEEDBACK_PARTIAL: &str = "The report covers parts of the case-study brief.";
const PROJECT_FEEDBACK_LOW: &str = "The report covers little of the case-study brief.";

pub struct HeuristicEvaluator {
    context: Arc<ContextStore>,
    docs_dir: PathBuf,
}

impl HeuristicEvaluator {
    pub fn new(context: Arc<ContextStore>, docs_dir: PathBuf) -> Self {
        Self { context, docs_dir }
    }
}

#[async_trait]
impl Evaluator for HeuristicEvaluator {
    fn backend(&self) -> &'static str {
        "heuristic"
    }

    fn stages(&self) -> StageNames {
        StageNames {
            context: "retrieve_context",
            cv: "score_cv",
            project: "score_project",
            aggregate: "aggregate",
        }
    }

    async fn prepare_context(&self, _job_title: &str) -> Result<String, EvalError> {
        if !self.context.collection_exists(JOB_DESCRIPTIONS).await {
            if let Err(e) = ingest::run(&self.context, &self.docs_dir).await {
                // Degrade to empty references: overlap scores become 0
                // instead of the job hard-failing on missing documents.
                warn!("Could not ingest reference documents: {e}");
            }
        }
        let jd_chars = self.context.collection_text(JOB_DESCRIPTIONS).await.chars().count();
        let brief_chars = self.context.collection_text(CASE_STUDY).await.chars().count();
        Ok(format!(
            "Reference documents loaded: job descriptions {jd_chars} chars, case-study brief {brief_chars} chars\n"
        ))
    }

    async fn evaluate_cv(
        &self,
        cv_text: &str,
        _job_title: &str,
    ) -> Result<CvEvaluation, EvalError> {
        let reference = self.context.collection_text(JOB_DESCRIPTIONS).await;
        let rate = keyword_overlap_score(cv_text, &reference);
        Ok(CvEvaluation {
            technical_skills: None,
            experience_level: None,
            achievements: None,
            cultural_fit: None,
            cv_match_rate: rate,
            cv_feedback: cv_feedback_for(rate).to_string(),
        })
    }

    async fn evaluate_project(&self, report_text: &str) -> Result<ProjectEvaluation, EvalError> {
        let reference = self.context.collection_text(CASE_STUDY).await;
        let overlap = keyword_overlap_score(report_text, &reference);
        let score = bounded_to_scale(overlap, 0.0, PROJECT_OVERLAP_CEILING, 5);
        Ok(ProjectEvaluation {
            correctness: None,
            code_quality: None,
            resilience: None,
            documentation: None,
            creativity: None,
            project_score: score,
            project_feedback: project_feedback_for(overlap).to_string(),
        })
    }

    async fn aggregate(
        &self,
        cv: &CvEvaluation,
        project: &ProjectEvaluation,
        job_title: &str,
    ) -> Result<FinalAssessment, EvalError> {
        let overall = round_to(
            CV_WEIGHT * cv.cv_match_rate * 5.0 + PROJECT_WEIGHT * project.project_score,
            2,
        );
        Ok(FinalAssessment {
            overall_score: overall,
            overall_summary: format!(
                "Keyword-based assessment for {job_title}: CV match rate {:.2}, \
                 project score {:.2}/5, overall {:.2}/5 (weighted {:.0}% CV / {:.0}% project).",
                cv.cv_match_rate,
                project.project_score,
                overall,
                CV_WEIGHT * 100.0,
                PROJECT_WEIGHT * 100.0,
            ),
            recommendation: Some(recommendation_for(overall)),
        })
    }
}

fn cv_feedback_for(rate: f64) -> &'static str {
    if rate > 0.35 {
        CV_FEEDBACK_GOOD
    } else if rate >= 0.15 {
        CV_FEEDBACK_PARTIAL
    } else {
        CV_FEEDBACK_LOW
    }
}

fn project_feedback_for(overlap: f64) -> &'static str {
    if overlap > 0.35 {
        PROJECT_FEEDBACK_GOOD
    } else if overlap >= 0.15 {
        PROJECT_FEEDBACK_PARTIAL
    } else {
        PROJECT_FEEDBACK_LOW
    }
}

fn recommendation_for(overall: f64) -> Recommendation {
    if overall >= 4.0 {
        Recommendation::StrongFit
    } else if overall >= 3.0 {
        Recommendation::ModerateFit
    } else if overall >= 2.0 {
        Recommendation::NeedsDevelopment
    } else {
        Recommendation::NotRecommended
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::embeddings::EmbeddingClient;
    use crate::rag::store::StoredChunk;

    async fn evaluator_with(jd: &str, brief: &str) -> HeuristicEvaluator {
        let store = Arc::new(ContextStore::new(EmbeddingClient::new(
            "http://localhost:9".to_string(),
            String::new(),
        )));
        store
            .upsert(
                JOB_DESCRIPTIONS,
                vec![StoredChunk {
                    text: jd.to_string(),
                    source: "jd.txt".to_string(),
                    embedding: Vec::new(),
                }],
            )
            .await;
        store
            .upsert(
                CASE_STUDY,
                vec![StoredChunk {
                    text: brief.to_string(),
                    source: "brief.txt".to_string(),
                    embedding: Vec::new(),
                }],
            )
            .await;
        HeuristicEvaluator::new(store, PathBuf::from("/nonexistent"))
    }

    #[test]
    fn test_cv_feedback_thresholds() {
        assert_eq!(cv_feedback_for(1.0), CV_FEEDBACK_GOOD);
        assert_eq!(cv_feedback_for(0.36), CV_FEEDBACK_GOOD);
        assert_eq!(cv_feedback_for(0.35), CV_FEEDBACK_PARTIAL);
        assert_eq!(cv_feedback_for(0.15), CV_FEEDBACK_PARTIAL);
        assert_eq!(cv_feedback_for(0.14), CV_FEEDBACK_LOW);
        assert_eq!(cv_feedback_for(0.0), CV_FEEDBACK_LOW);
    }

    #[test]
    fn test_recommendation_cutoffs() {
        assert_eq!(recommendation_for(4.4), Recommendation::StrongFit);
        assert_eq!(recommendation_for(3.2), Recommendation::ModerateFit);
        assert_eq!(recommendation_for(2.0), Recommendation::NeedsDevelopment);
        assert_eq!(recommendation_for(1.1), Recommendation::NotRecommended);
    }

    #[tokio::test]
    async fn test_fully_overlapping_cv_scores_one() {
        let jd = "rust backend postgres redis tokio";
        let evaluator = evaluator_with(jd, "irrelevant brief").await;
        let cv = evaluator.evaluate_cv(jd, "Backend Engineer").await.unwrap();
        assert_eq!(cv.cv_match_rate, 1.0);
        assert_eq!(cv.cv_feedback, CV_FEEDBACK_GOOD);
    }

    #[tokio::test]
    async fn test_disjoint_cv_scores_zero() {
        let evaluator = evaluator_with("rust backend services", "brief text").await;
        let cv = evaluator
            .evaluate_cv("pastry chef croissants", "Backend Engineer")
            .await
            .unwrap();
        assert_eq!(cv.cv_match_rate, 0.0);
        assert_eq!(cv.cv_feedback, CV_FEEDBACK_LOW);
    }

    #[tokio::test]
    async fn test_documented_blend() {
        let evaluator = evaluator_with("jd", "brief").await;
        let cv = CvEvaluation {
            technical_skills: None,
            experience_level: None,
            achievements: None,
            cultural_fit: None,
            cv_match_rate: 0.8,
            cv_feedback: String::new(),
        };
        let project = ProjectEvaluation {
            correctness: None,
            code_quality: None,
            resilience: None,
            documentation: None,
            creativity: None,
            project_score: 4.5,
            project_feedback: String::new(),
        };
        let assessment = evaluator
            .aggregate(&cv, &project, "Backend Engineer")
            .await
            .unwrap();
        // 0.2 * 0.8 * 5 + 0.8 * 4.5 = 4.4
        assert_eq!(assessment.overall_score, 4.4);
        assert_eq!(assessment.recommendation, Some(Recommendation::StrongFit));
        assert!(assessment.overall_summary.contains("Backend Engineer"));
    }

    #[tokio::test]
    async fn test_project_score_saturates_at_ceiling() {
        let brief = "build a queue backed evaluation pipeline with retries";
        let evaluator = evaluator_with("jd text", brief).await;
        let project = evaluator.evaluate_project(brief).await.unwrap();
        // Full overlap (1.0) is above the 0.6 ceiling → clamped to 5.0.
        assert_eq!(project.project_score, 5.0);
        assert_eq!(project.project_feedback, PROJECT_FEEDBACK_GOOD);
    }

    #[tokio::test]
    async fn test_missing_references_degrade_to_zero() {
        let store = Arc::new(ContextStore::new(EmbeddingClient::new(
            "http://localhost:9".to_string(),
            String::new(),
        )));
        let evaluator = HeuristicEvaluator::new(store, PathBuf::from("/nonexistent"));
        // prepare_context ingests nothing (missing dir) but must not fail.
        let log = evaluator.prepare_context("Backend Engineer").await.unwrap();
        assert!(log.contains("Reference documents loaded"));
        let cv = evaluator.evaluate_cv("rust engineer", "t").await.unwrap();
        assert_eq!(cv.cv_match_rate, 0.0);
    }
}
