//! Typed evaluation records. Both backends produce the same shapes; the
//! LLM backend additionally carries per-criterion breakdowns, validated at
//! the boundary where the model response is parsed — an out-of-range or
//! incomplete response is rejected, never silently defaulted.

use serde::{Deserialize, Serialize};

use crate::evaluation::EvalError;

/// One scored rubric criterion with the model's 1-2 sentence justification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriterionScore {
    pub score: f64,
    pub justification: String,
}

impl CriterionScore {
    fn in_range(&self) -> bool {
        (1.0..=5.0).contains(&self.score)
    }
}

/// Final hiring recommendation labels (fixed vocabulary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "strong fit")]
    StrongFit,
    #[serde(rename = "moderate fit")]
    ModerateFit,
    #[serde(rename = "needs development")]
    NeedsDevelopment,
    #[serde(rename = "not recommended")]
    NotRecommended,
}

/// CV-stage output. `cv_match_rate` is on 0–1. Criterion fields are present
/// for the LLM backend (its prompt schema requires them) and absent for the
/// heuristic backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvEvaluation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical_skills: Option<CriterionScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<CriterionScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievements: Option<CriterionScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultural_fit: Option<CriterionScore>,
    pub cv_match_rate: f64,
    pub cv_feedback: String,
}

impl CvEvaluation {
    /// Boundary validation for a model-produced record: match rate on 0–1
    /// and all four criteria present and on 1–5.
    pub fn validate_model_output(&self) -> Result<(), EvalError> {
        if !(0.0..=1.0).contains(&self.cv_match_rate) {
            return Err(EvalError::InvalidResponse(format!(
                "cv_match_rate {} outside [0, 1]",
                self.cv_match_rate
            )));
        }
        for (name, criterion) in [
            ("technical_skills", &self.technical_skills),
            ("experience_level", &self.experience_level),
            ("achievements", &self.achievements),
            ("cultural_fit", &self.cultural_fit),
        ] {
            match criterion {
                None => {
                    return Err(EvalError::InvalidResponse(format!(
                        "missing criterion '{name}'"
                    )))
                }
                Some(c) if !c.in_range() => {
                    return Err(EvalError::InvalidResponse(format!(
                        "criterion '{name}' score {} outside [1, 5]",
                        c.score
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Project-stage output. `project_score` is on 1–5.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectEvaluation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correctness: Option<CriterionScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_quality: Option<CriterionScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resilience: Option<CriterionScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<CriterionScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creativity: Option<CriterionScore>,
    pub project_score: f64,
    pub project_feedback: String,
}

impl ProjectEvaluation {
    pub fn validate_model_output(&self) -> Result<(), EvalError> {
        if !(1.0..=5.0).contains(&self.project_score) {
            return Err(EvalError::InvalidResponse(format!(
                "project_score {} outside [1, 5]",
                self.project_score
            )));
        }
        for (name, criterion) in [
            ("correctness", &self.correctness),
            ("code_quality", &self.code_quality),
            ("resilience", &self.resilience),
            ("documentation", &self.documentation),
            ("creativity", &self.creativity),
        ] {
            match criterion {
                None => {
                    return Err(EvalError::InvalidResponse(format!(
                        "missing criterion '{name}'"
                    )))
                }
                Some(c) if !c.in_range() => {
                    return Err(EvalError::InvalidResponse(format!(
                        "criterion '{name}' score {} outside [1, 5]",
                        c.score
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

/// Aggregation-stage output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalAssessment {
    pub overall_score: f64,
    pub overall_summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
}

impl FinalAssessment {
    pub fn validate_model_output(&self) -> Result<(), EvalError> {
        if !(1.0..=5.0).contains(&self.overall_score) {
            return Err(EvalError::InvalidResponse(format!(
                "overall_score {} outside [1, 5]",
                self.overall_score
            )));
        }
        if self.overall_summary.trim().is_empty() {
            return Err(EvalError::InvalidResponse(
                "overall_summary is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-criterion CV breakdown included in the result payload when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvDetails {
    pub technical_skills: CriterionScore,
    pub experience_level: CriterionScore,
    pub achievements: CriterionScore,
    pub cultural_fit: CriterionScore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetails {
    pub correctness: CriterionScore,
    pub code_quality: CriterionScore,
    pub resilience: CriterionScore,
    pub documentation: CriterionScore,
    pub creativity: CriterionScore,
}

/// The job's result payload — the stable caller-facing field set. On
/// failure the same slot holds a record with zeroed scores and the error
/// message embedded in the feedback/summary fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub cv_match_rate: f64,
    pub cv_feedback: String,
    pub project_score: f64,
    pub project_feedback: String,
    pub overall_score: f64,
    pub overall_summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Recommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cv_details: Option<CvDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_details: Option<ProjectDetails>,
}

impl EvaluationResult {
    /// Combines the three stage outputs into the caller-facing record.
    pub fn assemble(
        cv: CvEvaluation,
        project: ProjectEvaluation,
        assessment: FinalAssessment,
    ) -> Self {
        let cv_details = match (
            cv.technical_skills,
            cv.experience_level,
            cv.achievements,
            cv.cultural_fit,
        ) {
            (Some(technical_skills), Some(experience_level), Some(achievements), Some(cultural_fit)) => {
                Some(CvDetails {
                    technical_skills,
                    experience_level,
                    achievements,
                    cultural_fit,
                })
            }
            _ => None,
        };
        let project_details = match (
            project.correctness,
            project.code_quality,
            project.resilience,
            project.documentation,
            project.creativity,
        ) {
            (
                Some(correctness),
                Some(code_quality),
                Some(resilience),
                Some(documentation),
                Some(creativity),
            ) => Some(ProjectDetails {
                correctness,
                code_quality,
                resilience,
                documentation,
                creativity,
            }),
            _ => None,
        };

        Self {
            cv_match_rate: cv.cv_match_rate,
            cv_feedback: cv.cv_feedback,
            project_score: project.project_score,
            project_feedback: project.project_feedback,
            overall_score: assessment.overall_score,
            overall_summary: assessment.overall_summary,
            recommendation: assessment.recommendation,
            error: None,
            cv_details,
            project_details,
        }
    }

    /// The failure record: zeroed scores, explanatory message in every
    /// user-facing text field. A failed job is never left with an empty
    /// result payload.
    pub fn failure(message: &str) -> Self {
        Self {
            cv_match_rate: 0.0,
            cv_feedback: format!("Evaluation failed: {message}"),
            project_score: 0.0,
            project_feedback: format!("Evaluation failed: {message}"),
            overall_score: 0.0,
            overall_summary: format!(
                "Evaluation could not be completed due to an error: {message}"
            ),
            recommendation: None,
            error: Some(message.to_string()),
            cv_details: None,
            project_details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criterion(score: f64) -> Option<CriterionScore> {
        Some(CriterionScore {
            score,
            justification: "solid evidence".to_string(),
        })
    }

    fn full_cv(rate: f64) -> CvEvaluation {
        CvEvaluation {
            technical_skills: criterion(4.0),
            experience_level: criterion(3.0),
            achievements: criterion(4.0),
            cultural_fit: criterion(5.0),
            cv_match_rate: rate,
            cv_feedback: "Strong backend profile.".to_string(),
        }
    }

    #[test]
    fn test_cv_validation_accepts_in_range() {
        assert!(full_cv(0.78).validate_model_output().is_ok());
    }

    #[test]
    fn test_cv_validation_rejects_out_of_range_rate() {
        assert!(full_cv(1.2).validate_model_output().is_err());
        assert!(full_cv(-0.1).validate_model_output().is_err());
    }

    #[test]
    fn test_cv_validation_rejects_missing_criterion() {
        let mut cv = full_cv(0.5);
        cv.cultural_fit = None;
        let err = cv.validate_model_output().unwrap_err();
        assert!(err.to_string().contains("cultural_fit"));
    }

    #[test]
    fn test_cv_validation_rejects_out_of_range_criterion() {
        let mut cv = full_cv(0.5);
        cv.technical_skills = criterion(0.0);
        assert!(cv.validate_model_output().is_err());
    }

    #[test]
    fn test_final_validation_bounds() {
        let ok = FinalAssessment {
            overall_score: 4.4,
            overall_summary: "Hire.".to_string(),
            recommendation: Some(Recommendation::StrongFit),
        };
        assert!(ok.validate_model_output().is_ok());

        let bad = FinalAssessment {
            overall_score: 5.5,
            overall_summary: "Too good.".to_string(),
            recommendation: None,
        };
        assert!(bad.validate_model_output().is_err());
    }

    #[test]
    fn test_recommendation_labels() {
        assert_eq!(
            serde_json::to_string(&Recommendation::NeedsDevelopment).unwrap(),
            "\"needs development\""
        );
        let parsed: Recommendation = serde_json::from_str("\"strong fit\"").unwrap();
        assert_eq!(parsed, Recommendation::StrongFit);
    }

    #[test]
    fn test_llm_response_json_deserializes() {
        // The exact field layout the CV prompt instructs the model to emit.
        let raw = r#"{
            "technical_skills": {"score": 4, "justification": "Rust, Postgres, APIs."},
            "experience_level": {"score": 3, "justification": "Four years."},
            "achievements": {"score": 4, "justification": "Scaled ingestion 10x."},
            "cultural_fit": {"score": 4, "justification": "Mentors juniors."},
            "cv_match_rate": 0.76,
            "cv_feedback": "Well aligned overall."
        }"#;
        let cv: CvEvaluation = serde_json::from_str(raw).unwrap();
        assert!(cv.validate_model_output().is_ok());
        assert_eq!(cv.cv_match_rate, 0.76);
    }

    #[test]
    fn test_failure_record_mentions_error_everywhere() {
        let result = EvaluationResult::failure("CV is empty or could not be parsed");
        assert_eq!(result.cv_match_rate, 0.0);
        assert_eq!(result.overall_score, 0.0);
        assert!(result.error.as_deref().unwrap_or("").contains("CV"));
        assert!(result.cv_feedback.contains("CV is empty"));
        assert!(result.overall_summary.contains("could not be completed"));
        assert!(result.recommendation.is_none());
    }

    #[test]
    fn test_assemble_carries_details_when_complete() {
        let cv = full_cv(0.8);
        let project = ProjectEvaluation {
            correctness: criterion(4.0),
            code_quality: criterion(4.0),
            resilience: criterion(3.0),
            documentation: criterion(4.0),
            creativity: criterion(5.0),
            project_score: 4.5,
            project_feedback: "Clean pipeline design.".to_string(),
        };
        let assessment = FinalAssessment {
            overall_score: 4.4,
            overall_summary: "Strong candidate.".to_string(),
            recommendation: Some(Recommendation::StrongFit),
        };
        let result = EvaluationResult::assemble(cv, project, assessment);
        assert!(result.cv_details.is_some());
        assert!(result.project_details.is_some());
        assert!(result.error.is_none());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["recommendation"], "strong fit");
        assert_eq!(json["project_details"]["creativity"]["score"], 5.0);
    }

    #[test]
    fn test_assemble_without_details_omits_them() {
        let cv = CvEvaluation {
            technical_skills: None,
            experience_level: None,
            achievements: None,
            cultural_fit: None,
            cv_match_rate: 1.0,
            cv_feedback: "Good alignment.".to_string(),
        };
        let project = ProjectEvaluation {
            correctness: None,
            code_quality: None,
            resilience: None,
            documentation: None,
            creativity: None,
            project_score: 4.5,
            project_feedback: "Covers the brief.".to_string(),
        };
        let assessment = FinalAssessment {
            overall_score: 4.6,
            overall_summary: "Recommended.".to_string(),
            recommendation: Some(Recommendation::StrongFit),
        };
        let result = EvaluationResult::assemble(cv, project, assessment);
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("cv_details").is_none());
        assert!(json.get("error").is_none());
    }
}
