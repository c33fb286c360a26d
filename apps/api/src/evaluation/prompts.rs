//! All LLM prompt constants and builders for the evaluation stages.
//! Criterion weights live in the prompt text — the model computes the
//! weighted fields and the caller validates ranges, not arithmetic.

use crate::evaluation::models::{CvEvaluation, ProjectEvaluation};

/// CV text beyond this many characters is not sent to the model.
pub const MAX_CV_CHARS: usize = 8000;
/// Project-report budget is larger; reports run longer than CVs.
pub const MAX_REPORT_CHARS: usize = 10_000;

pub const CV_EVALUATION_SYSTEM: &str = "You are an expert technical recruiter and HR specialist. \
    Your job is to evaluate a candidate's CV against a specific job description and scoring rubric. \
    You must provide objective, data-driven assessments based on the information provided. \
    Be fair but thorough in your evaluation. \
    Always respond with valid JSON only, no additional text.";

const CV_EVALUATION_TEMPLATE: &str = r#"Evaluate the following candidate's CV against the job description and scoring rubric provided.

JOB DESCRIPTION:
{job_description}

SCORING RUBRIC:
{scoring_rubric}

CANDIDATE CV:
{cv_text}

Please evaluate the candidate on the following parameters (score each 1-5):
1. Technical Skills Match (40% weight): Alignment with job requirements (backend, databases, APIs, cloud, AI/LLM)
2. Experience Level (25% weight): Years of experience and project complexity
3. Relevant Achievements (20% weight): Impact of past work (scaling, performance, adoption)
4. Cultural / Collaboration Fit (15% weight): Communication, learning mindset, teamwork/leadership

For each parameter, provide:
- A score from 1 to 5 based on the rubric
- A brief justification (1-2 sentences)

Then calculate:
- Weighted average score (as a decimal 0-1, rounded to 2 decimals)
- Overall feedback (2-3 sentences highlighting strengths and gaps)

Respond with JSON in this exact format:
{
  "technical_skills": {
    "score": <1-5>,
    "justification": "<text>"
  },
  "experience_level": {
    "score": <1-5>,
    "justification": "<text>"
  },
  "achievements": {
    "score": <1-5>,
    "justification": "<text>"
  },
  "cultural_fit": {
    "score": <1-5>,
    "justification": "<text>"
  },
  "cv_match_rate": <0.00-1.00>,
  "cv_feedback": "<text>"
}"#;

/// Builds the CV evaluation prompt with retrieved context substituted in.
pub fn build_cv_evaluation_prompt(
    cv_text: &str,
    job_description: &str,
    scoring_rubric: &str,
) -> String {
    CV_EVALUATION_TEMPLATE
        .replace("{job_description}", job_description)
        .replace("{scoring_rubric}", scoring_rubric)
        .replace("{cv_text}", truncate_chars(cv_text, MAX_CV_CHARS))
}

pub const PROJECT_EVALUATION_SYSTEM: &str = "You are an expert backend engineer and code reviewer. \
    Your job is to evaluate a candidate's project report against a case study brief and scoring rubric. \
    Focus on technical implementation quality, architectural decisions, and adherence to requirements. \
    Be objective and constructive. \
    Always respond with valid JSON only, no additional text.";

const PROJECT_EVALUATION_TEMPLATE: &str = r#"Evaluate the following candidate's project report against the case study brief and scoring rubric provided.

CASE STUDY BRIEF:
{case_study_brief}

SCORING RUBRIC:
{scoring_rubric}

CANDIDATE'S PROJECT REPORT:
{project_text}

Please evaluate the project on the following parameters (score each 1-5):
1. Correctness (30% weight): Implements prompt design, LLM chaining, RAG context injection correctly
2. Code Quality & Structure (25% weight): Clean, modular, reusable, tested
3. Resilience & Error Handling (20% weight): Handles long jobs, retries, randomness, API failures
4. Documentation & Explanation (15% weight): README clarity, setup instructions, trade-off explanations
5. Creativity / Bonus (10% weight): Extra features beyond requirements

For each parameter, provide:
- A score from 1 to 5 based on the rubric
- A brief justification (1-2 sentences)

Then calculate:
- Weighted average score (1-5 scale, rounded to 2 decimals)
- Overall feedback (2-3 sentences highlighting implementation quality and areas for improvement)

Respond with JSON in this exact format:
{
  "correctness": {
    "score": <1-5>,
    "justification": "<text>"
  },
  "code_quality": {
    "score": <1-5>,
    "justification": "<text>"
  },
  "resilience": {
    "score": <1-5>,
    "justification": "<text>"
  },
  "documentation": {
    "score": <1-5>,
    "justification": "<text>"
  },
  "creativity": {
    "score": <1-5>,
    "justification": "<text>"
  },
  "project_score": <1.00-5.00>,
  "project_feedback": "<text>"
}"#;

pub fn build_project_evaluation_prompt(
    project_text: &str,
    case_study_brief: &str,
    scoring_rubric: &str,
) -> String {
    PROJECT_EVALUATION_TEMPLATE
        .replace("{case_study_brief}", case_study_brief)
        .replace("{scoring_rubric}", scoring_rubric)
        .replace(
            "{project_text}",
            truncate_chars(project_text, MAX_REPORT_CHARS),
        )
}

pub const FINAL_AGGREGATION_SYSTEM: &str = "You are a senior technical hiring manager making final hiring decisions. \
    Your job is to synthesize CV and project evaluations into a comprehensive overall assessment. \
    Be balanced, fair, and actionable in your recommendations. \
    Focus on candidate potential and fit for the role. \
    Always respond with valid JSON only, no additional text.";

/// Builds the aggregation prompt from both stage outputs. Criterion lines
/// show 0/5 when a breakdown is absent.
pub fn build_final_aggregation_prompt(
    cv: &CvEvaluation,
    project: &ProjectEvaluation,
    job_title: &str,
) -> String {
    let criterion = |c: &Option<crate::evaluation::models::CriterionScore>| {
        c.as_ref().map(|c| c.score).unwrap_or(0.0)
    };

    format!(
        r#"Synthesize the following evaluation results into a final overall assessment for the position of {job_title}.

CV EVALUATION RESULTS:
- Match Rate: {match_rate}
- Feedback: {cv_feedback}
- Technical Skills: {technical_skills}/5
- Experience: {experience_level}/5
- Achievements: {achievements}/5
- Cultural Fit: {cultural_fit}/5

PROJECT EVALUATION RESULTS:
- Project Score: {project_score}/5
- Feedback: {project_feedback}
- Correctness: {correctness}/5
- Code Quality: {code_quality}/5
- Resilience: {resilience}/5
- Documentation: {documentation}/5
- Creativity: {creativity}/5

Based on these evaluations, provide:
1. An overall summary (3-5 sentences) that:
   - Highlights the candidate's key strengths
   - Identifies any notable gaps or areas for improvement
   - Provides a clear recommendation (strong fit / moderate fit / needs development / not recommended)
   - Mentions specific next steps or considerations

2. Calculate an overall score that weighs:
   - CV evaluation: 30% weight
   - Project evaluation: 70% weight

Respond with JSON in this exact format:
{{
  "overall_score": <1.00-5.00>,
  "overall_summary": "<text>",
  "recommendation": "<strong fit|moderate fit|needs development|not recommended>"
}}"#,
        job_title = job_title,
        match_rate = cv.cv_match_rate,
        cv_feedback = cv.cv_feedback,
        technical_skills = criterion(&cv.technical_skills),
        experience_level = criterion(&cv.experience_level),
        achievements = criterion(&cv.achievements),
        cultural_fit = criterion(&cv.cultural_fit),
        project_score = project.project_score,
        project_feedback = project.project_feedback,
        correctness = criterion(&project.correctness),
        code_quality = criterion(&project.code_quality),
        resilience = criterion(&project.resilience),
        documentation = criterion(&project.documentation),
        creativity = criterion(&project.creativity),
    )
}

/// Truncates to at most `max` characters without splitting a char boundary.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::models::CriterionScore;

    #[test]
    fn test_cv_prompt_substitutes_all_placeholders() {
        let prompt = build_cv_evaluation_prompt("CV BODY", "JD BODY", "RUBRIC BODY");
        assert!(prompt.contains("CV BODY"));
        assert!(prompt.contains("JD BODY"));
        assert!(prompt.contains("RUBRIC BODY"));
        assert!(!prompt.contains("{cv_text}"));
        assert!(!prompt.contains("{job_description}"));
        assert!(!prompt.contains("{scoring_rubric}"));
    }

    #[test]
    fn test_cv_prompt_truncates_long_cv() {
        let long_cv = "x".repeat(MAX_CV_CHARS + 500);
        let prompt = build_cv_evaluation_prompt(&long_cv, "", "");
        assert!(prompt.contains(&"x".repeat(MAX_CV_CHARS)));
        assert!(!prompt.contains(&"x".repeat(MAX_CV_CHARS + 1)));
    }

    #[test]
    fn test_cv_prompt_states_weights() {
        let prompt = build_cv_evaluation_prompt("", "", "");
        assert!(prompt.contains("40% weight"));
        assert!(prompt.contains("25% weight"));
        assert!(prompt.contains("20% weight"));
        assert!(prompt.contains("15% weight"));
    }

    #[test]
    fn test_project_prompt_states_weights() {
        let prompt = build_project_evaluation_prompt("", "", "");
        assert!(prompt.contains("30% weight"));
        assert!(prompt.contains("10% weight"));
    }

    #[test]
    fn test_aggregation_prompt_interpolates_scores() {
        let cv = CvEvaluation {
            technical_skills: Some(CriterionScore {
                score: 4.0,
                justification: String::new(),
            }),
            experience_level: None,
            achievements: None,
            cultural_fit: None,
            cv_match_rate: 0.8,
            cv_feedback: "Good fit.".to_string(),
        };
        let project = ProjectEvaluation {
            correctness: None,
            code_quality: None,
            resilience: None,
            documentation: None,
            creativity: None,
            project_score: 4.5,
            project_feedback: "Solid.".to_string(),
        };
        let prompt = build_final_aggregation_prompt(&cv, &project, "Backend Engineer");
        assert!(prompt.contains("Backend Engineer"));
        assert!(prompt.contains("Match Rate: 0.8"));
        assert!(prompt.contains("Technical Skills: 4/5"));
        assert!(prompt.contains("Experience: 0/5"));
        assert!(prompt.contains("Project Score: 4.5/5"));
        assert!(prompt.contains("CV evaluation: 30% weight"));
    }
}
