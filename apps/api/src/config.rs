use anyhow::{bail, Context, Result};

/// Which evaluation strategy the service runs with.
/// Selected once at startup via `EVAL_BACKEND`; both backends produce the
/// same result-record shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalBackend {
    /// Deterministic keyword-overlap scoring. Runs without any API key.
    Heuristic,
    /// LLM + RAG scoring via the Anthropic Messages API.
    Llm,
}

impl std::str::FromStr for EvalBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "heuristic" => Ok(EvalBackend::Heuristic),
            "llm" => Ok(EvalBackend::Llm),
            other => bail!("EVAL_BACKEND must be 'heuristic' or 'llm', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    /// Empty string disables the llm backend (jobs fail with an explanatory
    /// message if EVAL_BACKEND=llm is selected anyway).
    pub anthropic_api_key: String,
    /// OpenAI-compatible base URL for the embeddings endpoint.
    pub embeddings_api_url: String,
    pub embeddings_api_key: String,
    /// Directory holding job descriptions, the case-study brief, and
    /// scoring rubrics for RAG ingestion.
    pub system_docs_dir: String,
    pub eval_backend: EvalBackend,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            anthropic_api_key: std::env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            embeddings_api_url: std::env::var("EMBEDDINGS_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            embeddings_api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            system_docs_dir: std::env::var("SYSTEM_DOCS_DIR")
                .unwrap_or_else(|_| "./data/system_docs".to_string()),
            eval_backend: std::env::var("EVAL_BACKEND")
                .unwrap_or_else(|_| "heuristic".to_string())
                .parse()?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
