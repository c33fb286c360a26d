mod config;
mod db;
mod errors;
mod evaluation;
mod files;
mod llm_client;
mod models;
mod rag;
mod routes;
mod state;
mod worker;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, EvalBackend};
use crate::db::create_pool;
use crate::evaluation::heuristic::HeuristicEvaluator;
use crate::evaluation::llm::LlmEvaluator;
use crate::evaluation::strategy::Evaluator;
use crate::llm_client::LlmClient;
use crate::rag::embeddings::EmbeddingClient;
use crate::rag::store::ContextStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Sift API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (pool + migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis (job queue transport)
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Initialize S3 / MinIO (uploaded documents)
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    // Context store shared by ingestion and retrieval
    let embedder = EmbeddingClient::new(
        config.embeddings_api_url.clone(),
        config.embeddings_api_key.clone(),
    );
    let context = Arc::new(ContextStore::new(embedder));

    // Evaluation backend (swap via EVAL_BACKEND)
    let docs_dir = PathBuf::from(&config.system_docs_dir);
    let evaluator: Arc<dyn Evaluator> = match config.eval_backend {
        EvalBackend::Heuristic => Arc::new(HeuristicEvaluator::new(context.clone(), docs_dir)),
        EvalBackend::Llm => {
            let llm = LlmClient::new(config.anthropic_api_key.clone());
            if llm.available() {
                info!("LLM client initialized (model: {})", llm_client::MODEL);
            } else {
                info!("EVAL_BACKEND=llm but no API key is set; jobs will fail until one is");
            }
            Arc::new(LlmEvaluator::new(llm, context.clone(), docs_dir))
        }
    };
    info!("Evaluation backend: {}", evaluator.backend());

    // Build app state
    let state = AppState {
        db,
        redis,
        s3,
        config: config.clone(),
        evaluator,
    };

    // Start the queue worker alongside the HTTP server
    tokio::spawn(worker::run(state.clone()));

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "sift-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
