use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::config::Config;
use crate::evaluation::strategy::Evaluator;

/// Shared application state injected into route handlers and the worker.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Job queue transport; the worker loop pops what /evaluate pushes.
    pub redis: RedisClient,
    pub s3: S3Client,
    pub config: Config,
    /// Pluggable evaluation backend, chosen at startup via EVAL_BACKEND.
    /// Owns its own LLM / context-store handles — no global singletons.
    pub evaluator: Arc<dyn Evaluator>,
}
