pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::evaluation::handlers as evaluation_handlers;
use crate::files::handlers as file_handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/upload", post(file_handlers::handle_upload))
        .route("/evaluate", post(evaluation_handlers::handle_evaluate))
        .route("/result/:id", get(evaluation_handlers::handle_result))
        .with_state(state)
}
