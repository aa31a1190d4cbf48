pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::evaluation::handlers;
use crate::questions;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Evaluation pipeline
        .route("/evaluate", post(handlers::handle_evaluate))
        // Read side
        .route(
            "/rooms/:room_code/summaries",
            get(handlers::handle_room_summaries),
        )
        .route(
            "/rooms/:room_code/attempts",
            get(handlers::handle_candidate_attempts),
        )
        // Question-set generation
        .route(
            "/questions/generate",
            post(questions::handle_generate_questions),
        )
        .with_state(state)
}
