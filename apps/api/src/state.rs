use std::sync::Arc;

use sqlx::PgPool;

use crate::llm_client::TextGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// The model client is carried as `Arc<dyn TextGenerator>` so handlers and the
/// evaluation pipeline depend on the request/response contract, never on a
/// concrete API backend.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: Arc<dyn TextGenerator>,
}
