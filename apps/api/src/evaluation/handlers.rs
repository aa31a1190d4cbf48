//! Axum route handlers for the evaluation API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::evaluation::aggregate::EvaluatedAnswer;
use crate::evaluation::normalize::{normalize, EvaluateRequest};
use crate::evaluation::pipeline::evaluate_batch;
use crate::evaluation::store::{attempts_for_candidate, persist_evaluation, summaries_for_room};
use crate::models::attempt::{InterviewAttemptRow, InterviewSummaryRow};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub average: i32,
    pub summary: String,
    pub evaluations: Vec<EvaluatedAnswer>,
}

/// POST /evaluate
///
/// Full evaluation run: normalize → scoring model → parse → aggregate →
/// summary model (degradable) → persist. Validation and upstream failures
/// abort before anything is written; nothing is persisted for a failed run.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, AppError> {
    let batch = normalize(request)?;

    info!(
        "Evaluating {} answers for candidate {} in room {}",
        batch.answers.len(),
        batch.candidate_id,
        batch.room_code
    );

    let outcome = evaluate_batch(state.llm.as_ref(), &batch.answers).await?;

    persist_evaluation(&state.db, &batch.room_code, &batch.candidate_id, &outcome).await?;

    Ok(Json(EvaluateResponse {
        average: outcome.average,
        summary: outcome.summary,
        evaluations: outcome.evaluations,
    }))
}

/// GET /rooms/:room_code/summaries
///
/// Interviewer-side listing of the denormalized per-candidate summaries.
pub async fn handle_room_summaries(
    State(state): State<AppState>,
    Path(room_code): Path<String>,
) -> Result<Json<Vec<InterviewSummaryRow>>, AppError> {
    let summaries = summaries_for_room(&state.db, &room_code).await?;
    Ok(Json(summaries))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateQuery {
    pub candidate_id: String,
}

/// GET /rooms/:room_code/attempts?candidateId=...
///
/// Candidate-side attempt history, newest first.
pub async fn handle_candidate_attempts(
    State(state): State<AppState>,
    Path(room_code): Path<String>,
    Query(params): Query<CandidateQuery>,
) -> Result<Json<Vec<InterviewAttemptRow>>, AppError> {
    let attempts = attempts_for_candidate(&state.db, &room_code, &params.candidate_id).await?;
    Ok(Json(attempts))
}
