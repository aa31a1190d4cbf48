//! Persistence Writer — best-effort multi-write saga for one evaluation run.
//!
//! Writes are sequential and NOT wrapped in a transaction: participant
//! registration is check-then-insert (a concurrent double submission may
//! produce a benign duplicate row), the attempt insert is the fatal write,
//! and a summary-insert failure after a successful attempt insert surfaces
//! as an error while the attempt row stays behind.

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::pipeline::EvaluationOutcome;
use crate::models::attempt::{InterviewAttemptRow, InterviewSummaryRow};

/// Persists one evaluation run: participant marker, attempt row, summary row.
/// Returns the id of the new attempt.
pub async fn persist_evaluation(
    pool: &PgPool,
    room_code: &str,
    candidate_id: &str,
    outcome: &EvaluationOutcome,
) -> Result<Uuid, AppError> {
    ensure_participant(pool, room_code, candidate_id).await;

    let attempt_id = insert_attempt(pool, room_code, candidate_id, outcome).await?;

    let participant_name = lookup_participant_name(pool, candidate_id).await;
    insert_summary(pool, room_code, candidate_id, &participant_name, outcome).await?;

    info!(
        "Persisted attempt {attempt_id} for candidate {candidate_id} in room {room_code} \
         (score {})",
        outcome.average
    );

    Ok(attempt_id)
}

/// Registers the candidate in the room on first submission.
///
/// Check-then-insert by design: two concurrent first submissions can both
/// pass the existence check and both insert. The duplicate row is accepted;
/// an insert failure here is logged and never fails the run.
async fn ensure_participant(pool: &PgPool, room_code: &str, candidate_id: &str) {
    let existing = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM room_participants WHERE room_code = $1 AND user_id = $2 LIMIT 1",
    )
    .bind(room_code)
    .bind(candidate_id)
    .fetch_optional(pool)
    .await;

    match existing {
        Ok(Some(_)) => {}
        Ok(None) => {
            let inserted = sqlx::query(
                "INSERT INTO room_participants (id, room_code, user_id) VALUES ($1, $2, $3)",
            )
            .bind(Uuid::new_v4())
            .bind(room_code)
            .bind(candidate_id)
            .execute(pool)
            .await;

            if let Err(e) = inserted {
                warn!("Failed to register participant {candidate_id} in room {room_code}: {e}");
            }
        }
        Err(e) => {
            warn!("Participant lookup failed for {candidate_id} in room {room_code}: {e}");
        }
    }
}

/// Inserts the attempt row. This is the fatal write: failure aborts the run
/// before the summary is attempted.
async fn insert_attempt(
    pool: &PgPool,
    room_code: &str,
    candidate_id: &str,
    outcome: &EvaluationOutcome,
) -> Result<Uuid, AppError> {
    let attempt_id = Uuid::new_v4();
    let answers = serde_json::to_value(&outcome.evaluations)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize evaluations: {e}")))?;

    sqlx::query(
        r#"
        INSERT INTO interview_attempts
            (id, room_code, candidate_id, answers, overall_score, overall_feedback)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(attempt_id)
    .bind(room_code)
    .bind(candidate_id)
    .bind(&answers)
    .bind(outcome.average)
    .bind(&outcome.summary)
    .execute(pool)
    .await?;

    Ok(attempt_id)
}

/// Resolves the candidate's display name from the profile table.
/// Lookup failure or a missing profile falls back to "Unknown".
async fn lookup_participant_name(pool: &PgPool, candidate_id: &str) -> String {
    let name = sqlx::query_scalar::<_, String>("SELECT name FROM users WHERE id = $1")
        .bind(candidate_id)
        .fetch_optional(pool)
        .await;

    match name {
        Ok(Some(name)) => name,
        Ok(None) => "Unknown".to_string(),
        Err(e) => {
            warn!("Profile lookup failed for candidate {candidate_id}: {e}");
            "Unknown".to_string()
        }
    }
}

async fn insert_summary(
    pool: &PgPool,
    room_code: &str,
    candidate_id: &str,
    participant_name: &str,
    outcome: &EvaluationOutcome,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO interview_summaries
            (id, room_code, candidate_id, participant_name, final_score, summary)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(room_code)
    .bind(candidate_id)
    .bind(participant_name)
    .bind(outcome.average)
    .bind(&outcome.summary)
    .execute(pool)
    .await
    .map_err(|e| {
        // The attempt row is already committed at this point; report the
        // summary failure distinctly instead of pretending atomicity.
        tracing::error!(
            "Summary insert failed for candidate {candidate_id} in room {room_code} \
             (attempt row remains): {e}"
        );
        AppError::Database(e)
    })?;

    Ok(())
}

/// Newest-first summaries for a room (interviewer listing).
pub async fn summaries_for_room(
    pool: &PgPool,
    room_code: &str,
) -> Result<Vec<InterviewSummaryRow>, AppError> {
    let rows = sqlx::query_as::<_, InterviewSummaryRow>(
        "SELECT * FROM interview_summaries WHERE room_code = $1 ORDER BY created_at DESC",
    )
    .bind(room_code)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Newest-first attempt history for a candidate in a room.
pub async fn attempts_for_candidate(
    pool: &PgPool,
    room_code: &str,
    candidate_id: &str,
) -> Result<Vec<InterviewAttemptRow>, AppError> {
    let rows = sqlx::query_as::<_, InterviewAttemptRow>(
        r#"
        SELECT * FROM interview_attempts
        WHERE room_code = $1 AND candidate_id = $2
        ORDER BY created_at DESC
        "#,
    )
    .bind(room_code)
    .bind(candidate_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
