use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// One full submission-and-evaluation run by a candidate for a room.
/// Append-only: a candidate may accumulate multiple attempts per room, and a
/// persisted attempt is never mutated. `answers` holds the evaluated answers
/// as JSON, in submission order.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewAttemptRow {
    pub id: Uuid,
    pub room_code: String,
    pub candidate_id: String,
    pub answers: Value,
    pub overall_score: i32,
    pub overall_feedback: String,
    pub created_at: DateTime<Utc>,
}

/// Denormalized projection of an attempt, carrying the participant's display
/// name so interviewer-side listings need no join against user profiles.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewSummaryRow {
    pub id: Uuid,
    pub room_code: String,
    pub candidate_id: String,
    pub participant_name: String,
    pub final_score: i32,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}
