//! Answer Normalizer — validates and shapes a raw submission batch into
//! canonical answer records before any model call is made.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;

/// Question difficulty as labelled by the interviewer's question set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// One answer as submitted by the candidate client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAnswer {
    #[serde(default)]
    pub question_id: Option<String>,
    #[serde(default)]
    pub question_text: String,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub content: String,
}

/// Request body for POST /evaluate. All fields are lenient at the wire
/// level — `answers` stays raw JSON — so a missing or mistyped field
/// surfaces as a 400 from validation rather than an extractor rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    #[serde(default)]
    pub candidate_id: Option<String>,
    #[serde(default)]
    pub room_code: Option<String>,
    #[serde(default)]
    pub answers: Value,
}

/// A validated answer record. Immutable once produced; the rest of the
/// pipeline addresses these by position in the batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedAnswer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    pub question_text: String,
    pub difficulty: Option<Difficulty>,
    pub content: String,
}

/// A validated submission batch.
#[derive(Debug)]
pub struct NormalizedBatch {
    pub candidate_id: String,
    pub room_code: String,
    pub answers: Vec<NormalizedAnswer>,
}

/// Validates the raw request and trims answer text.
///
/// Empty `content` is NOT rejected: a skipped question is representable and
/// the model may score it poorly, but the pipeline must not refuse it.
pub fn normalize(request: EvaluateRequest) -> Result<NormalizedBatch, AppError> {
    let candidate_id = request
        .candidate_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("candidateId is required".to_string()))?
        .to_string();

    let room_code = request
        .room_code
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("roomCode is required".to_string()))?
        .to_string();

    let raw_answers = parse_answers(request.answers)?;

    let answers = raw_answers
        .into_iter()
        .map(|a| NormalizedAnswer {
            question_id: a.question_id,
            question_text: a.question_text.trim().to_string(),
            difficulty: a.difficulty,
            content: a.content.trim().to_string(),
        })
        .collect();

    Ok(NormalizedBatch {
        candidate_id,
        room_code,
        answers,
    })
}

/// Accepts only a non-empty JSON array of answer objects. Anything else —
/// absent, a scalar, an object, an empty array, or a malformed element —
/// is a validation error, never a 422.
fn parse_answers(answers: Value) -> Result<Vec<RawAnswer>, AppError> {
    let items = match answers {
        Value::Array(items) => items,
        Value::Null => {
            return Err(AppError::Validation(
                "answers array is required".to_string(),
            ))
        }
        _ => {
            return Err(AppError::Validation(
                "answers must be an array".to_string(),
            ))
        }
    };

    if items.is_empty() {
        return Err(AppError::Validation(
            "answers array must not be empty".to_string(),
        ));
    }

    items
        .into_iter()
        .map(serde_json::from_value)
        .collect::<Result<Vec<RawAnswer>, _>>()
        .map_err(|e| AppError::Validation(format!("answers array is malformed: {e}")))
}
