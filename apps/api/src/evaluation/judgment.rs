//! Judgment Parser — the trust boundary for scoring-model output.
//!
//! Model text is free-form: it may wrap the JSON array in markdown fences or
//! surround it with prose. The parser extracts the outermost `[...]`
//! substring, parses it, and coerces each element field by field. Nothing
//! past this boundary ever sees unchecked model output.

use serde_json::Value;

use crate::errors::AppError;

/// The model's per-answer verdict, addressed by position in the submitted
/// batch. Ephemeral: exists only to join model output back onto answers.
#[derive(Debug, Clone, PartialEq)]
pub struct Judgment {
    pub index: usize,
    pub score: f64,
    pub feedback: String,
}

/// Extracts the outermost JSON-array-shaped substring from free-form text.
///
/// This deliberately ignores everything outside the brackets, which handles
/// markdown code fences and leading/trailing prose in one pass.
pub(crate) fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parses scoring-model text into judgments.
///
/// Coercion rules, per element:
/// - `index`: numeric cast to an integer position; non-numeric or negative
///   drops the element entirely.
/// - `score`: numeric, defaulting to 0 when absent or non-numeric.
/// - `feedback`: string, defaulting to empty when absent or non-string.
///
/// Out-of-range and duplicate indexes are kept here; the aggregator ignores
/// the former and resolves the latter (last occurrence wins).
pub fn parse_judgments(text: &str) -> Result<Vec<Judgment>, AppError> {
    let raw = extract_json_array(text).ok_or_else(|| {
        AppError::EvaluationParse(format!(
            "no JSON array found in model output: {:?}",
            text.chars().take(120).collect::<String>()
        ))
    })?;

    let parsed: Value = serde_json::from_str(raw)
        .map_err(|e| AppError::EvaluationParse(format!("model output is not valid JSON: {e}")))?;

    let elements = parsed
        .as_array()
        .ok_or_else(|| AppError::EvaluationParse("model output is not a JSON array".to_string()))?;

    let judgments = elements
        .iter()
        .filter_map(|element| {
            let index = element.get("index").and_then(Value::as_f64)?;
            if !index.is_finite() || index < 0.0 {
                return None;
            }
            let score = element
                .get("score")
                .and_then(Value::as_f64)
                .filter(|s| s.is_finite())
                .unwrap_or(0.0);
            let feedback = element
                .get("feedback")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            Some(Judgment {
                index: index as usize,
                score,
                feedback,
            })
        })
        .collect();

    Ok(judgments)
}
