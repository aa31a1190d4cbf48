//! Score Aggregator — merges parsed judgments back onto the submitted
//! answers by position and computes the overall score.
//!
//! This step never fails: every submitted answer gets a slot in the output
//! whether or not the model judged it.

use serde::{Deserialize, Serialize};

use crate::evaluation::judgment::Judgment;
use crate::evaluation::normalize::{Difficulty, NormalizedAnswer};

/// Feedback substituted for answers the model did not judge.
pub const NO_EVALUATION_FEEDBACK: &str = "No evaluation available.";

/// A submitted answer merged with its judgment. `score` is `None` only when
/// no judgment matched this position; null and "not evaluated" are the same
/// state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatedAnswer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    pub question_text: String,
    pub difficulty: Option<Difficulty>,
    pub content: String,
    pub score: Option<i32>,
    pub feedback: String,
}

/// Output of the merge: one evaluation per submitted answer, in submission
/// order, plus the rounded mean of all non-null scores (0 if none).
#[derive(Debug, Clone)]
pub struct AggregateResult {
    pub evaluations: Vec<EvaluatedAnswer>,
    pub overall_score: i32,
}

/// Merges judgments onto answers by position.
///
/// For each position, the LAST judgment carrying that index wins. Judgments
/// whose index matches no position are ignored. Matched scores are clamped
/// to [0, 100] and rounded to the nearest integer.
pub fn merge_judgments(answers: &[NormalizedAnswer], judgments: &[Judgment]) -> AggregateResult {
    let evaluations: Vec<EvaluatedAnswer> = answers
        .iter()
        .enumerate()
        .map(|(i, answer)| {
            let matched = judgments.iter().rev().find(|j| j.index == i);
            let (score, feedback) = match matched {
                Some(j) => (
                    Some(j.score.clamp(0.0, 100.0).round() as i32),
                    j.feedback.clone(),
                ),
                None => (None, NO_EVALUATION_FEEDBACK.to_string()),
            };
            EvaluatedAnswer {
                question_id: answer.question_id.clone(),
                question_text: answer.question_text.clone(),
                difficulty: answer.difficulty,
                content: answer.content.clone(),
                score,
                feedback,
            }
        })
        .collect();

    let scores: Vec<i32> = evaluations.iter().filter_map(|e| e.score).collect();
    let overall_score = if scores.is_empty() {
        0
    } else {
        (scores.iter().sum::<i32>() as f64 / scores.len() as f64).round() as i32
    };

    AggregateResult {
        evaluations,
        overall_score,
    }
}
