//! Evaluation pipeline — orchestrates the model-facing half of a run.
//!
//! Flow: build evaluation prompt → scoring model call → parse judgments →
//!       merge/aggregate → summary model call (degradable) → outcome.
//!
//! Persistence is composed separately by the handler so this stage can be
//! exercised end to end with scripted `TextGenerator` stubs.

use tracing::{info, warn};

use crate::errors::AppError;
use crate::evaluation::aggregate::{merge_judgments, EvaluatedAnswer};
use crate::evaluation::judgment::parse_judgments;
use crate::evaluation::normalize::NormalizedAnswer;
use crate::evaluation::prompts::{build_evaluation_prompt, build_summary_prompt};
use crate::llm_client::{GenerationOptions, TextGenerator};

/// Low temperature biases the scoring call toward literal format compliance.
const EVALUATION_OPTIONS: GenerationOptions = GenerationOptions {
    temperature: 0.3,
    max_output_tokens: 2000,
};

const SUMMARY_OPTIONS: GenerationOptions = GenerationOptions {
    temperature: 0.4,
    max_output_tokens: 512,
};

/// Result of one evaluation run, ready for persistence and response.
#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    pub average: i32,
    pub summary: String,
    pub evaluations: Vec<EvaluatedAnswer>,
}

/// Runs the model-facing pipeline for a normalized batch.
///
/// A scoring-call failure or unusable response aborts the run; a
/// summary-call failure degrades to a deterministic fallback string and the
/// run continues.
pub async fn evaluate_batch(
    llm: &dyn TextGenerator,
    answers: &[NormalizedAnswer],
) -> Result<EvaluationOutcome, AppError> {
    let prompt = build_evaluation_prompt(answers);

    let generated = llm
        .generate(&prompt, EVALUATION_OPTIONS)
        .await
        .map_err(|e| AppError::Upstream(format!("scoring model call failed: {e}")))?;

    let text = generated
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Upstream("scoring model returned empty text".to_string()))?
        .to_string();

    let judgments = parse_judgments(&text)?;
    if judgments.is_empty() {
        return Err(AppError::EvaluationParse(
            "scoring model returned an empty judgment array".to_string(),
        ));
    }

    let aggregated = merge_judgments(answers, &judgments);
    info!(
        "Evaluated {} answers ({} judged), overall score {}",
        answers.len(),
        judgments.len(),
        aggregated.overall_score
    );

    let summary = summarize(llm, &aggregated.evaluations, aggregated.overall_score).await;

    Ok(EvaluationOutcome {
        average: aggregated.overall_score,
        summary,
        evaluations: aggregated.evaluations,
    })
}

/// Requests the one-paragraph performance summary. Never fails: any model
/// error or empty response degrades to the deterministic fallback.
async fn summarize(
    llm: &dyn TextGenerator,
    evaluations: &[EvaluatedAnswer],
    overall_score: i32,
) -> String {
    let prompt = build_summary_prompt(evaluations);

    match llm.generate(&prompt, SUMMARY_OPTIONS).await {
        Ok(generated) => match generated.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => {
                warn!("Summary model returned empty text, using fallback summary");
                fallback_summary(overall_score)
            }
        },
        Err(e) => {
            warn!("Summary model call failed ({e}), using fallback summary");
            fallback_summary(overall_score)
        }
    }
}

fn fallback_summary(overall_score: i32) -> String {
    format!("AI evaluation completed. Average score: {overall_score}/100.")
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::evaluation::aggregate::NO_EVALUATION_FEEDBACK;
    use crate::llm_client::{GeneratedText, LlmError};

    /// Replays a scripted sequence of model responses, one per call.
    struct ScriptedGenerator {
        responses: Mutex<VecDeque<Result<Option<String>, LlmError>>>,
    }

    impl ScriptedGenerator {
        fn new(responses: Vec<Result<Option<String>, LlmError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _options: GenerationOptions,
        ) -> Result<GeneratedText, LlmError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("scripted generator ran out of responses")
                .map(|text| GeneratedText { text })
        }
    }

    fn upstream_failure() -> LlmError {
        LlmError::Api {
            status: 503,
            message: "unavailable".to_string(),
        }
    }

    fn answer(question_text: &str, content: &str) -> NormalizedAnswer {
        NormalizedAnswer {
            question_id: None,
            question_text: question_text.to_string(),
            difficulty: None,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_full_run_with_scoring_and_summary() {
        let llm = ScriptedGenerator::new(vec![
            Ok(Some(
                r#"[{"index":0,"score":90,"feedback":"Correct and concise."}]"#.to_string(),
            )),
            Ok(Some("Strong grasp of fundamentals.".to_string())),
        ]);
        let answers = vec![answer("What is a closure?", "A function with retained scope.")];

        let outcome = evaluate_batch(&llm, &answers).await.unwrap();

        assert_eq!(outcome.average, 90);
        assert_eq!(outcome.summary, "Strong grasp of fundamentals.");
        assert_eq!(outcome.evaluations.len(), 1);
        assert_eq!(outcome.evaluations[0].score, Some(90));
        assert_eq!(outcome.evaluations[0].feedback, "Correct and concise.");
    }

    #[tokio::test]
    async fn test_scoring_call_failure_aborts_run() {
        let llm = ScriptedGenerator::new(vec![Err(upstream_failure())]);
        let answers = vec![answer("Q", "A")];

        let result = evaluate_batch(&llm, &answers).await;
        assert!(matches!(result, Err(AppError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_empty_scoring_text_aborts_run() {
        let llm = ScriptedGenerator::new(vec![Ok(None)]);
        let answers = vec![answer("Q", "A")];

        let result = evaluate_batch(&llm, &answers).await;
        assert!(matches!(result, Err(AppError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_unparsable_scoring_text_aborts_run() {
        let llm = ScriptedGenerator::new(vec![Ok(Some("not json".to_string()))]);
        let answers = vec![answer("Q", "A")];

        let result = evaluate_batch(&llm, &answers).await;
        assert!(matches!(result, Err(AppError::EvaluationParse(_))));
    }

    #[tokio::test]
    async fn test_empty_judgment_array_aborts_run() {
        let llm = ScriptedGenerator::new(vec![Ok(Some("[]".to_string()))]);
        let answers = vec![answer("Q", "A")];

        let result = evaluate_batch(&llm, &answers).await;
        assert!(matches!(result, Err(AppError::EvaluationParse(_))));
    }

    #[tokio::test]
    async fn test_markdown_fenced_scoring_output_is_accepted() {
        let llm = ScriptedGenerator::new(vec![
            Ok(Some(
                "```json\n[{\"index\":0,\"score\":70,\"feedback\":\"Fine.\"}]\n```".to_string(),
            )),
            Ok(Some("A fine performance.".to_string())),
        ]);
        let answers = vec![answer("Q", "A")];

        let outcome = evaluate_batch(&llm, &answers).await.unwrap();
        assert_eq!(outcome.average, 70);
        assert_eq!(outcome.evaluations[0].feedback, "Fine.");
    }

    #[tokio::test]
    async fn test_summary_failure_degrades_to_fallback() {
        let llm = ScriptedGenerator::new(vec![
            Ok(Some(
                r#"[{"index":0,"score":75,"feedback":"Decent."}]"#.to_string(),
            )),
            Err(upstream_failure()),
        ]);
        let answers = vec![answer("Q", "A")];

        let outcome = evaluate_batch(&llm, &answers).await.unwrap();
        assert_eq!(outcome.average, 75);
        assert_eq!(outcome.summary, "AI evaluation completed. Average score: 75/100.");
    }

    #[tokio::test]
    async fn test_empty_summary_text_degrades_to_fallback() {
        let llm = ScriptedGenerator::new(vec![
            Ok(Some(
                r#"[{"index":0,"score":60,"feedback":"Ok."}]"#.to_string(),
            )),
            Ok(Some("   ".to_string())),
        ]);
        let answers = vec![answer("Q", "A")];

        let outcome = evaluate_batch(&llm, &answers).await.unwrap();
        assert_eq!(outcome.summary, "AI evaluation completed. Average score: 60/100.");
    }

    #[tokio::test]
    async fn test_out_of_range_judgment_leaves_position_unscored() {
        let llm = ScriptedGenerator::new(vec![
            Ok(Some(
                r#"[{"index":0,"score":80,"feedback":"a"},{"index":99,"score":100,"feedback":"phantom"}]"#
                    .to_string(),
            )),
            Ok(Some("Summary.".to_string())),
        ]);
        let answers = vec![answer("Q0", "A0"), answer("Q1", "A1")];

        let outcome = evaluate_batch(&llm, &answers).await.unwrap();
        assert_eq!(outcome.evaluations.len(), 2);
        assert_eq!(outcome.evaluations[1].score, None);
        assert_eq!(outcome.evaluations[1].feedback, NO_EVALUATION_FEEDBACK);
        assert_eq!(outcome.average, 80);
    }
}
