//! Prompt constants and builders for the evaluation pipeline.
//!
//! Both builders are pure functions: same input, same prompt text, byte for
//! byte. The evaluation prompt joins answers by zero-based position because
//! the model is not trusted to echo opaque question ids faithfully; judgments
//! are re-joined by that same position downstream.

use crate::evaluation::aggregate::EvaluatedAnswer;
use crate::evaluation::normalize::NormalizedAnswer;

/// Evaluation prompt template. Replace `{count}` and `{answers}` before
/// sending. Sent at low temperature to bias toward literal compliance.
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"IMPORTANT: Respond with ONLY the JSON array described below. No other text, no explanations, no markdown formatting.

Evaluate the following {count} interview answers on a scale of 0-100.

Return a JSON array with EXACTLY {count} objects, one per answer, in the same order as the answers below:
[
  { "index": 0, "score": 85, "feedback": "Detailed reasoning here." }
]

"index" is the zero-based question number as given below.

ANSWERS:
{answers}"#;

/// Summary prompt template. Replace `{answers}` before sending.
pub const SUMMARY_PROMPT_TEMPLATE: &str = r#"You are reviewing a candidate's interview performance.

Write EXACTLY one plain-text paragraph assessing the candidate's overall knowledge, clarity, strengths and weaknesses. No JSON, no markdown, no lists, no headings.

GRADED ANSWERS:
{answers}"#;

/// Renders the normalized batch into the evaluation prompt.
pub fn build_evaluation_prompt(answers: &[NormalizedAnswer]) -> String {
    let rendered = answers
        .iter()
        .enumerate()
        .map(|(i, a)| format!("Question {i}: {}\nAnswer: {}", a.question_text, a.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    EVALUATION_PROMPT_TEMPLATE
        .replace("{count}", &answers.len().to_string())
        .replace("{answers}", &rendered)
}

/// Renders the graded batch into the summary prompt.
pub fn build_summary_prompt(evaluations: &[EvaluatedAnswer]) -> String {
    let rendered = evaluations
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let score = match e.score {
                Some(s) => format!("{s}/100"),
                None => "not evaluated".to_string(),
            };
            format!(
                "Question {i}: {}\nAnswer: {}\nScore: {score}\nFeedback: {}",
                e.question_text, e.content, e.feedback
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    SUMMARY_PROMPT_TEMPLATE.replace("{answers}", &rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(question_text: &str, content: &str) -> NormalizedAnswer {
        NormalizedAnswer {
            question_id: None,
            question_text: question_text.to_string(),
            difficulty: None,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_evaluation_prompt_is_deterministic() {
        let answers = vec![answer("What is Rust?", "A language."), answer("Why?", "")];
        assert_eq!(
            build_evaluation_prompt(&answers),
            build_evaluation_prompt(&answers)
        );
    }

    #[test]
    fn test_evaluation_prompt_renders_each_answer_by_position() {
        let answers = vec![
            answer("What is a closure?", "A function with retained scope."),
            answer("What is ownership?", "Move semantics."),
        ];
        let prompt = build_evaluation_prompt(&answers);
        assert!(prompt.contains("Question 0: What is a closure?\nAnswer: A function with retained scope."));
        assert!(prompt.contains("Question 1: What is ownership?\nAnswer: Move semantics."));
        assert!(prompt.contains("EXACTLY 2 objects"));
    }

    #[test]
    fn test_summary_prompt_reports_unevaluated_answers() {
        let evaluations = vec![EvaluatedAnswer {
            question_id: None,
            question_text: "Q".to_string(),
            difficulty: None,
            content: "A".to_string(),
            score: None,
            feedback: "No evaluation available.".to_string(),
        }];
        let prompt = build_summary_prompt(&evaluations);
        assert!(prompt.contains("Score: not evaluated"));
    }

    #[test]
    fn test_summary_prompt_includes_scores() {
        let evaluations = vec![EvaluatedAnswer {
            question_id: None,
            question_text: "Q".to_string(),
            difficulty: None,
            content: "A".to_string(),
            score: Some(90),
            feedback: "Good.".to_string(),
        }];
        let prompt = build_summary_prompt(&evaluations);
        assert!(prompt.contains("Score: 90/100"));
        assert!(prompt.contains("Feedback: Good."));
    }
}
