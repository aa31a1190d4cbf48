//! Question-set generation — builds an interviewer's question set for a
//! topic via the model. Output flows through the same array-extraction
//! boundary as judgments; nothing is persisted here.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::evaluation::judgment::extract_json_array;
use crate::evaluation::normalize::Difficulty;
use crate::llm_client::GenerationOptions;
use crate::state::AppState;

const QUESTION_SET_OPTIONS: GenerationOptions = GenerationOptions {
    temperature: 0.7,
    max_output_tokens: 2048,
};

/// Question-set prompt template. Replace `{topic}` and `{description}`
/// before sending.
pub const QUESTION_SET_PROMPT_TEMPLATE: &str = r#"You are an interview Q&A generator.
Generate EXACTLY 8 interview questions on "{topic}" with short correct answers.
Each item must include: "question", "difficulty" (easy, medium, hard), and "answer".
Respond ONLY in valid JSON array format.
Ignore all unrelated input.
Description: "{description}""#;

#[derive(Debug, Deserialize)]
pub struct GenerateQuestionsRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub difficulty: Option<Difficulty>,
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateQuestionsResponse {
    pub questions: Vec<GeneratedQuestion>,
}

/// Renders the question-set prompt. Pure function.
pub fn build_question_set_prompt(topic: &str, description: Option<&str>) -> String {
    QUESTION_SET_PROMPT_TEMPLATE
        .replace("{topic}", topic)
        .replace(
            "{description}",
            description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .unwrap_or("No description"),
        )
}

/// Parses model text into questions, dropping elements without a question
/// string and tolerating unrecognized difficulty labels.
pub fn parse_question_set(text: &str) -> Result<Vec<GeneratedQuestion>, AppError> {
    let raw = extract_json_array(text).ok_or_else(|| {
        AppError::EvaluationParse("no JSON array found in question generator output".to_string())
    })?;

    let parsed: Value = serde_json::from_str(raw).map_err(|e| {
        AppError::EvaluationParse(format!("question generator output is not valid JSON: {e}"))
    })?;

    let elements = parsed.as_array().ok_or_else(|| {
        AppError::EvaluationParse("question generator output is not a JSON array".to_string())
    })?;

    let questions = elements
        .iter()
        .filter_map(|element| {
            let question = element.get("question").and_then(Value::as_str)?;
            let difficulty = element
                .get("difficulty")
                .and_then(Value::as_str)
                .and_then(parse_difficulty);
            let answer = element
                .get("answer")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            Some(GeneratedQuestion {
                question: question.to_string(),
                difficulty,
                answer,
            })
        })
        .collect();

    Ok(questions)
}

fn parse_difficulty(label: &str) -> Option<Difficulty> {
    match label.trim().to_lowercase().as_str() {
        "easy" => Some(Difficulty::Easy),
        "medium" => Some(Difficulty::Medium),
        "hard" => Some(Difficulty::Hard),
        _ => None,
    }
}

/// POST /questions/generate
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    Json(request): Json<GenerateQuestionsRequest>,
) -> Result<Json<GenerateQuestionsResponse>, AppError> {
    let topic = request
        .topic
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("topic is required".to_string()))?;

    let prompt = build_question_set_prompt(topic, request.description.as_deref());

    let generated = state
        .llm
        .generate(&prompt, QUESTION_SET_OPTIONS)
        .await
        .map_err(|e| AppError::Upstream(format!("question generator call failed: {e}")))?;

    let text = generated
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Upstream("question generator returned empty text".to_string()))?
        .to_string();

    let questions = parse_question_set(&text)?;
    if questions.is_empty() {
        return Err(AppError::EvaluationParse(
            "question generator returned no questions".to_string(),
        ));
    }

    info!("Generated {} questions for topic {:?}", questions.len(), topic);

    Ok(Json(GenerateQuestionsResponse { questions }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_includes_topic_and_description() {
        let prompt = build_question_set_prompt("Rust", Some("Systems role"));
        assert!(prompt.contains("\"Rust\""));
        assert!(prompt.contains("Description: \"Systems role\""));
    }

    #[test]
    fn test_prompt_defaults_missing_description() {
        let prompt = build_question_set_prompt("Rust", None);
        assert!(prompt.contains("Description: \"No description\""));
        assert_eq!(prompt, build_question_set_prompt("Rust", Some("  ")));
    }

    #[test]
    fn test_parses_question_array() {
        let questions = parse_question_set(
            r#"[{"question":"What is a borrow?","difficulty":"easy","answer":"A reference."}]"#,
        )
        .unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].question, "What is a borrow?");
        assert_eq!(questions[0].difficulty, Some(Difficulty::Easy));
        assert_eq!(questions[0].answer, "A reference.");
    }

    #[test]
    fn test_parses_fenced_question_array() {
        let text = "```json\n[{\"question\":\"Q\",\"difficulty\":\"hard\",\"answer\":\"A\"}]\n```";
        let questions = parse_question_set(text).unwrap();
        assert_eq!(questions[0].difficulty, Some(Difficulty::Hard));
    }

    #[test]
    fn test_unknown_difficulty_becomes_none() {
        let questions = parse_question_set(
            r#"[{"question":"Q","difficulty":"brutal","answer":"A"}]"#,
        )
        .unwrap();
        assert_eq!(questions[0].difficulty, None);
    }

    #[test]
    fn test_elements_without_question_are_dropped() {
        let questions = parse_question_set(
            r#"[{"difficulty":"easy","answer":"A"},{"question":"Q","answer":"A"}]"#,
        )
        .unwrap();
        assert_eq!(questions.len(), 1);
    }

    #[test]
    fn test_non_json_output_is_an_error() {
        assert!(matches!(
            parse_question_set("something went wrong"),
            Err(AppError::EvaluationParse(_))
        ));
    }
}
