// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Number of options every question carries.
pub const OPTION_COUNT: usize = 4;

/// Represents the 'questions' table in the database.
/// Carries the answer key, so it is never serialized to clients directly.
#[derive(Debug, Clone, FromRow)]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,

    /// Display order inside the quiz (0-based).
    pub position: i32,

    pub text: String,

    /// Exactly four option strings, stored as a JSON array.
    pub options: Json<Vec<String>>,

    /// 1-based index into `options`.
    pub correct_option: i32,

    pub explanation: Option<String>,

    pub image_url: Option<String>,
}

/// DTO for sending question to client (excludes correct option and explanation).
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub position: i32,
    pub text: String,
    pub options: Vec<String>,
    pub image_url: Option<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            position: q.position,
            text: q.text.clone(),
            options: q.options.0.clone(),
            image_url: q.image_url.clone(),
        }
    }
}

/// DTO for authoring a question as part of a quiz.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(range(min = 1, max = 4, message = "correct_option must be between 1 and 4"))]
    pub correct_option: i32,
    #[validate(length(max = 4000))]
    pub explanation: Option<String>,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub image_url: Option<String>,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() != OPTION_COUNT {
        return Err(validator::ValidationError::new("exactly_four_options_required"));
    }
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    if url::Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(options: Vec<&str>, correct_option: i32) -> CreateQuestionRequest {
        CreateQuestionRequest {
            text: "Which one?".to_string(),
            options: options.into_iter().map(String::from).collect(),
            correct_option,
            explanation: None,
            image_url: None,
        }
    }

    #[test]
    fn test_question_requires_four_options() {
        assert!(request(vec!["a", "b", "c", "d"], 2).validate().is_ok());
        assert!(request(vec!["a", "b", "c"], 2).validate().is_err());
    }

    #[test]
    fn test_correct_option_range() {
        assert!(request(vec!["a", "b", "c", "d"], 0).validate().is_err());
        assert!(request(vec!["a", "b", "c", "d"], 5).validate().is_err());
    }

    #[test]
    fn test_image_url_must_parse() {
        let mut req = request(vec!["a", "b", "c", "d"], 1);
        req.image_url = Some("not a url".to_string());
        assert!(req.validate().is_err());
        req.image_url = Some("https://cdn.example.com/q1.png".to_string());
        assert!(req.validate().is_ok());
    }
}
