// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use crate::models::question::{CreateQuestionRequest, PublicQuestion, Question};
use crate::services::access::AccessDecision;

/// Represents the 'quizzes' table, with its questions attached in display order.
#[derive(Debug, Clone, FromRow)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub subject: Option<String>,
    pub exam_year: Option<i32>,

    /// Inactive quizzes are hidden from every public read path.
    pub is_active: bool,

    pub is_paid: bool,
    pub price_cents: i64,

    pub negative_marking: bool,

    /// Per-wrong penalty. Falls back to the configured default when unset.
    pub negative_mark: Option<f64>,

    pub created_at: chrono::DateTime<chrono::Utc>,

    #[sqlx(skip)]
    pub questions: Vec<Question>,
}

impl Quiz {
    /// Price a buyer is charged. Free quizzes never cost anything, whatever the column says.
    pub fn effective_price_cents(&self) -> i64 {
        if self.is_paid { self.price_cents } else { 0 }
    }
}

/// Listing view of a quiz, without questions.
#[derive(Debug, Clone, Serialize)]
pub struct QuizSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub subject: Option<String>,
    pub exam_year: Option<i32>,
    pub is_active: bool,
    pub is_paid: bool,
    pub price_cents: i64,
    pub negative_marking: bool,
    pub question_count: usize,
}

impl From<&Quiz> for QuizSummary {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            subject: quiz.subject.clone(),
            exam_year: quiz.exam_year,
            is_active: quiz.is_active,
            is_paid: quiz.is_paid,
            price_cents: quiz.effective_price_cents(),
            negative_marking: quiz.negative_marking,
            question_count: quiz.questions.len(),
        }
    }
}

/// Quiz detail as seen by a particular viewer.
/// `questions` is only populated when access was granted.
#[derive(Debug, Serialize)]
pub struct QuizDetailResponse {
    #[serde(flatten)]
    pub quiz: QuizSummary,
    pub access: AccessDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<PublicQuestion>>,
}

/// DTO for authoring a quiz with its questions.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = validate_pricing))]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 10000))]
    #[serde(default)]
    pub description: String,
    #[validate(length(max = 100))]
    pub subject: Option<String>,
    #[validate(range(min = 1900, max = 2100))]
    pub exam_year: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub price_cents: i64,
    #[serde(default)]
    pub negative_marking: bool,
    #[validate(range(min = 0.0, max = 1.0))]
    pub negative_mark: Option<f64>,
    #[validate(length(min = 1, max = 500), nested)]
    pub questions: Vec<CreateQuestionRequest>,
}

fn default_true() -> bool {
    true
}

/// A paid quiz needs a positive price, a free one must not carry one.
fn validate_pricing(req: &CreateQuizRequest) -> Result<(), ValidationError> {
    if req.is_paid && req.price_cents <= 0 {
        return Err(ValidationError::new("paid_quiz_requires_price"));
    }
    if !req.is_paid && req.price_cents != 0 {
        return Err(ValidationError::new("free_quiz_cannot_have_price"));
    }
    Ok(())
}

/// DTO for toggling quiz visibility.
#[derive(Debug, Deserialize)]
pub struct UpdateQuizStatusRequest {
    pub is_active: bool,
}
