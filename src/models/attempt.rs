// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};

/// One `(question, option)` pair as the client sent it.
/// `selected_option` of `None` or `0` marks the question as left blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    #[serde(default)]
    pub selected_option: Option<i32>,
}

/// Per-question outcome. Discloses the answer key, so it only goes back to the submitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: i64,
    pub selected_option: Option<i32>,
    pub correct_option: i32,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

/// Represents the 'attempts' table. Rows are written once and never updated.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Attempt {
    pub id: i64,
    pub user_id: i64,
    pub quiz_id: i64,

    /// Submitted answers, stored verbatim.
    pub answers: Json<Vec<SubmittedAnswer>>,

    /// Graded detail, stored so history can be re-rendered without re-grading.
    pub results: Json<Vec<QuestionResult>>,

    pub total_questions: i32,
    pub correct_count: i32,
    pub wrong_count: i32,
    pub unanswered_count: i32,

    /// Points after penalties and flooring.
    pub final_score: f64,

    /// Integer percentage, 0..=100.
    pub score: i32,

    /// Unrounded percentage. Used for leaderboard ordering.
    pub percentage: f64,

    pub time_taken_seconds: Option<i32>,
    pub attempted_at: chrono::DateTime<chrono::Utc>,
}

/// Insert payload for the recorder.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub user_id: i64,
    pub quiz_id: i64,
    pub answers: Vec<SubmittedAnswer>,
    pub results: Vec<QuestionResult>,
    pub total_questions: i32,
    pub correct_count: i32,
    pub wrong_count: i32,
    pub unanswered_count: i32,
    pub final_score: f64,
    pub score: i32,
    pub percentage: f64,
    pub time_taken_seconds: Option<i32>,
}

/// History view of an attempt, without the answer key.
#[derive(Debug, Serialize)]
pub struct AttemptSummary {
    pub id: i64,
    pub quiz_id: i64,
    pub total_questions: i32,
    pub correct_count: i32,
    pub wrong_count: i32,
    pub unanswered_count: i32,
    pub score: i32,
    pub percentage: f64,
    pub time_taken_seconds: Option<i32>,
    pub attempted_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Attempt> for AttemptSummary {
    fn from(a: &Attempt) -> Self {
        Self {
            id: a.id,
            quiz_id: a.quiz_id,
            total_questions: a.total_questions,
            correct_count: a.correct_count,
            wrong_count: a.wrong_count,
            unanswered_count: a.unanswered_count,
            score: a.score,
            percentage: round2(a.percentage),
            time_taken_seconds: a.time_taken_seconds,
            attempted_at: a.attempted_at,
        }
    }
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitAttemptRequest {
    pub answers: Vec<SubmittedAnswer>,
    pub time_taken_seconds: Option<i64>,
}

/// Response to a successful submission.
#[derive(Debug, Serialize)]
pub struct SubmitAttemptResponse {
    pub attempt_id: i64,
    pub quiz_id: i64,
    pub total_questions: i32,
    pub correct_count: i32,
    pub wrong_count: i32,
    pub unanswered_count: i32,
    pub final_score: f64,
    pub score: i32,
    /// Rounded to two decimals for display.
    pub percentage: f64,
    pub time_taken_seconds: Option<i32>,
    pub attempted_at: chrono::DateTime<chrono::Utc>,
    pub results: Vec<QuestionResult>,
}

/// Attempt joined with its author, as loaded for ranking.
#[derive(Debug, Clone, FromRow)]
pub struct LeaderboardRow {
    pub attempt_id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub score: i32,
    pub percentage: f64,
    pub time_taken_seconds: Option<i32>,
    pub attempted_at: chrono::DateTime<chrono::Utc>,
}

/// Public leaderboard line. Contact details are masked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: i64,
    pub name: String,
    pub masked_email: String,
    pub score: i32,
    pub percentage: f64,
    pub time_taken_seconds: Option<i32>,
    pub attempted_at: chrono::DateTime<chrono::Utc>,
}

/// Query parameters for the leaderboard.
#[derive(Debug, Deserialize)]
pub struct LeaderboardParams {
    pub limit: Option<i64>,
}

/// Query parameters for listing the caller's attempts.
#[derive(Debug, Deserialize)]
pub struct AttemptListParams {
    pub quiz_id: Option<i64>,
}

/// Rounds to two decimal places for display.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
