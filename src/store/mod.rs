// src/store/mod.rs

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::AppError,
    models::{
        attempt::{Attempt, LeaderboardRow, NewAttempt},
        purchase::Purchase,
        quiz::{CreateQuizRequest, Quiz},
        user::{NewUser, User},
    },
};

pub mod memory;
pub mod postgres;

/// Shared handle to whichever store backs the service.
pub type DynStore = Arc<dyn QuizStore>;

/// Persistence seam for quizzes, purchases, attempts and users.
///
/// Lookups return `Ok(None)` when nothing matches; `NotFound` decisions are left to
/// the caller. Writes are atomic per call.
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Quiz with its questions in display order, active or not.
    async fn find_quiz(&self, id: i64) -> Result<Option<Quiz>, AppError>;

    /// Quizzes with questions attached. `active_only` hides inactive ones.
    async fn list_quizzes(&self, active_only: bool) -> Result<Vec<Quiz>, AppError>;

    /// Inserts a quiz and all of its questions, or nothing.
    async fn create_quiz(&self, quiz: CreateQuizRequest) -> Result<Quiz, AppError>;

    /// Returns `false` when the quiz does not exist.
    async fn set_quiz_active(&self, id: i64, is_active: bool) -> Result<bool, AppError>;

    async fn find_purchase(&self, user_id: i64, quiz_id: i64) -> Result<Option<Purchase>, AppError>;

    /// Records a completed purchase. A second purchase of the same pair is a `Conflict`.
    async fn create_purchase(
        &self,
        user_id: i64,
        quiz_id: i64,
        amount_cents: i64,
    ) -> Result<Purchase, AppError>;

    /// Writes one attempt. Failures surface as `AppError::Persistence`.
    async fn insert_attempt(&self, attempt: NewAttempt) -> Result<Attempt, AppError>;

    async fn find_attempt(&self, id: i64) -> Result<Option<Attempt>, AppError>;

    /// The user's attempts, newest first, optionally for one quiz.
    async fn list_attempts_for_user(
        &self,
        user_id: i64,
        quiz_id: Option<i64>,
    ) -> Result<Vec<Attempt>, AppError>;

    /// Every attempt of a quiz joined with its author.
    async fn leaderboard_rows(&self, quiz_id: i64) -> Result<Vec<LeaderboardRow>, AppError>;

    /// Returns `false` when the attempt does not exist.
    async fn delete_attempt(&self, id: i64) -> Result<bool, AppError>;

    /// Creates a user. A taken email is a `Conflict`.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn list_users(&self) -> Result<Vec<User>, AppError>;
}
