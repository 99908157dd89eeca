// src/store/memory.rs

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use tokio::sync::RwLock;

use crate::{
    error::AppError,
    models::{
        attempt::{Attempt, LeaderboardRow, NewAttempt},
        purchase::{PURCHASE_COMPLETED, Purchase},
        question::Question,
        quiz::{CreateQuizRequest, Quiz},
        user::{NewUser, User},
    },
    store::QuizStore,
};

/// Process-local store. Used by the test suite and when no `DATABASE_URL` is set.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    last_id: i64,
    quizzes: BTreeMap<i64, Quiz>,
    purchases: Vec<Purchase>,
    attempts: BTreeMap<i64, Attempt>,
    users: BTreeMap<i64, User>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn find_quiz(&self, id: i64) -> Result<Option<Quiz>, AppError> {
        Ok(self.inner.read().await.quizzes.get(&id).cloned())
    }

    async fn list_quizzes(&self, active_only: bool) -> Result<Vec<Quiz>, AppError> {
        let tables = self.inner.read().await;
        Ok(tables
            .quizzes
            .values()
            .rev()
            .filter(|q| !active_only || q.is_active)
            .cloned()
            .collect())
    }

    async fn create_quiz(&self, req: CreateQuizRequest) -> Result<Quiz, AppError> {
        let mut tables = self.inner.write().await;
        let quiz_id = tables.next_id();

        let mut questions = Vec::with_capacity(req.questions.len());
        for (position, q) in req.questions.into_iter().enumerate() {
            questions.push(Question {
                id: tables.next_id(),
                quiz_id,
                position: position as i32,
                text: q.text,
                options: Json(q.options),
                correct_option: q.correct_option,
                explanation: q.explanation,
                image_url: q.image_url,
            });
        }

        let quiz = Quiz {
            id: quiz_id,
            title: req.title,
            description: req.description,
            subject: req.subject,
            exam_year: req.exam_year,
            is_active: req.is_active,
            is_paid: req.is_paid,
            price_cents: if req.is_paid { req.price_cents } else { 0 },
            negative_marking: req.negative_marking,
            negative_mark: req.negative_mark,
            created_at: Utc::now(),
            questions,
        };
        tables.quizzes.insert(quiz_id, quiz.clone());

        Ok(quiz)
    }

    async fn set_quiz_active(&self, id: i64, is_active: bool) -> Result<bool, AppError> {
        let mut tables = self.inner.write().await;
        Ok(match tables.quizzes.get_mut(&id) {
            Some(quiz) => {
                quiz.is_active = is_active;
                true
            }
            None => false,
        })
    }

    async fn find_purchase(&self, user_id: i64, quiz_id: i64) -> Result<Option<Purchase>, AppError> {
        let tables = self.inner.read().await;
        Ok(tables
            .purchases
            .iter()
            .find(|p| p.user_id == user_id && p.quiz_id == quiz_id)
            .cloned())
    }

    async fn create_purchase(
        &self,
        user_id: i64,
        quiz_id: i64,
        amount_cents: i64,
    ) -> Result<Purchase, AppError> {
        let mut tables = self.inner.write().await;
        if tables
            .purchases
            .iter()
            .any(|p| p.user_id == user_id && p.quiz_id == quiz_id)
        {
            return Err(AppError::Conflict("Quiz already purchased".to_string()));
        }

        let purchase = Purchase {
            id: tables.next_id(),
            user_id,
            quiz_id,
            status: PURCHASE_COMPLETED.to_string(),
            amount_cents,
            created_at: Utc::now(),
        };
        tables.purchases.push(purchase.clone());

        Ok(purchase)
    }

    async fn insert_attempt(&self, new: NewAttempt) -> Result<Attempt, AppError> {
        let mut tables = self.inner.write().await;
        let attempt = Attempt {
            id: tables.next_id(),
            user_id: new.user_id,
            quiz_id: new.quiz_id,
            answers: Json(new.answers),
            results: Json(new.results),
            total_questions: new.total_questions,
            correct_count: new.correct_count,
            wrong_count: new.wrong_count,
            unanswered_count: new.unanswered_count,
            final_score: new.final_score,
            score: new.score,
            percentage: new.percentage,
            time_taken_seconds: new.time_taken_seconds,
            attempted_at: Utc::now(),
        };
        tables.attempts.insert(attempt.id, attempt.clone());

        Ok(attempt)
    }

    async fn find_attempt(&self, id: i64) -> Result<Option<Attempt>, AppError> {
        Ok(self.inner.read().await.attempts.get(&id).cloned())
    }

    async fn list_attempts_for_user(
        &self,
        user_id: i64,
        quiz_id: Option<i64>,
    ) -> Result<Vec<Attempt>, AppError> {
        let tables = self.inner.read().await;
        Ok(tables
            .attempts
            .values()
            .rev()
            .filter(|a| a.user_id == user_id && quiz_id.is_none_or(|q| a.quiz_id == q))
            .cloned()
            .collect())
    }

    async fn leaderboard_rows(&self, quiz_id: i64) -> Result<Vec<LeaderboardRow>, AppError> {
        let tables = self.inner.read().await;
        Ok(tables
            .attempts
            .values()
            .filter(|a| a.quiz_id == quiz_id)
            .filter_map(|a| {
                tables.users.get(&a.user_id).map(|u| LeaderboardRow {
                    attempt_id: a.id,
                    user_id: a.user_id,
                    name: u.name.clone(),
                    email: u.email.clone(),
                    score: a.score,
                    percentage: a.percentage,
                    time_taken_seconds: a.time_taken_seconds,
                    attempted_at: a.attempted_at,
                })
            })
            .collect())
    }

    async fn delete_attempt(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.inner.write().await.attempts.remove(&id).is_some())
    }

    async fn create_user(&self, new: NewUser) -> Result<User, AppError> {
        let mut tables = self.inner.write().await;
        if tables.users.values().any(|u| u.email == new.email) {
            return Err(AppError::Conflict(format!(
                "Email '{}' is already registered",
                new.email
            )));
        }

        let user = User {
            id: tables.next_id(),
            name: new.name,
            email: new.email,
            password: new.password_hash,
            role: new.role,
            created_at: Some(Utc::now()),
        };
        tables.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.inner.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.inner.read().await.users.values().rev().cloned().collect())
    }
}
