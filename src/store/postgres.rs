// src/store/postgres.rs

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgPoolOptions, types::Json};

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

const QUIZ_COLUMNS: &str = "id, title, description, subject, exam_year, is_active, is_paid, \
     price_cents, negative_marking, negative_mark, created_at";

const QUESTION_COLUMNS: &str =
    "id, quiz_id, position, text, options, correct_option, explanation, image_url";

const ATTEMPT_COLUMNS: &str = "id, user_id, quiz_id, answers, results, total_questions, \
     correct_count, wrong_count, unanswered_count, final_score, score, percentage, \
     time_taken_seconds, attempted_at";

const USER_COLUMNS: &str = "id, name, email, password, role, created_at";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects with retries, then applies the embedded migrations.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let mut retry_count = 0;
        let pool = loop {
            match PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(3))
                .connect(database_url)
                .await
            {
                Ok(pool) => break pool,
                Err(e) => {
                    retry_count += 1;
                    if retry_count > 5 {
                        return Err(e);
                    }
                    tracing::warn!(
                        "Database not ready, retrying in 2s... (Attempt {})",
                        retry_count
                    );
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        };
        tracing::info!("Database connected...");

        tracing::info!("Running migrations...");
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Migrations applied successfully.");

        Ok(Self::new(pool))
    }

    async fn questions_for(&self, quiz_ids: &[i64]) -> Result<HashMap<i64, Vec<Question>>, AppError> {
        let questions = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE quiz_id = ANY($1) ORDER BY quiz_id, position"
        ))
        .bind(quiz_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<i64, Vec<Question>> = HashMap::new();
        for q in questions {
            grouped.entry(q.quiz_id).or_default().push(q);
        }
        Ok(grouped)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

#[async_trait]
impl QuizStore for PgStore {
    async fn find_quiz(&self, id: i64) -> Result<Option<Quiz>, AppError> {
        let quiz = sqlx::query_as::<_, Quiz>(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut quiz) = quiz else {
            return Ok(None);
        };
        quiz.questions = self
            .questions_for(&[quiz.id])
            .await?
            .remove(&quiz.id)
            .unwrap_or_default();

        Ok(Some(quiz))
    }

    async fn list_quizzes(&self, active_only: bool) -> Result<Vec<Quiz>, AppError> {
        let mut quizzes = sqlx::query_as::<_, Quiz>(&format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes WHERE ($1 = FALSE OR is_active) ORDER BY id DESC"
        ))
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = quizzes.iter().map(|q| q.id).collect();
        let mut questions = self.questions_for(&ids).await?;
        for quiz in &mut quizzes {
            quiz.questions = questions.remove(&quiz.id).unwrap_or_default();
        }

        Ok(quizzes)
    }

    async fn create_quiz(&self, req: CreateQuizRequest) -> Result<Quiz, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut quiz = sqlx::query_as::<_, Quiz>(&format!(
            r#"
            INSERT INTO quizzes
            (title, description, subject, exam_year, is_active, is_paid, price_cents, negative_marking, negative_mark)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {QUIZ_COLUMNS}
            "#
        ))
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.subject)
        .bind(req.exam_year)
        .bind(req.is_active)
        .bind(req.is_paid)
        .bind(if req.is_paid { req.price_cents } else { 0 })
        .bind(req.negative_marking)
        .bind(req.negative_mark)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create quiz: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        for (position, q) in req.questions.into_iter().enumerate() {
            let question = sqlx::query_as::<_, Question>(&format!(
                r#"
                INSERT INTO questions (quiz_id, position, text, options, correct_option, explanation, image_url)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING {QUESTION_COLUMNS}
                "#
            ))
            .bind(quiz.id)
            .bind(position as i32)
            .bind(&q.text)
            .bind(Json(&q.options))
            .bind(q.correct_option)
            .bind(&q.explanation)
            .bind(&q.image_url)
            .fetch_one(&mut *tx)
            .await?;
            quiz.questions.push(question);
        }

        tx.commit().await?;

        Ok(quiz)
    }

    async fn set_quiz_active(&self, id: i64, is_active: bool) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE quizzes SET is_active = $1 WHERE id = $2")
            .bind(is_active)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_purchase(&self, user_id: i64, quiz_id: i64) -> Result<Option<Purchase>, AppError> {
        let purchase = sqlx::query_as::<_, Purchase>(
            r#"
            SELECT id, user_id, quiz_id, status, amount_cents, created_at
            FROM purchases
            WHERE user_id = $1 AND quiz_id = $2
            "#,
        )
        .bind(user_id)
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(purchase)
    }

    async fn create_purchase(
        &self,
        user_id: i64,
        quiz_id: i64,
        amount_cents: i64,
    ) -> Result<Purchase, AppError> {
        sqlx::query_as::<_, Purchase>(
            r#"
            INSERT INTO purchases (user_id, quiz_id, status, amount_cents)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, quiz_id, status, amount_cents, created_at
            "#,
        )
        .bind(user_id)
        .bind(quiz_id)
        .bind(PURCHASE_COMPLETED)
        .bind(amount_cents)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Quiz already purchased".to_string())
            } else {
                tracing::error!("Failed to create purchase: {:?}", e);
                AppError::InternalServerError(e.to_string())
            }
        })
    }

    async fn insert_attempt(&self, new: NewAttempt) -> Result<Attempt, AppError> {
        let persistence = |e: sqlx::Error| {
            tracing::error!("Failed to insert attempt: {:?}", e);
            AppError::Persistence(e.to_string())
        };

        let mut tx = self.pool.begin().await.map_err(persistence)?;

        let attempt = sqlx::query_as::<_, Attempt>(&format!(
            r#"
            INSERT INTO attempts
            (user_id, quiz_id, answers, results, total_questions, correct_count, wrong_count,
             unanswered_count, final_score, score, percentage, time_taken_seconds)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {ATTEMPT_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(new.quiz_id)
        .bind(Json(&new.answers))
        .bind(Json(&new.results))
        .bind(new.total_questions)
        .bind(new.correct_count)
        .bind(new.wrong_count)
        .bind(new.unanswered_count)
        .bind(new.final_score)
        .bind(new.score)
        .bind(new.percentage)
        .bind(new.time_taken_seconds)
        .fetch_one(&mut *tx)
        .await
        .map_err(persistence)?;

        tx.commit().await.map_err(persistence)?;

        Ok(attempt)
    }

    async fn find_attempt(&self, id: i64) -> Result<Option<Attempt>, AppError> {
        let attempt = sqlx::query_as::<_, Attempt>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(attempt)
    }

    async fn list_attempts_for_user(
        &self,
        user_id: i64,
        quiz_id: Option<i64>,
    ) -> Result<Vec<Attempt>, AppError> {
        let attempts = sqlx::query_as::<_, Attempt>(&format!(
            r#"
            SELECT {ATTEMPT_COLUMNS}
            FROM attempts
            WHERE user_id = $1 AND ($2::BIGINT IS NULL OR quiz_id = $2)
            ORDER BY attempted_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(attempts)
    }

    async fn leaderboard_rows(&self, quiz_id: i64) -> Result<Vec<LeaderboardRow>, AppError> {
        let rows = sqlx::query_as::<_, LeaderboardRow>(
            r#"
            SELECT
                a.id AS attempt_id,
                a.user_id,
                u.name,
                u.email,
                a.score,
                a.percentage,
                a.time_taken_seconds,
                a.attempted_at
            FROM attempts a
            JOIN users u ON a.user_id = u.id
            WHERE a.quiz_id = $1
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch leaderboard rows: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

        Ok(rows)
    }

    async fn delete_attempt(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM attempts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_user(&self, new: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Email '{}' is already registered", new.email))
            } else {
                tracing::error!("Failed to create user: {:?}", e);
                AppError::from(e)
            }
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
