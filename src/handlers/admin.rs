// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::quiz::{CreateQuizRequest, QuizSummary, UpdateQuizStatusRequest},
    store::DynStore,
    utils::{html::sanitize_quiz, jwt::AuthUser},
};

/// Lists all users in the system.
/// Admin only.
pub async fn list_users(State(store): State<DynStore>) -> Result<impl IntoResponse, AppError> {
    let users = store.list_users().await?;
    Ok(Json(users))
}

/// Creates a quiz together with its questions.
/// Admin only. Authored text is sanitized before it is stored.
pub async fn create_quiz(
    State(store): State<DynStore>,
    AuthUser(admin): AuthUser,
    payload: Result<Json<CreateQuizRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let payload = sanitize_quiz(payload);
    if payload.title.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Title is empty after sanitization".to_string(),
        ));
    }

    let quiz = store.create_quiz(payload).await?;

    tracing::info!(
        quiz_id = quiz.id,
        admin_id = admin.id,
        questions = quiz.questions.len(),
        "Quiz created"
    );

    Ok((StatusCode::CREATED, Json(QuizSummary::from(&quiz))))
}

/// Shows or hides a quiz.
/// Admin only.
pub async fn update_quiz_status(
    State(store): State<DynStore>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateQuizStatusRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    if !store.set_quiz_active(id, payload.is_active).await? {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes an attempt by ID.
/// Admin only. This is the only path that removes attempts.
pub async fn delete_attempt(
    State(store): State<DynStore>,
    AuthUser(admin): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !store.delete_attempt(id).await? {
        return Err(AppError::NotFound("Attempt not found".to_string()));
    }

    tracing::info!(attempt_id = id, admin_id = admin.id, "Attempt deleted");

    Ok(StatusCode::NO_CONTENT)
}
