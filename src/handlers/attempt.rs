// src/handlers/attempt.rs

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::attempt::{AttemptListParams, AttemptSummary},
    store::DynStore,
    utils::jwt::AuthUser,
};

/// Lists the caller's own attempts, newest first.
pub async fn list_my_attempts(
    State(store): State<DynStore>,
    AuthUser(user): AuthUser,
    params: Result<Query<AttemptListParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = params?;
    let attempts = store.list_attempts_for_user(user.id, params.quiz_id).await?;
    let summaries: Vec<AttemptSummary> = attempts.iter().map(AttemptSummary::from).collect();

    Ok(Json(summaries))
}

/// Full stored attempt, including the graded detail.
/// Only the author (or an admin) may read it, since it discloses the answer key.
pub async fn get_attempt(
    State(store): State<DynStore>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = store
        .find_attempt(id)
        .await?
        .ok_or(AppError::NotFound("Attempt not found".to_string()))?;

    if attempt.user_id != user.id && !user.is_admin() {
        return Err(AppError::Forbidden(
            "You can only view your own attempts".to_string(),
        ));
    }

    Ok(Json(attempt))
}
