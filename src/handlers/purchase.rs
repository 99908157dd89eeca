// src/handlers/purchase.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    handlers::quiz::load_active_quiz,
    store::DynStore,
    utils::jwt::AuthUser,
};

/// Buys a paid quiz. Payment is simulated: the purchase is completed immediately.
pub async fn purchase_quiz(
    State(store): State<DynStore>,
    AuthUser(user): AuthUser,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = load_active_quiz(store.as_ref(), quiz_id).await?;

    if !quiz.is_paid {
        return Err(AppError::BadRequest(
            "This quiz is free and does not need to be purchased".to_string(),
        ));
    }

    let purchase = store
        .create_purchase(user.id, quiz.id, quiz.effective_price_cents())
        .await?;

    tracing::info!(
        user_id = user.id,
        quiz_id = quiz.id,
        amount_cents = purchase.amount_cents,
        "Quiz purchased"
    );

    Ok((StatusCode::CREATED, Json(purchase)))
}
