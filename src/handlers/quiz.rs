// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    config::Config,
    error::AppError,
    models::{
        attempt::{LeaderboardParams, SubmitAttemptRequest, SubmitAttemptResponse},
        question::PublicQuestion,
        quiz::{Quiz, QuizDetailResponse, QuizSummary},
    },
    services::{
        access::check_access,
        grading::{self, MarkingScheme, Submission},
        leaderboard::{self, resolve_limit},
        recorder,
    },
    store::{DynStore, QuizStore},
    utils::jwt::{AuthUser, MaybeUser},
};

/// Loads a quiz that is visible to the public. Inactive quizzes do not exist for callers.
pub async fn load_active_quiz(store: &dyn QuizStore, id: i64) -> Result<Quiz, AppError> {
    store
        .find_quiz(id)
        .await?
        .filter(|quiz| quiz.is_active)
        .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

/// Lists active quizzes. Questions are never included here.
pub async fn list_quizzes(State(store): State<DynStore>) -> Result<impl IntoResponse, AppError> {
    let quizzes = store.list_quizzes(true).await?;
    let summaries: Vec<QuizSummary> = quizzes.iter().map(QuizSummary::from).collect();

    Ok(Json(summaries))
}

/// Quiz detail. The question list (without answers) is attached only when the viewer
/// has access.
pub async fn get_quiz(
    State(store): State<DynStore>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = load_active_quiz(store.as_ref(), id).await?;
    let access = check_access(store.as_ref(), viewer.as_ref(), &quiz).await?;

    let questions = access
        .granted
        .then(|| quiz.questions.iter().map(PublicQuestion::from).collect());

    Ok(Json(QuizDetailResponse {
        quiz: QuizSummary::from(&quiz),
        access,
        questions,
    }))
}

/// Reports whether the caller may attempt the quiz.
pub async fn check_quiz_access(
    State(store): State<DynStore>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = load_active_quiz(store.as_ref(), id).await?;
    let decision = check_access(store.as_ref(), viewer.as_ref(), &quiz).await?;

    Ok(Json(decision))
}

/// Submits answers for a quiz.
///
/// * Rejects callers without access before looking at the answers.
/// * Grades against the stored answer key, with the quiz's marking scheme.
/// * Records a new attempt on every call (retakes are allowed).
/// * Returns the detailed per-question results to the submitter only.
pub async fn submit_attempt(
    State(store): State<DynStore>,
    State(config): State<Config>,
    AuthUser(user): AuthUser,
    Path(quiz_id): Path<i64>,
    payload: Result<Json<SubmitAttemptRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = load_active_quiz(store.as_ref(), quiz_id).await?;

    check_access(store.as_ref(), Some(&user), &quiz)
        .await?
        .ensure_granted()?;

    let Json(req) = payload?;
    let submission = Submission::parse(req)?;

    let scheme = MarkingScheme::for_quiz(&quiz, &config.scoring);
    let grade = grading::grade(&quiz.questions, &submission, &scheme)?;
    let rounded_percentage = grade.rounded_percentage();

    let attempt = recorder::record(store.as_ref(), user.id, quiz.id, &submission, &grade).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitAttemptResponse {
            attempt_id: attempt.id,
            quiz_id: attempt.quiz_id,
            total_questions: attempt.total_questions,
            correct_count: attempt.correct_count,
            wrong_count: attempt.wrong_count,
            unanswered_count: attempt.unanswered_count,
            final_score: attempt.final_score,
            score: attempt.score,
            percentage: rounded_percentage,
            time_taken_seconds: attempt.time_taken_seconds,
            attempted_at: attempt.attempted_at,
            results: grade.results,
        }),
    ))
}

/// Ranked best attempt per user for a quiz, with masked contact details.
pub async fn get_leaderboard(
    State(store): State<DynStore>,
    State(config): State<Config>,
    Path(id): Path<i64>,
    params: Result<Query<LeaderboardParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = params?;
    let limit = resolve_limit(params.limit, &config.leaderboard)?;

    let quiz = load_active_quiz(store.as_ref(), id).await?;
    let rows = store.leaderboard_rows(quiz.id).await?;

    tracing::debug!(quiz_id = quiz.id, attempts = rows.len(), "Building leaderboard");

    Ok(Json(leaderboard::leaderboard(rows, limit)))
}
