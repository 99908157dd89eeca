// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, attempt, auth, purchase, quiz},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware, optional_auth_middleware},
};

/// Assembles the main application router.
///
/// * Public quiz reads accept anonymous callers (optional auth).
/// * Submissions, purchases and attempt history require a token.
/// * Admin routes require a token with the admin role.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes))
        .route("/{id}", get(quiz::get_quiz))
        .route("/{id}/access", get(quiz::check_quiz_access))
        .route("/{id}/leaderboard", get(quiz::get_leaderboard))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth_middleware,
        ))
        // Protected quiz routes
        .merge(
            Router::new()
                .route("/{id}/submit", post(quiz::submit_attempt))
                .route("/{id}/purchase", post(purchase::purchase_quiz))
                .layer(middleware::from_fn_with_state(state.clone(), auth_middleware)),
        );

    let attempt_routes = Router::new()
        .route("/", get(attempt::list_my_attempts))
        .route("/{id}", get(attempt::get_attempt))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/quizzes", post(admin::create_quiz))
        .route("/quizzes/{id}/status", put(admin::update_quiz_status))
        .route("/attempts/{id}", delete(admin::delete_attempt))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/attempts", attempt_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
