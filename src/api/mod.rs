pub mod auth;
pub mod categories;
pub mod todos;

use axum::routing::{delete, get, post, put};
use axum::{Router, extract::State, http::StatusCode};

use crate::error::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/admin/users", get(auth::list_users))
        .route("/api/todos", get(todos::list).post(todos::create))
        .route("/api/todos/{id}", put(todos::update).delete(todos::remove))
        .route(
            "/api/categories",
            get(categories::list).post(categories::create),
        )
        .route("/api/categories/{id}", delete(categories::remove))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}
