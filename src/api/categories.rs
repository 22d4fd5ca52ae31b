use axum::extract::{Path, State};
use axum::{Json, http::StatusCode};
use serde_json::{Value, json};

use crate::auth::AuthUser;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{Category, NewCategoryRequest};
use crate::state::AppState;

pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = repository::list_categories(&state.db, &auth.user_id).await?;
    Ok(Json(categories))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<NewCategoryRequest>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Category name is required".to_string()));
    }

    let category = repository::insert_category(&state.db, &auth.user_id, &req.name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Deleting a category never touches its todos; the database clears their
/// reference.
pub async fn remove(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !repository::delete_category(&state.db, &id, &auth.user_id).await? {
        return Err(AppError::NotFound);
    }
    Ok(Json(json!({ "message": "Category deleted successfully" })))
}
