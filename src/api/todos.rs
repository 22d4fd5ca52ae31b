use axum::extract::{Path, Query, State};
use axum::{Json, http::StatusCode};

use crate::auth::AuthUser;
use crate::db::repository;
use crate::error::AppError;
use crate::models::{
    DeletedTodo, NewTodoRequest, Patch, Todo, TodoListQuery, UpdateTodoRequest,
};
use crate::state::AppState;

pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<TodoListQuery>,
) -> Result<Json<Vec<Todo>>, AppError> {
    let todos = repository::list_todos(&state.db, &auth.user_id, &query).await?;
    Ok(Json(todos))
}

/// Category references are resolved against the caller before writing, so a
/// foreign or made-up id reads the same as a missing one.
async fn ensure_category_owned(
    state: &AppState,
    auth: &AuthUser,
    category_id: Option<&str>,
) -> Result<(), AppError> {
    if let Some(id) = category_id {
        repository::find_category_for_user(&state.db, id, &auth.user_id)
            .await?
            .ok_or(AppError::NotFound)?;
    }
    Ok(())
}

pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<NewTodoRequest>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }
    ensure_category_owned(&state, &auth, req.category_id.as_deref()).await?;

    let todo = repository::insert_todo(&state.db, &auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateTodoRequest>,
) -> Result<Json<Todo>, AppError> {
    if let Some(title) = &req.title {
        if title.trim().is_empty() {
            return Err(AppError::BadRequest("Title cannot be empty".to_string()));
        }
    }
    if let Patch::Value(category_id) = &req.category_id {
        ensure_category_owned(&state, &auth, Some(category_id)).await?;
    }

    let todo = repository::update_todo(&state.db, &id, &auth.user_id, &req)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(todo))
}

pub async fn remove(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeletedTodo>, AppError> {
    if !repository::delete_todo(&state.db, &id, &auth.user_id).await? {
        return Err(AppError::NotFound);
    }
    Ok(Json(DeletedTodo { deleted_todo_id: id }))
}
