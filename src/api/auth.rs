use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::CookieJar;
use serde_json::{Value, json};
use tracing::instrument;

use crate::auth::{self, AuthUser, password};
use crate::db::repository;
use crate::error::AppError;
use crate::models::{CredentialsRequest, PublicUser, RegisteredUser, User};
use crate::state::AppState;

fn validate_credentials(req: &CredentialsRequest) -> Result<(), AppError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }
    Ok(())
}

#[instrument(name = "register", skip(state, req), fields(email = %req.email))]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<RegisteredUser>), AppError> {
    validate_credentials(&req)?;

    if repository::find_user_by_email(&state.db, &req.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Email already in use".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;
    let user = repository::insert_user(&state.db, &req.email, &password_hash).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisteredUser {
            id: user.id,
            email: user.email,
        }),
    ))
}

#[instrument(name = "login", skip(state, jar, req), fields(email = %req.email))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<CredentialsRequest>,
) -> Result<(CookieJar, Json<PublicUser>), AppError> {
    validate_credentials(&req)?;

    // Unknown email and wrong password fail identically, so the endpoint
    // never reveals which addresses are registered.
    let user = repository::find_user_by_email(&state.db, &req.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;
    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }

    let token = auth::issue_token(&state.keys, &user.id, user.role)?;
    let cookie = auth::session_cookie(token, state.secure_cookies);

    tracing::info!("user logged in");
    Ok((jar.add(cookie), Json(user.public())))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    (
        jar.remove(auth::session_removal_cookie()),
        Json(json!({ "message": "Logged out successfully" })),
    )
}

pub async fn me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<PublicUser>, AppError> {
    let user = repository::find_user_by_id(&state.db, &auth.user_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(user.public()))
}

pub async fn list_users(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    auth.require_admin()?;
    let users = repository::list_users(&state.db).await?;
    Ok(Json(users.iter().map(User::public).collect()))
}
