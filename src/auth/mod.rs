pub mod password;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::db::repository;
use crate::error::AppError;
use crate::models::Role;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "token";
pub const SESSION_TTL_DAYS: i64 = 7;

pub struct Keys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl Keys {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

pub fn issue_token(keys: &Keys, user_id: &str, role: Role) -> Result<String, AppError> {
    let exp = (Utc::now() + chrono::Duration::days(SESSION_TTL_DAYS)).timestamp() as usize;
    issue_token_expiring_at(keys, user_id, role, exp)
}

pub fn issue_token_expiring_at(
    keys: &Keys,
    user_id: &str,
    role: Role,
    exp: usize,
) -> Result<String, AppError> {
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp,
    };
    encode(&Header::default(), &claims, &keys.encoding).map_err(|err| {
        tracing::error!("JWT encoding failed: {:?}", err);
        AppError::TokenCreation
    })
}

pub fn decode_token(keys: &Keys, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(token, &keys.decoding, &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized)
}

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::days(SESSION_TTL_DAYS))
        .build()
}

/// Cookie handle for `CookieJar::remove`, which turns it into an immediate
/// expiry on the client. Must carry the same path as the session cookie.
pub fn session_removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::from(SESSION_COOKIE);
    cookie.set_path("/");
    cookie
}

/// Identity attached to a request once its session cookie checks out.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Role,
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .ok_or(AppError::Unauthorized)?;

        let claims = decode_token(&state.keys, &token)?;

        // A token can outlive its user; deleting the account revokes it.
        if repository::find_user_by_id(&state.db, &claims.sub)
            .await?
            .is_none()
        {
            return Err(AppError::Unauthorized);
        }

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let keys = Keys::new(b"test-secret");
        let token = issue_token(&keys, "user-1", Role::User).expect("Failed to issue token");
        let claims = decode_token(&keys, &token).expect("Failed to decode token");
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.role, Role::User);
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = Keys::new(b"test-secret");
        let exp = (Utc::now() - chrono::Duration::days(SESSION_TTL_DAYS + 1)).timestamp() as usize;
        let token = issue_token_expiring_at(&keys, "user-1", Role::User, exp)
            .expect("Failed to issue token");
        assert!(decode_token(&keys, &token).is_err());
    }

    #[test]
    fn token_signed_with_other_key_is_rejected() {
        let keys = Keys::new(b"test-secret");
        let other = Keys::new(b"another-secret");
        let token = issue_token(&other, "user-1", Role::User).expect("Failed to issue token");
        assert!(decode_token(&keys, &token).is_err());
    }

    #[test]
    fn session_cookie_is_scoped() {
        let cookie = session_cookie("abc".to_string(), true);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(7)));
    }
}
