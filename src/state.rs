use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::Keys;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub keys: Arc<Keys>,
    pub secure_cookies: bool,
}
