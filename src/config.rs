use std::env;

use crate::error::AppError;

/// Process configuration, collected once at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub frontend_origin: String,
    pub secure_cookies: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://taskboard.db".to_string());
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| AppError::Config(format!("PORT is not a valid port: {raw}")))?,
            Err(_) => 8081,
        };
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::Config("JWT_SECRET is not set".to_string()))?;
        let frontend_origin = env::var("FRONTEND_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:5173".to_string());
        // The Secure cookie attribute would break plain-http local logins.
        let secure_cookies = env::var("APP_ENVIRONMENT")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            frontend_origin,
            secure_cookies,
        })
    }
}
