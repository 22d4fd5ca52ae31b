pub mod board;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::models::{
    Category, CredentialsRequest, DeletedTodo, NewCategoryRequest, NewTodoRequest, PublicUser,
    RegisteredUser, Todo, TodoListQuery, UpdateTodoRequest,
};
use board::{Board, BoardError, CardMove};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error(transparent)]
    Board(#[from] BoardError),
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// Typed client for the REST surface. The session cookie issued by `login`
/// lives in the underlying cookie store, so every later call is
/// authenticated until `logout`.
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .json::<ApiErrorBody>()
            .await
            .map(|body| body.message)
            .unwrap_or_default();
        Err(ClientError::Api { status, message })
    }

    async fn expect_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    // --- auth ---

    pub async fn register(
        &self,
        email: &str,
        password: &str,
    ) -> Result<RegisteredUser, ClientError> {
        let response = self
            .http
            .post(self.url("/api/auth/register"))
            .json(&CredentialsRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        Self::expect_json(response).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<PublicUser, ClientError> {
        let response = self
            .http
            .post(self.url("/api/auth/login"))
            .json(&CredentialsRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        Self::expect_json(response).await
    }

    pub async fn logout(&self) -> Result<(), ClientError> {
        let response = self.http.post(self.url("/api/auth/logout")).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    pub async fn me(&self) -> Result<PublicUser, ClientError> {
        let response = self.http.get(self.url("/api/auth/me")).send().await?;
        Self::expect_json(response).await
    }

    // --- todos ---

    pub async fn list_todos(&self, query: &TodoListQuery) -> Result<Vec<Todo>, ClientError> {
        let response = self
            .http
            .get(self.url("/api/todos"))
            .query(query)
            .send()
            .await?;
        Self::expect_json(response).await
    }

    pub async fn create_todo(&self, req: &NewTodoRequest) -> Result<Todo, ClientError> {
        let response = self
            .http
            .post(self.url("/api/todos"))
            .json(req)
            .send()
            .await?;
        Self::expect_json(response).await
    }

    pub async fn update_todo(
        &self,
        id: &str,
        req: &UpdateTodoRequest,
    ) -> Result<Todo, ClientError> {
        let response = self
            .http
            .put(self.url(&format!("/api/todos/{id}")))
            .json(req)
            .send()
            .await?;
        Self::expect_json(response).await
    }

    pub async fn delete_todo(&self, id: &str) -> Result<DeletedTodo, ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/api/todos/{id}")))
            .send()
            .await?;
        Self::expect_json(response).await
    }

    // --- categories ---

    pub async fn list_categories(&self) -> Result<Vec<Category>, ClientError> {
        let response = self.http.get(self.url("/api/categories")).send().await?;
        Self::expect_json(response).await
    }

    pub async fn create_category(&self, name: &str) -> Result<Category, ClientError> {
        let response = self
            .http
            .post(self.url("/api/categories"))
            .json(&NewCategoryRequest {
                name: name.to_string(),
            })
            .send()
            .await?;
        Self::expect_json(response).await
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/api/categories/{id}")))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    // --- board ---

    /// Fetch the caller's todos and partition them into a fresh board.
    pub async fn refresh_board(&self, query: &TodoListQuery) -> Result<Board, ClientError> {
        Ok(Board::partition(self.list_todos(query).await?))
    }

    /// Apply a drag optimistically, then reconcile with the server. Only
    /// cross-column moves need a round-trip; if it fails the board is
    /// restored to its pre-drag snapshot and the error is handed back.
    pub async fn move_card(&self, board: &mut Board, mv: CardMove) -> Result<(), ClientError> {
        let snapshot = board.clone();
        let change = board.apply_move(mv)?;

        if let Some(change) = change {
            let update = UpdateTodoRequest::with_status(change.status);
            if let Err(err) = self.update_todo(&change.todo_id, &update).await {
                *board = snapshot;
                return Err(err);
            }
        }

        Ok(())
    }
}
