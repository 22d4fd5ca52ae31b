use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::Category;
use super::patch::Patch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
pub enum Status {
    #[default]
    #[serde(rename = "TODO")]
    #[sqlx(rename = "TODO")]
    Todo,
    #[serde(rename = "IN_PROGRESS")]
    #[sqlx(rename = "IN_PROGRESS")]
    InProgress,
    #[serde(rename = "DONE")]
    #[sqlx(rename = "DONE")]
    Done,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Todo, Status::InProgress, Status::Done];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub priority: Priority,
    pub status: Status,
    pub due_date: Option<DateTime<Utc>>,
    pub category_id: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Owning category, joined in for display.
    pub category: Option<Category>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTodoRequest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

/// Sparse update payload. `Option` fields are left unchanged when absent;
/// the `Patch` fields additionally distinguish an explicit `null`, which
/// clears the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub due_date: Patch<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Patch::is_missing")]
    pub category_id: Patch<String>,
}

impl UpdateTodoRequest {
    pub fn with_status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedTodo {
    pub deleted_todo_id: String,
}

/// Listing filters; every provided field becomes one equality predicate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoListQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

/// Sortable columns. Sorting is restricted to this enumeration so request
/// parameters never reach the query text unvalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    DueDate,
    Priority,
    Status,
    Title,
}

impl SortField {
    pub(crate) fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "t.created_at",
            SortField::UpdatedAt => "t.updated_at",
            SortField::DueDate => "t.due_date",
            SortField::Priority => "t.priority",
            SortField::Status => "t.status",
            SortField::Title => "t.title",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub(crate) fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&Status::InProgress).unwrap(),
            r#""IN_PROGRESS""#
        );
        let status: Status = serde_json::from_str(r#""DONE""#).unwrap();
        assert_eq!(status, Status::Done);
    }

    #[test]
    fn update_request_distinguishes_absent_from_null() {
        let req: UpdateTodoRequest = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
        assert_eq!(req.title.as_deref(), Some("x"));
        assert!(req.due_date.is_missing());
        assert!(req.category_id.is_missing());

        let req: UpdateTodoRequest =
            serde_json::from_str(r#"{"dueDate": null, "categoryId": null}"#).unwrap();
        assert_eq!(req.due_date, Patch::Null);
        assert_eq!(req.category_id, Patch::Null);
    }

    #[test]
    fn list_query_rejects_unknown_sort_field() {
        let result: Result<TodoListQuery, _> =
            serde_json::from_str(r#"{"sortBy": "passwordHash"}"#);
        assert!(result.is_err());
    }
}
