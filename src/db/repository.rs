use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{
    Category, NewTodoRequest, Priority, Role, SortField, SortOrder, Status, Todo, TodoListQuery,
    UpdateTodoRequest, User,
};

/// A duplicate in a UNIQUE column surfaces as a 409 with the given message.
fn unique_conflict(err: sqlx::Error, message: impl Into<String>) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation) {
            return AppError::Conflict(message.into());
        }
    }
    AppError::Database(err)
}

/// A broken reference reads the same as a missing row, so nothing about
/// other users' data leaks through the error.
fn fk_not_found(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if matches!(db_err.kind(), sqlx::error::ErrorKind::ForeignKeyViolation) {
            return AppError::NotFound;
        }
    }
    AppError::Database(err)
}

// --- users ---

pub async fn insert_user(
    db: &SqlitePool,
    email: &str,
    password_hash: &str,
) -> Result<User, AppError> {
    let user = User {
        id: Uuid::new_v4().to_string(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        role: Role::User,
        created_at: Utc::now(),
    };

    sqlx::query(
        "INSERT INTO users (id, email, password_hash, role, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role)
    .bind(user.created_at)
    .execute(db)
    .await
    .map_err(|err| unique_conflict(err, "Email already in use"))?;

    Ok(user)
}

pub async fn find_user_by_email(db: &SqlitePool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, password_hash, role, created_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn find_user_by_id(db: &SqlitePool, id: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, password_hash, role, created_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn list_users(db: &SqlitePool) -> Result<Vec<User>, AppError> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, email, password_hash, role, created_at FROM users ORDER BY created_at",
    )
    .fetch_all(db)
    .await?;
    Ok(users)
}

// --- categories ---

pub async fn list_categories(db: &SqlitePool, user_id: &str) -> Result<Vec<Category>, AppError> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT id, name, user_id FROM categories WHERE user_id = ? ORDER BY name ASC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(categories)
}

pub async fn insert_category(
    db: &SqlitePool,
    user_id: &str,
    name: &str,
) -> Result<Category, AppError> {
    let category = Category {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        user_id: user_id.to_string(),
    };

    sqlx::query("INSERT INTO categories (id, name, user_id) VALUES (?, ?, ?)")
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.user_id)
        .execute(db)
        .await
        .map_err(|err| unique_conflict(err, format!("Category '{name}' already exists.")))?;

    Ok(category)
}

pub async fn find_category_for_user(
    db: &SqlitePool,
    id: &str,
    user_id: &str,
) -> Result<Option<Category>, AppError> {
    let category = sqlx::query_as::<_, Category>(
        "SELECT id, name, user_id FROM categories WHERE id = ? AND user_id = ?",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(category)
}

/// Conditional delete; the ownership check and the delete are one statement.
/// Todos referencing the category keep existing with the reference cleared.
pub async fn delete_category(db: &SqlitePool, id: &str, user_id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}

// --- todos ---

const TODO_COLUMNS: &str = "t.id, t.title, t.description, t.is_completed, t.priority, t.status, \
     t.due_date, t.category_id, t.user_id, t.created_at, t.updated_at, c.name AS category_name";

#[derive(sqlx::FromRow)]
struct TodoRow {
    id: String,
    title: String,
    description: Option<String>,
    is_completed: bool,
    priority: Priority,
    status: Status,
    due_date: Option<DateTime<Utc>>,
    category_id: Option<String>,
    user_id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    category_name: Option<String>,
}

impl TodoRow {
    fn into_todo(self) -> Todo {
        let category = match (&self.category_id, self.category_name) {
            (Some(id), Some(name)) => Some(Category {
                id: id.clone(),
                name,
                user_id: self.user_id.clone(),
            }),
            _ => None,
        };

        Todo {
            id: self.id,
            title: self.title,
            description: self.description,
            is_completed: self.is_completed,
            priority: self.priority,
            status: self.status,
            due_date: self.due_date,
            category_id: self.category_id,
            user_id: self.user_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            category,
        }
    }
}

pub async fn list_todos(
    db: &SqlitePool,
    user_id: &str,
    query: &TodoListQuery,
) -> Result<Vec<Todo>, AppError> {
    let mut builder = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {TODO_COLUMNS} FROM todos t \
         LEFT JOIN categories c ON c.id = t.category_id WHERE t.user_id = "
    ));
    builder.push_bind(user_id);

    if let Some(is_completed) = query.is_completed {
        builder.push(" AND t.is_completed = ").push_bind(is_completed);
    }
    if let Some(status) = query.status {
        builder.push(" AND t.status = ").push_bind(status);
    }
    if let Some(priority) = query.priority {
        builder.push(" AND t.priority = ").push_bind(priority);
    }
    if let Some(category_id) = &query.category_id {
        builder.push(" AND t.category_id = ").push_bind(category_id);
    }

    // sort_by and sort_order are closed enums, safe to splice into the text.
    let (column, order) = match query.sort_by {
        Some(field) => (field.column(), query.sort_order.unwrap_or(SortOrder::Asc)),
        None => (SortField::CreatedAt.column(), SortOrder::Desc),
    };
    builder
        .push(" ORDER BY ")
        .push(column)
        .push(" ")
        .push(order.keyword());

    let rows: Vec<TodoRow> = builder.build_query_as().fetch_all(db).await?;
    Ok(rows.into_iter().map(TodoRow::into_todo).collect())
}

pub async fn find_todo_for_user(
    db: &SqlitePool,
    id: &str,
    user_id: &str,
) -> Result<Option<Todo>, AppError> {
    let sql = format!(
        "SELECT {TODO_COLUMNS} FROM todos t \
         LEFT JOIN categories c ON c.id = t.category_id \
         WHERE t.id = ? AND t.user_id = ?"
    );
    let row = sqlx::query_as::<_, TodoRow>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
    Ok(row.map(TodoRow::into_todo))
}

/// The caller is expected to have resolved the category against the same
/// owner; the foreign key only backstops the race between check and insert.
pub async fn insert_todo(
    db: &SqlitePool,
    user_id: &str,
    req: NewTodoRequest,
) -> Result<Todo, AppError> {
    let now = Utc::now();
    let todo = Todo {
        id: Uuid::new_v4().to_string(),
        title: req.title,
        description: req.description,
        is_completed: false,
        priority: req.priority.unwrap_or_default(),
        status: req.status.unwrap_or_default(),
        due_date: req.due_date,
        category_id: req.category_id,
        user_id: user_id.to_string(),
        created_at: now,
        updated_at: now,
        category: None,
    };

    sqlx::query(
        "INSERT INTO todos \
            (id, title, description, is_completed, priority, status, \
            due_date, category_id, user_id, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&todo.id)
    .bind(&todo.title)
    .bind(&todo.description)
    .bind(todo.is_completed)
    .bind(todo.priority)
    .bind(todo.status)
    .bind(todo.due_date)
    .bind(&todo.category_id)
    .bind(&todo.user_id)
    .bind(todo.created_at)
    .bind(todo.updated_at)
    .execute(db)
    .await
    .map_err(fk_not_found)?;

    find_todo_for_user(db, &todo.id, user_id)
        .await?
        .ok_or(AppError::NotFound)
}

/// Sparse update as a single conditional UPDATE: the ownership predicate is
/// part of the statement, so the check cannot race the write. Zero rows
/// affected means "no such todo under this owner".
pub async fn update_todo(
    db: &SqlitePool,
    id: &str,
    user_id: &str,
    req: &UpdateTodoRequest,
) -> Result<Option<Todo>, AppError> {
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE todos SET updated_at = ");
    builder.push_bind(Utc::now());

    if let Some(title) = &req.title {
        builder.push(", title = ").push_bind(title);
    }
    if let Some(description) = &req.description {
        builder.push(", description = ").push_bind(description);
    }
    if let Some(is_completed) = req.is_completed {
        builder.push(", is_completed = ").push_bind(is_completed);
    }
    if let Some(priority) = req.priority {
        builder.push(", priority = ").push_bind(priority);
    }
    if let Some(status) = req.status {
        builder.push(", status = ").push_bind(status);
    }
    if !req.due_date.is_missing() {
        builder
            .push(", due_date = ")
            .push_bind(req.due_date.clone().into_option());
    }
    if !req.category_id.is_missing() {
        builder
            .push(", category_id = ")
            .push_bind(req.category_id.clone().into_option());
    }

    builder
        .push(" WHERE id = ")
        .push_bind(id)
        .push(" AND user_id = ")
        .push_bind(user_id);

    let result = builder.build().execute(db).await.map_err(fk_not_found)?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }

    find_todo_for_user(db, id, user_id).await
}

pub async fn delete_todo(db: &SqlitePool, id: &str, user_id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM todos WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}
