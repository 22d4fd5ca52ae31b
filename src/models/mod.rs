pub mod category;
pub mod patch;
pub mod todo;
pub mod user;

pub use category::{Category, NewCategoryRequest};
pub use patch::Patch;
pub use todo::{
    DeletedTodo, NewTodoRequest, Priority, SortField, SortOrder, Status, Todo, TodoListQuery,
    UpdateTodoRequest,
};
pub use user::{CredentialsRequest, PublicUser, RegisteredUser, Role, User};
