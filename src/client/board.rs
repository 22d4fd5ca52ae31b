use thiserror::Error;

use crate::models::{Status, Todo};

#[derive(Debug, Error, PartialEq)]
pub enum BoardError {
    #[error("no card at {column:?}[{index}]")]
    CardMissing { column: Status, index: usize },
}

/// Three-way partition of a user's todos, keyed by workflow status. The
/// status field on each card is the single source of truth; columns are
/// always derivable from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    todo: Vec<Todo>,
    in_progress: Vec<Todo>,
    done: Vec<Todo>,
}

/// A drag gesture: take the card at `from[from_index]`, drop it at
/// `to[to_index]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardMove {
    pub from: Status,
    pub from_index: usize,
    pub to: Status,
    pub to_index: usize,
}

/// The server-visible effect of a cross-column move.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub todo_id: String,
    pub status: Status,
}

impl Board {
    /// Group todos by status, preserving the fetch order within each column.
    pub fn partition(todos: Vec<Todo>) -> Self {
        let mut board = Board::default();
        for todo in todos {
            board.column_mut(todo.status).push(todo);
        }
        board
    }

    pub fn column(&self, status: Status) -> &[Todo] {
        match status {
            Status::Todo => &self.todo,
            Status::InProgress => &self.in_progress,
            Status::Done => &self.done,
        }
    }

    fn column_mut(&mut self, status: Status) -> &mut Vec<Todo> {
        match status {
            Status::Todo => &mut self.todo,
            Status::InProgress => &mut self.in_progress,
            Status::Done => &mut self.done,
        }
    }

    pub fn len(&self) -> usize {
        Status::ALL.iter().map(|s| self.column(*s).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, todo_id: &str) -> Option<&Todo> {
        Status::ALL
            .iter()
            .flat_map(|s| self.column(*s).iter())
            .find(|todo| todo.id == todo_id)
    }

    /// Put a freshly created card at the top of its column.
    pub fn insert(&mut self, todo: Todo) {
        self.column_mut(todo.status).insert(0, todo);
    }

    /// Drop a deleted card from whichever column holds it.
    pub fn remove(&mut self, todo_id: &str) -> Option<Todo> {
        for status in Status::ALL {
            let column = self.column_mut(status);
            if let Some(index) = column.iter().position(|todo| todo.id == todo_id) {
                return Some(column.remove(index));
            }
        }
        None
    }

    /// Apply a drag to local state. Same-column moves are a pure reorder;
    /// cross-column moves rewrite the card's status and return the change
    /// the server must be told about. Drop positions past the end of the
    /// target column clamp to its tail.
    pub fn apply_move(&mut self, mv: CardMove) -> Result<Option<StatusChange>, BoardError> {
        let source = self.column_mut(mv.from);
        if mv.from_index >= source.len() {
            return Err(BoardError::CardMissing {
                column: mv.from,
                index: mv.from_index,
            });
        }
        let mut card = source.remove(mv.from_index);

        let change = if mv.from == mv.to {
            None
        } else {
            card.status = mv.to;
            Some(StatusChange {
                todo_id: card.id.clone(),
                status: mv.to,
            })
        };

        let target = self.column_mut(mv.to);
        let index = mv.to_index.min(target.len());
        target.insert(index, card);

        Ok(change)
    }
}
