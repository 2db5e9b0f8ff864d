//! Pending / completed partition of the cached collection.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::types::Todo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoEntry {
    pub todo: Todo,
    /// Inside the highlight window of a recent addition.
    pub is_new: bool,
}

/// What the presentation layer renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoView {
    pub pending: Vec<TodoEntry>,
    pub completed: Vec<TodoEntry>,
    pub error: Option<String>,
    pub loading: bool,
}

impl TodoView {
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.completed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len() + self.completed.len()
    }
}

fn newest_first(a: &Todo, b: &Todo) -> Ordering {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
}

/// Split `todos` by `completed`, each side newest first.
pub fn partition(todos: &[Todo], highlighted: &HashSet<i64>) -> (Vec<TodoEntry>, Vec<TodoEntry>) {
    let mut sorted: Vec<&Todo> = todos.iter().collect();
    sorted.sort_by(|a, b| newest_first(a, b));

    sorted
        .into_iter()
        .map(|todo| TodoEntry {
            todo: todo.clone(),
            is_new: highlighted.contains(&todo.id),
        })
        .partition(|entry| !entry.todo.completed)
}
