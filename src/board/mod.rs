pub mod ids;

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a task (a "card" on screen).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

/// Identifier of a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnId(String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }
    };
}

string_id!(TaskId);
string_id!(ColumnId);

/// A single unit of work. Owned by exactly one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// A named, ordered bucket of task ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    pub task_ids: Vec<TaskId>,
}

impl Column {
    pub fn new(id: impl Into<ColumnId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            task_ids: Vec::new(),
        }
    }

    /// Index of a task within this column.
    pub fn position(&self, task_id: &str) -> Option<usize> {
        self.task_ids.iter().position(|id| id.as_str() == task_id)
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.position(task_id).is_some()
    }
}

/// A broken structural rule of the board.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantError {
    #[error("column {column} references unknown task {task}")]
    DanglingTask { column: ColumnId, task: TaskId },
    #[error("task {0} appears in more than one column slot")]
    DuplicateTask(TaskId),
    #[error("task {0} is not owned by any column")]
    OrphanTask(TaskId),
    #[error("column {0} appears more than once in the column order")]
    DuplicateInOrder(ColumnId),
    #[error("column {0} is in the column order but does not exist")]
    UnknownInOrder(ColumnId),
    #[error("column {0} exists but is missing from the column order")]
    MissingFromOrder(ColumnId),
}

/// The whole board: tasks, columns, and the column display order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Board {
    pub tasks: HashMap<TaskId, Task>,
    pub columns: HashMap<ColumnId, Column>,
    pub column_order: Vec<ColumnId>,
}

impl Board {
    /// An empty board with no columns.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The seeded hiring pipeline every fresh session starts with.
    pub fn seeded() -> Self {
        let mut board = Self::empty();
        let seed: [(&str, &str, &[(&str, &str)]); 3] = [
            (
                "col-1",
                "First Interview",
                &[("task-1", "Lisa Wang"), ("task-2", "James Wilson")],
            ),
            (
                "col-2",
                "Second Interview",
                &[("task-3", "Marcus Johnson"), ("task-4", "Anna Kowalski")],
            ),
            ("col-3", "Hired", &[]),
        ];
        for (col_id, col_title, tasks) in seed {
            board.insert_column(Column::new(col_id, col_title));
            for (task_id, title) in tasks {
                board.insert_task(&ColumnId::from(col_id), Task::new(*task_id, *title));
            }
        }
        board
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.get(id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Columns in display order. Ids without a backing column are skipped.
    pub fn ordered_columns(&self) -> impl Iterator<Item = &Column> {
        self.column_order
            .iter()
            .filter_map(|id| self.columns.get(id))
    }

    /// Find which column owns a task, scanning in display order.
    pub fn column_of(&self, task_id: &str) -> Option<&ColumnId> {
        self.ordered_columns()
            .find(|col| col.contains(task_id))
            .map(|col| &col.id)
    }

    /// Position of a column within the display order.
    pub fn column_position(&self, column_id: &str) -> Option<usize> {
        self.column_order
            .iter()
            .position(|id| id.as_str() == column_id)
    }

    /// The terminal column (rightmost in display order).
    pub fn last_column(&self) -> Option<&ColumnId> {
        self.column_order.last()
    }

    /// Append a column to the end of the display order.
    pub(crate) fn insert_column(&mut self, column: Column) {
        self.column_order.push(column.id.clone());
        self.columns.insert(column.id.clone(), column);
    }

    /// Append a task to the end of a column. Returns false if the column is missing.
    pub(crate) fn insert_task(&mut self, column_id: &ColumnId, task: Task) -> bool {
        let Some(column) = self.columns.get_mut(column_id) else {
            return false;
        };
        column.task_ids.push(task.id.clone());
        self.tasks.insert(task.id.clone(), task);
        true
    }

    /// Move the task at `from_index` in one column to `to_index` in another (or the same).
    ///
    /// For a same-column move `to_index` is relative to the sequence after removal.
    /// An out-of-range `from_index` is a no-op; `to_index` past the end appends.
    /// Returns the moved task id.
    pub(crate) fn move_task(
        &mut self,
        from: &str,
        to: &str,
        from_index: usize,
        to_index: usize,
    ) -> Option<TaskId> {
        if !self.columns.contains_key(to) {
            return None;
        }
        let source = self.columns.get_mut(from)?;
        if from_index >= source.task_ids.len() {
            return None;
        }
        let moved = source.task_ids.remove(from_index);
        let dest = self.columns.get_mut(to)?;
        let at = to_index.min(dest.task_ids.len());
        dest.task_ids.insert(at, moved.clone());
        Some(moved)
    }

    /// Delete a task and strip it from whichever column holds it.
    pub(crate) fn remove_task(&mut self, task_id: &str) -> Option<Task> {
        let task = self.tasks.remove(task_id)?;
        for column in self.columns.values_mut() {
            column.task_ids.retain(|id| id.as_str() != task_id);
        }
        Some(task)
    }

    /// Delete a column and every task it held. Returns the removed column.
    pub(crate) fn remove_column(&mut self, column_id: &str) -> Option<Column> {
        let column = self.columns.remove(column_id)?;
        for task_id in &column.task_ids {
            self.tasks.remove(task_id);
        }
        self.column_order.retain(|id| id.as_str() != column_id);
        Some(column)
    }

    /// Move the column at `from_index` in the display order to `to_index`.
    ///
    /// Same index policy as [`Board::move_task`].
    pub(crate) fn reorder_columns(&mut self, from_index: usize, to_index: usize) -> bool {
        if from_index >= self.column_order.len() {
            return false;
        }
        let moved = self.column_order.remove(from_index);
        let at = to_index.min(self.column_order.len());
        self.column_order.insert(at, moved);
        true
    }

    /// Verify the structural invariants: every referenced task exists, every
    /// task has exactly one owner, and the order is a permutation of the columns.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let mut owned: HashSet<&TaskId> = HashSet::new();
        for column in self.columns.values() {
            for task_id in &column.task_ids {
                if !self.tasks.contains_key(task_id) {
                    return Err(InvariantError::DanglingTask {
                        column: column.id.clone(),
                        task: task_id.clone(),
                    });
                }
                if !owned.insert(task_id) {
                    return Err(InvariantError::DuplicateTask(task_id.clone()));
                }
            }
        }
        if let Some(orphan) = self.tasks.keys().find(|id| !owned.contains(id)) {
            return Err(InvariantError::OrphanTask(orphan.clone()));
        }

        let mut seen: HashSet<&ColumnId> = HashSet::new();
        for column_id in &self.column_order {
            if !self.columns.contains_key(column_id) {
                return Err(InvariantError::UnknownInOrder(column_id.clone()));
            }
            if !seen.insert(column_id) {
                return Err(InvariantError::DuplicateInOrder(column_id.clone()));
            }
        }
        if let Some(missing) = self.columns.keys().find(|id| !seen.contains(id)) {
            return Err(InvariantError::MissingFromOrder(missing.clone()));
        }
        Ok(())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for column in self.ordered_columns() {
            writeln!(
                f,
                "{} [{}] ({})",
                column.title,
                column.id,
                column.task_ids.len()
            )?;
            for task_id in &column.task_ids {
                let title = self.task(task_id.as_str()).map_or("?", |t| t.title.as_str());
                writeln!(f, "  {task_id:<16} {title}")?;
            }
        }
        Ok(())
    }
}
