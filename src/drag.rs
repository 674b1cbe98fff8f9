//! Drag-completion translation: turn "X was dropped on Y" into a store mutation.
//!
//! The gesture layer reports both ends of a drag in one id space. Column
//! headers are tagged so they cannot be mistaken for tasks; everything else is
//! a task id, except that dropping onto a column body reports the bare column
//! id, which [`resolve`] also accepts.

use std::str::FromStr;

use crate::board::{Board, ColumnId, TaskId};
use crate::notify::{Completion, CompletionSink};
use crate::store::Store;

/// Tag marking a column header in the gesture layer's string id space.
pub const COLUMN_PREFIX: &str = "column-";

/// One end of a drag gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragTarget {
    Column(ColumnId),
    Task(TaskId),
}

impl DragTarget {
    fn id(&self) -> &str {
        match self {
            Self::Column(id) => id.as_str(),
            Self::Task(id) => id.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DragParseError {
    #[error("drag id is empty")]
    Empty,
    #[error("column reference {0:?} has no column id")]
    EmptyColumn(String),
}

impl FromStr for DragTarget {
    type Err = DragParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DragParseError::Empty);
        }
        match s.strip_prefix(COLUMN_PREFIX) {
            Some("") => Err(DragParseError::EmptyColumn(s.to_string())),
            Some(column) => Ok(Self::Column(column.into())),
            None => Ok(Self::Task(s.into())),
        }
    }
}

/// The terminal signal of a drag gesture: what was dragged and where it was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragEnd {
    pub dragged: DragTarget,
    pub over: Option<DragTarget>,
}

impl DragEnd {
    pub fn new(dragged: DragTarget, over: Option<DragTarget>) -> Self {
        Self { dragged, over }
    }

    /// Build an event from raw gesture-layer ids.
    pub fn from_ids(dragged: &str, over: Option<&str>) -> Result<Self, DragParseError> {
        Ok(Self {
            dragged: dragged.parse()?,
            over: over.map(str::parse::<DragTarget>).transpose()?,
        })
    }
}

/// A concrete store call derived from a drag event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragIntent {
    MoveTask {
        task: TaskId,
        from: ColumnId,
        to: ColumnId,
        from_index: usize,
        to_index: usize,
    },
    ReorderColumns {
        from_index: usize,
        to_index: usize,
    },
}

/// Interpret a drag event against the current board.
///
/// Returns `None` when the event has no drop target, targets itself, or names
/// ids the board no longer knows about.
pub fn resolve(board: &Board, event: &DragEnd) -> Option<DragIntent> {
    // Column bodies report their bare id; treat those as column targets.
    let over = match event.over.as_ref()? {
        DragTarget::Task(id) if board.columns.contains_key(id.as_str()) => {
            DragTarget::Column(ColumnId::from(id.as_str()))
        }
        other => other.clone(),
    };
    if over == event.dragged {
        return None;
    }

    match &event.dragged {
        DragTarget::Column(dragged) => {
            let from_index = board.column_position(dragged.as_str())?;
            let to_index = board.column_position(over.id())?;
            Some(DragIntent::ReorderColumns { from_index, to_index })
        }
        DragTarget::Task(dragged) => {
            let from = board.column_of(dragged.as_str())?.clone();
            let to = match &over {
                DragTarget::Column(id) if board.columns.contains_key(id) => id.clone(),
                DragTarget::Task(id) => board
                    .column_of(id.as_str())
                    .unwrap_or(&from)
                    .clone(),
                DragTarget::Column(_) => from.clone(),
            };

            let from_index = board.columns[&from].position(dragged.as_str())?;
            let dest = &board.columns[&to];
            let to_index = dest.position(over.id()).unwrap_or(dest.task_ids.len());
            Some(DragIntent::MoveTask {
                task: dragged.clone(),
                from,
                to,
                from_index,
                to_index,
            })
        }
    }
}

/// Result of handing one drag event to the [`Translator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    /// Rejected by the offline guard; the board was not touched.
    Blocked,
    /// Nothing to do (no target, self-drop, stale ids).
    Ignored,
    TaskMoved {
        task: TaskId,
        from: ColumnId,
        to: ColumnId,
        /// The destination is the terminal column.
        completed: bool,
    },
    ColumnsReordered {
        from_index: usize,
        to_index: usize,
    },
}

impl DragOutcome {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked)
    }
}

/// Applies drag events to a store and announces completions.
#[derive(Default)]
pub struct Translator {
    sinks: Vec<Box<dyn CompletionSink>>,
}

impl Translator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for tasks reaching the terminal column.
    pub fn on_completion(&mut self, sink: impl CompletionSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    pub fn handle(&mut self, store: &mut Store, event: &DragEnd) -> DragOutcome {
        if !store.is_online() {
            tracing::debug!(?event, "drag blocked while offline");
            return DragOutcome::Blocked;
        }

        let board = store.board();
        let Some(intent) = resolve(&board, event) else {
            tracing::debug!(?event, "drag ignored");
            return DragOutcome::Ignored;
        };

        match intent {
            DragIntent::ReorderColumns { from_index, to_index } => {
                if !store.reorder_columns(from_index, to_index) {
                    return DragOutcome::Ignored;
                }
                DragOutcome::ColumnsReordered { from_index, to_index }
            }
            DragIntent::MoveTask {
                task,
                from,
                to,
                from_index,
                to_index,
            } => {
                if !store.move_task(from.as_str(), to.as_str(), from_index, to_index) {
                    return DragOutcome::Ignored;
                }
                let completed = store.board().last_column() == Some(&to);
                if completed {
                    self.announce(&Completion {
                        task: task.clone(),
                        column: to.clone(),
                    });
                }
                DragOutcome::TaskMoved {
                    task,
                    from,
                    to,
                    completed,
                }
            }
        }
    }

    fn announce(&mut self, completion: &Completion) {
        for sink in &mut self.sinks {
            if let Err(e) = sink.completed(completion) {
                tracing::warn!(error = %e, task = %completion.task, "completion feedback failed");
            }
        }
    }
}
