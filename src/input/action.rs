use crate::board::{ColumnId, TaskId};
use crate::drag::DragEnd;

/// Every intent the presentation layer can dispatch into a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Connectivity
    SetOnline(bool),

    // Drag and drop
    DragEnd(DragEnd),

    // Form actions
    AddTask { column: ColumnId, title: String },
    RemoveTask(TaskId),
    AddColumn { title: String },
    RemoveColumn(ColumnId),

    // No-op
    None,
}

impl Action {
    /// Whether this action edits board data (and is therefore refused offline).
    pub fn mutates_board(&self) -> bool {
        !matches!(self, Self::SetOnline(_) | Self::None)
    }
}
