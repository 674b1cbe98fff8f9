//! Completion feedback: fired when a task lands in the terminal column.

use std::io::Write;

use crate::board::{ColumnId, TaskId};

/// A task was moved into the last column of the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub task: TaskId,
    pub column: ColumnId,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("completion feedback unsupported: {0}")]
    Unsupported(#[from] std::io::Error),
    #[error("completion feedback failed: {0}")]
    Failed(String),
}

/// Receiver of completion notifications. Failures are logged and dropped by the caller.
pub trait CompletionSink {
    fn completed(&mut self, completion: &Completion) -> Result<(), NotifyError>;
}

impl<F> CompletionSink for F
where
    F: FnMut(&Completion) -> Result<(), NotifyError>,
{
    fn completed(&mut self, completion: &Completion) -> Result<(), NotifyError> {
        self(completion)
    }
}

/// Rings the terminal bell and prints a one-line confirmation.
pub struct TerminalBell<W: Write> {
    out: W,
}

impl<W: Write> TerminalBell<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> CompletionSink for TerminalBell<W> {
    fn completed(&mut self, completion: &Completion) -> Result<(), NotifyError> {
        write!(self.out, "\x07")?;
        writeln!(
            self.out,
            "done: {} reached {}",
            completion.task, completion.column
        )?;
        self.out.flush()?;
        Ok(())
    }
}
