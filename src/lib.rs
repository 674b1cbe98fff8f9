//! In-memory kanban board: a snapshot store plus a translator that turns
//! drag-and-drop completions into store mutations.

pub mod app;
pub mod board;
pub mod command;
pub mod config;
pub mod drag;
pub mod input;
pub mod notify;
pub mod store;

pub use app::{ActionResult, Session};
pub use board::{Board, Column, ColumnId, Task, TaskId};
pub use drag::{DragEnd, DragOutcome, DragTarget, Translator};
pub use input::action::Action;
pub use store::{Change, Store};
