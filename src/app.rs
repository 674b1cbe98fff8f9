use std::time::{Duration, Instant};

use crate::board::Board;
use crate::config::BoardConfig;
use crate::drag::{DragOutcome, Translator};
use crate::input::action::Action;
use crate::notify::CompletionSink;
use crate::store::Store;

/// How long a notice stays visible unless configured otherwise.
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(3);

/// Message shown when a board edit is attempted while offline.
pub const OFFLINE_MESSAGE: &str = "Connection lost: Action disabled";

/// Notice severity for presentation coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A transient, user-visible message that clears itself after a fixed window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub level: NoticeLevel,
    pub expires: Instant,
}

/// What happened to a dispatched action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult {
    /// The board or connectivity flag changed.
    Applied,
    /// Refused by the offline guard.
    Blocked,
    /// Valid but nothing to do (stale ids, drop on self, repeated signal).
    Ignored,
    /// Bad input from the form layer, e.g. an empty title.
    Rejected,
}

/// One page session: the store, the drag translator, and the current notice.
pub struct Session {
    pub store: Store,
    translator: Translator,
    pub notice: Option<Notice>,
    notice_ttl: Duration,
}

impl Session {
    pub fn new(board: Board) -> Self {
        Self {
            store: Store::new(board),
            translator: Translator::new(),
            notice: None,
            notice_ttl: DEFAULT_NOTICE_TTL,
        }
    }

    /// Build a session from a loaded config.
    pub fn from_config(config: &BoardConfig) -> Result<Self, crate::config::ConfigError> {
        let mut session = Self::new(config.build_board()?);
        session.notice_ttl = Duration::from_secs(config.board.notice_secs);
        session.store.set_online(config.board.start_online);
        Ok(session)
    }

    pub fn board(&self) -> std::sync::Arc<Board> {
        self.store.board()
    }

    pub fn is_online(&self) -> bool {
        self.store.is_online()
    }

    /// Forward completion notifications (task reached the last column) to `sink`.
    pub fn on_completion(&mut self, sink: impl CompletionSink + 'static) {
        self.translator.on_completion(sink);
    }

    /// Show a transient notification.
    pub fn notify(&mut self, msg: impl Into<String>) {
        self.set_notice(msg.into(), NoticeLevel::Info);
    }

    /// Show a transient error notification.
    pub fn notify_error(&mut self, msg: impl Into<String>) {
        self.set_notice(msg.into(), NoticeLevel::Error);
    }

    fn set_notice(&mut self, message: String, level: NoticeLevel) {
        self.notice = Some(Notice {
            message,
            level,
            expires: expiry(Instant::now(), self.notice_ttl),
        });
    }

    /// Clear the notice once its window has passed.
    pub fn tick(&mut self, now: Instant) {
        if self.notice.as_ref().is_some_and(|n| now >= n.expires) {
            self.notice = None;
        }
    }

    pub fn process_action(&mut self, action: Action) -> ActionResult {
        if action.mutates_board() && !self.store.is_online() {
            self.notify_error(OFFLINE_MESSAGE);
            return ActionResult::Blocked;
        }

        match action {
            Action::None => ActionResult::Ignored,

            Action::SetOnline(online) => {
                if self.store.is_online() == online {
                    return ActionResult::Ignored;
                }
                self.store.set_online(online);
                if online {
                    self.notify("Back online");
                } else {
                    self.notify_error("You are offline. Drag & drop is disabled.");
                }
                ActionResult::Applied
            }

            Action::DragEnd(event) => match self.translator.handle(&mut self.store, &event) {
                DragOutcome::Blocked => {
                    self.notify_error(OFFLINE_MESSAGE);
                    ActionResult::Blocked
                }
                DragOutcome::Ignored => ActionResult::Ignored,
                DragOutcome::TaskMoved { completed: true, task, .. } => {
                    let title = self
                        .store
                        .board()
                        .task(task.as_str())
                        .map(|t| t.title.clone())
                        .unwrap_or_else(|| task.to_string());
                    self.notify(format!("{title} completed"));
                    ActionResult::Applied
                }
                DragOutcome::TaskMoved { .. } | DragOutcome::ColumnsReordered { .. } => {
                    ActionResult::Applied
                }
            },

            Action::AddTask { column, title } => {
                if title.trim().is_empty() {
                    self.notify_error("Task title cannot be empty");
                    return ActionResult::Rejected;
                }
                match self.store.add_task(column.as_str(), &title) {
                    Some(_) => ActionResult::Applied,
                    None => ActionResult::Ignored,
                }
            }

            Action::RemoveTask(task) => {
                if self.store.remove_task(task.as_str()) {
                    self.notify("Task removed");
                    ActionResult::Applied
                } else {
                    ActionResult::Ignored
                }
            }

            Action::AddColumn { title } => {
                if title.trim().is_empty() {
                    self.notify_error("Column title cannot be empty");
                    return ActionResult::Rejected;
                }
                self.store.add_column(&title);
                ActionResult::Applied
            }

            Action::RemoveColumn(column) => {
                let Some(n) = self
                    .store
                    .board()
                    .column(column.as_str())
                    .map(|c| c.task_ids.len())
                else {
                    return ActionResult::Ignored;
                };
                self.store.remove_column(column.as_str());
                self.notify(format!(
                    "Column removed ({n} task{})",
                    if n == 1 { "" } else { "s" }
                ));
                ActionResult::Applied
            }
        }
    }
}

/// `now + ttl`, falling back to the default window if that overflows the clock.
fn expiry(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl)
        .unwrap_or_else(|| now + DEFAULT_NOTICE_TTL)
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Board::seeded())
    }
}
