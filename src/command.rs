//! Line commands for driving a session from a script or stdin.
//!
//! Each non-blank, non-comment line names one action:
//!
//! ```text
//! offline
//! drag task-1 column-col-2
//! add-task col-1 Interview Sam Lee
//! show
//! ```

use crate::app::{ActionResult, Session};
use crate::drag::{DragEnd, DragParseError};
use crate::input::action::Action;

/// Command metadata for the `help` listing.
pub struct CommandInfo {
    pub name: &'static str,
    pub usage: &'static str,
}

pub const COMMANDS: &[CommandInfo] = &[
    CommandInfo { name: "add-col",  usage: "add-col <title>" },
    CommandInfo { name: "add-task", usage: "add-task <column-id> <title>" },
    CommandInfo { name: "drag",     usage: "drag <dragged-id> [<drop-id>|-]" },
    CommandInfo { name: "offline",  usage: "offline" },
    CommandInfo { name: "online",   usage: "online" },
    CommandInfo { name: "rm-col",   usage: "rm-col <column-id>" },
    CommandInfo { name: "rm-task",  usage: "rm-task <task-id>" },
    CommandInfo { name: "show",     usage: "show" },
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("{command}: missing {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("{command}: unexpected argument {argument:?}")]
    UnexpectedArgument {
        command: &'static str,
        argument: String,
    },
    #[error("invalid drag id: {0}")]
    InvalidDrag(#[from] DragParseError),
}

/// One parsed script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Apply(Action),
    Show,
}

/// Parse a command line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Step>, CommandError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (cmd, rest) = match line.find(char::is_whitespace) {
        Some(pos) => (&line[..pos], line[pos..].trim_start()),
        None => (line, ""),
    };

    let step = match cmd {
        "online" => Step::Apply(Action::SetOnline(true)),
        "offline" => Step::Apply(Action::SetOnline(false)),
        "show" => Step::Show,
        "drag" => {
            let mut parts = rest.split_whitespace();
            let dragged = parts.next().ok_or(CommandError::MissingArgument {
                command: "drag",
                argument: "dragged id",
            })?;
            let over = parts.next().filter(|id| *id != "-");
            no_more(parts, "drag")?;
            Step::Apply(Action::DragEnd(DragEnd::from_ids(dragged, over)?))
        }
        "add-task" => {
            let (column, title) = split_first(rest);
            if column.is_empty() {
                return Err(CommandError::MissingArgument {
                    command: "add-task",
                    argument: "column id",
                });
            }
            Step::Apply(Action::AddTask {
                column: column.into(),
                title: title.to_string(),
            })
        }
        "rm-task" => Step::Apply(Action::RemoveTask(
            required(rest, "rm-task", "task id")?.into(),
        )),
        "add-col" => Step::Apply(Action::AddColumn {
            title: rest.to_string(),
        }),
        "rm-col" => Step::Apply(Action::RemoveColumn(
            required(rest, "rm-col", "column id")?.into(),
        )),
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Some(step))
}

fn split_first(s: &str) -> (&str, &str) {
    match s.find(char::is_whitespace) {
        Some(pos) => (&s[..pos], s[pos..].trim_start()),
        None => (s, ""),
    }
}

/// The single id argument of `command`; anything after it is an error.
fn required<'a>(
    rest: &'a str,
    command: &'static str,
    argument: &'static str,
) -> Result<&'a str, CommandError> {
    let mut parts = rest.split_whitespace();
    let value = parts
        .next()
        .ok_or(CommandError::MissingArgument { command, argument })?;
    no_more(parts, command)?;
    Ok(value)
}

fn no_more<'a>(
    mut parts: impl Iterator<Item = &'a str>,
    command: &'static str,
) -> Result<(), CommandError> {
    match parts.next() {
        Some(extra) => Err(CommandError::UnexpectedArgument {
            command,
            argument: extra.to_string(),
        }),
        None => Ok(()),
    }
}

/// Run one parsed step against a session. Returns text to print, if any.
pub fn execute_step(session: &mut Session, step: Step) -> Option<String> {
    match step {
        Step::Show => {
            let status = if session.is_online() { "online" } else { "OFFLINE" };
            Some(format!("-- {status} --\n{}", session.board()))
        }
        Step::Apply(action) => {
            let result = session.process_action(action);
            if matches!(result, ActionResult::Blocked | ActionResult::Rejected) {
                tracing::debug!(?result, "action not applied");
            }
            session.notice.take().map(|n| n.message)
        }
    }
}
