use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::board::{Board, Column, ColumnId, Task, TaskId};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("toml deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[error("duplicate column id {0:?}")]
    DuplicateColumn(ColumnId),
    #[error("duplicate task id {0:?}")]
    DuplicateTask(TaskId),
    #[error("notice_secs = {0} exceeds the maximum of {MAX_NOTICE_SECS}")]
    NoticeTooLong(u64),
}

/// Longest notice window a config may ask for (one hour).
pub const MAX_NOTICE_SECS: u64 = 3600;

/// Contents of a board TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default)]
    pub board: BoardSection,
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
}

/// Session-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSection {
    /// Seconds a notice stays visible.
    #[serde(default = "default_notice_secs")]
    pub notice_secs: u64,
    /// Connectivity flag before the first online/offline signal arrives.
    #[serde(default = "default_start_online")]
    pub start_online: bool,
}

fn default_notice_secs() -> u64 {
    3
}
fn default_start_online() -> bool {
    true
}

impl Default for BoardSection {
    fn default() -> Self {
        Self {
            notice_secs: default_notice_secs(),
            start_online: default_start_online(),
        }
    }
}

/// One seeded column, listed in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub id: ColumnId,
    pub title: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl BoardConfig {
    /// Build the starting board, rejecting any id used twice.
    pub fn build_board(&self) -> Result<Board, ConfigError> {
        if self.board.notice_secs > MAX_NOTICE_SECS {
            return Err(ConfigError::NoticeTooLong(self.board.notice_secs));
        }
        let mut board = Board::empty();
        for col in &self.columns {
            if board.columns.contains_key(&col.id) {
                return Err(ConfigError::DuplicateColumn(col.id.clone()));
            }
            board.insert_column(Column::new(col.id.clone(), col.title.clone()));
            for task in &col.tasks {
                if board.tasks.contains_key(&task.id) {
                    return Err(ConfigError::DuplicateTask(task.id.clone()));
                }
                board.insert_task(&col.id, task.clone());
            }
        }
        Ok(board)
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        let board = Board::seeded();
        let columns = board
            .ordered_columns()
            .map(|col| ColumnConfig {
                id: col.id.clone(),
                title: col.title.clone(),
                tasks: col
                    .task_ids
                    .iter()
                    .filter_map(|id| board.tasks.get(id).cloned())
                    .collect(),
            })
            .collect();
        Self {
            board: BoardSection::default(),
            columns,
        }
    }
}

/// Load a board config from a TOML file.
pub fn load_config(path: &Path) -> Result<BoardConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.toml");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config_matches_seeded_board() {
        let board = BoardConfig::default().build_board().unwrap();
        assert_eq!(board, Board::seeded());
    }

    #[test]
    fn test_load_config_from_file() {
        let (_dir, path) = write_config(
            r#"
[board]
notice_secs = 5

[[columns]]
id = "todo"
title = "To Do"
tasks = [
    { id = "t1", title = "Write tests" },
    { id = "t2", title = "Ship it" },
]

[[columns]]
id = "done"
title = "Done"
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.board.notice_secs, 5);
        assert!(config.board.start_online);

        let board = config.build_board().unwrap();
        assert_eq!(board.column_order, vec![ColumnId::from("todo"), ColumnId::from("done")]);
        assert_eq!(board.task("t2").unwrap().title, "Ship it");
        assert!(board.columns["done"].task_ids.is_empty());
        board.check_invariants().unwrap();
    }

    #[test]
    fn test_empty_file_gives_empty_board() {
        let (_dir, path) = write_config("");
        let config = load_config(&path).unwrap();
        assert_eq!(config.board, BoardSection::default());
        assert_eq!(config.build_board().unwrap(), Board::empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let config: BoardConfig = toml::from_str(
            r#"
[[columns]]
id = "a"
title = "A"
tasks = [{ id = "t1", title = "x" }]

[[columns]]
id = "b"
title = "B"
tasks = [{ id = "t1", title = "y" }]
"#,
        )
        .unwrap();
        assert!(matches!(config.build_board(), Err(ConfigError::DuplicateTask(id)) if id.as_str() == "t1"));

        let config: BoardConfig = toml::from_str(
            r#"
[[columns]]
id = "a"
title = "A"

[[columns]]
id = "a"
title = "Again"
"#,
        )
        .unwrap();
        assert!(matches!(config.build_board(), Err(ConfigError::DuplicateColumn(_))));
    }

    #[test]
    fn test_oversized_notice_window_rejected() {
        let config: BoardConfig = toml::from_str("[board]\nnotice_secs = 9223372036854775807").unwrap();
        assert!(matches!(
            config.build_board(),
            Err(ConfigError::NoticeTooLong(9_223_372_036_854_775_807))
        ));

        let mut config = BoardConfig::default();
        config.board.notice_secs = MAX_NOTICE_SECS;
        assert!(config.build_board().is_ok());
    }

    #[test]
    fn test_missing_file_and_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));

        let (_dir, path) = write_config("[[columns]]\nid = ");
        assert!(matches!(load_config(&path), Err(ConfigError::TomlDe(_))));
    }
}
