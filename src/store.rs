//! The board store: one authoritative snapshot, mutated only through named operations.
//!
//! Each mutation clones the current board, edits the clone, and publishes it as
//! a new `Arc<Board>` only when the edit applied. Readers holding an earlier
//! snapshot keep seeing exactly what they were handed.

use std::sync::Arc;

use chrono::Utc;

use crate::board::ids::IdGenerator;
use crate::board::{Board, Column, ColumnId, Task, TaskId};

/// What an applied mutation did. Delivered to subscribers with the new snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    OnlineChanged(bool),
    TaskAdded {
        task: TaskId,
        column: ColumnId,
    },
    TaskRemoved {
        task: TaskId,
    },
    TaskMoved {
        task: TaskId,
        from: ColumnId,
        to: ColumnId,
        to_index: usize,
    },
    ColumnAdded {
        column: ColumnId,
    },
    /// `tasks` lists every task deleted along with the column.
    ColumnRemoved {
        column: ColumnId,
        tasks: Vec<TaskId>,
    },
    ColumnsReordered {
        from_index: usize,
        to_index: usize,
    },
}

/// Handle returned by [`Store::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&Change, &Board)>;

/// Session-lifetime board state plus the connectivity flag.
pub struct Store {
    board: Arc<Board>,
    online: bool,
    ids: IdGenerator,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl Store {
    pub fn new(board: Board) -> Self {
        Self {
            board: Arc::new(board),
            online: true,
            ids: IdGenerator::new(),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// The current immutable snapshot.
    pub fn board(&self) -> Arc<Board> {
        Arc::clone(&self.board)
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Register a listener called after every applied mutation.
    pub fn subscribe(&mut self, listener: impl FnMut(&Change, &Board) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    /// Record the last observed connectivity signal. Repeating the current value is a no-op.
    pub fn set_online(&mut self, online: bool) {
        if self.online == online {
            return;
        }
        self.online = online;
        tracing::debug!(online, "connectivity changed");
        self.emit(&Change::OnlineChanged(online));
    }

    /// Move the task at `from_index` of `from` to `to_index` of `to`.
    ///
    /// Out-of-range `from_index` or unknown columns leave the board untouched;
    /// a `to_index` past the end appends. Returns whether the move applied.
    pub fn move_task(&mut self, from: &str, to: &str, from_index: usize, to_index: usize) -> bool {
        self.commit(|board| {
            let task = board.move_task(from, to, from_index, to_index)?;
            let to_col = &board.columns[to];
            let to_index = to_col.position(task.as_str()).unwrap_or(to_index);
            Some(Change::TaskMoved {
                task,
                from: ColumnId::from(from),
                to: to_col.id.clone(),
                to_index,
            })
        })
    }

    /// Create a task with a trimmed title at the end of `column`. Returns the new id.
    pub fn add_task(&mut self, column: &str, title: &str) -> Option<TaskId> {
        if !self.board.columns.contains_key(column) {
            return None;
        }
        let id = TaskId::from(self.fresh_id("task"));
        let applied = self.commit(|board| {
            let column = board.column(column)?.id.clone();
            board
                .insert_task(&column, Task::new(id.clone(), title.trim()))
                .then(|| Change::TaskAdded {
                    task: id.clone(),
                    column,
                })
        });
        applied.then_some(id)
    }

    /// Delete a task from the board and from its owning column.
    pub fn remove_task(&mut self, task_id: &str) -> bool {
        self.commit(|board| {
            let task = board.remove_task(task_id)?;
            Some(Change::TaskRemoved { task: task.id })
        })
    }

    /// Append a new empty column. Returns its id.
    pub fn add_column(&mut self, title: &str) -> ColumnId {
        let id = ColumnId::from(self.fresh_id("col"));
        self.commit(|board| {
            board.insert_column(Column::new(id.clone(), title.trim()));
            Some(Change::ColumnAdded { column: id.clone() })
        });
        id
    }

    /// Delete a column and every task it held.
    pub fn remove_column(&mut self, column_id: &str) -> bool {
        self.commit(|board| {
            let column = board.remove_column(column_id)?;
            Some(Change::ColumnRemoved {
                column: column.id,
                tasks: column.task_ids,
            })
        })
    }

    /// Move the column at `from_index` of the display order to `to_index`.
    pub fn reorder_columns(&mut self, from_index: usize, to_index: usize) -> bool {
        self.commit(|board| {
            board.reorder_columns(from_index, to_index).then(|| {
                let to_index = to_index.min(board.column_order.len() - 1);
                Change::ColumnsReordered { from_index, to_index }
            })
        })
    }

    /// Copy the board, apply `edit`, and publish the copy if the edit reported a change.
    fn commit(&mut self, edit: impl FnOnce(&mut Board) -> Option<Change>) -> bool {
        let mut next = Board::clone(&self.board);
        let Some(change) = edit(&mut next) else {
            tracing::debug!("mutation did not apply; snapshot unchanged");
            return false;
        };
        debug_assert_eq!(next.check_invariants(), Ok(()));
        tracing::debug!(?change, "board updated");
        self.board = Arc::new(next);
        self.emit(&change);
        true
    }

    fn emit(&mut self, change: &Change) {
        let board = Arc::clone(&self.board);
        for (_, listener) in &mut self.listeners {
            listener(change, &board);
        }
    }

    /// Mint an id that is unused by any task or column on the current board.
    fn fresh_id(&mut self, prefix: &str) -> String {
        loop {
            let id = self.ids.next(prefix, Utc::now());
            if !self.board.tasks.contains_key(id.as_str())
                && !self.board.columns.contains_key(id.as_str())
            {
                return id;
            }
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(Board::seeded())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::board::tests::{ids, test_board};

    fn order(store: &Store) -> Vec<String> {
        store
            .board()
            .column_order
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    fn recorder(store: &mut Store) -> Rc<RefCell<Vec<Change>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(move |change, _| sink.borrow_mut().push(change.clone()));
        seen
    }

    // -----------------------------------------------------------------------
    // Scenarios
    // -----------------------------------------------------------------------

    #[test]
    fn test_move_task_between_columns() {
        let mut store = Store::new(test_board(&[("col-1", &["t1", "t2"]), ("col-2", &[])]));
        assert!(store.move_task("col-1", "col-2", 0, 0));
        let board = store.board();
        assert_eq!(ids(&board, "col-1"), vec!["t2"]);
        assert_eq!(ids(&board, "col-2"), vec!["t1"]);
    }

    #[test]
    fn test_add_column_then_reorder() {
        let mut store = Store::new(test_board(&[("a", &[]), ("b", &[])]));
        let c = store.add_column("Hired");
        assert_eq!(store.board().columns[&c].title, "Hired");
        assert!(store.reorder_columns(2, 0));
        assert_eq!(order(&store), vec![c.to_string(), "a".into(), "b".into()]);
    }

    // -----------------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------------

    #[test]
    fn test_old_snapshot_is_not_mutated() {
        let mut store = Store::new(test_board(&[("a", &["t1"]), ("b", &[])]));
        let before = store.board();
        store.move_task("a", "b", 0, 0);
        store.remove_column("a");
        assert_eq!(ids(&before, "a"), vec!["t1"]);
        assert!(before.columns.contains_key("a"));
        assert!(!store.board().columns.contains_key("a"));
    }

    #[test]
    fn test_failed_mutation_keeps_same_snapshot() {
        let mut store = Store::new(test_board(&[("a", &["t1"])]));
        let before = store.board();
        assert!(!store.move_task("a", "a", 3, 0));
        assert!(!store.move_task("zz", "a", 0, 0));
        assert!(!store.remove_task("nope"));
        assert!(!store.remove_column("nope"));
        assert!(!store.reorder_columns(5, 0));
        assert!(store.add_task("nope", "title").is_none());
        assert!(Arc::ptr_eq(&before, &store.board()));
    }

    // -----------------------------------------------------------------------
    // Add / remove
    // -----------------------------------------------------------------------

    #[test]
    fn test_add_task_trims_and_appends() {
        let mut store = Store::new(test_board(&[("a", &["t1"])]));
        let id = store.add_task("a", "  Write docs  ").unwrap();
        let board = store.board();
        assert_eq!(board.task(id.as_str()).unwrap().title, "Write docs");
        assert_eq!(ids(&board, "a"), vec!["t1".to_string(), id.to_string()]);
        assert!(id.as_str().starts_with("task-"));
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let mut store = Store::new(test_board(&[("a", &[])]));
        let first = store.add_task("a", "one").unwrap();
        let second = store.add_task("a", "two").unwrap();
        let col_a = store.add_column("x");
        let col_b = store.add_column("y");
        assert_ne!(first, second);
        assert_ne!(col_a, col_b);
        assert_eq!(store.board().task_count(), 2);
    }

    #[test]
    fn test_remove_column_cascades_tasks() {
        let mut store = Store::new(test_board(&[("a", &["t1", "t2"]), ("b", &["t3"])]));
        assert!(store.remove_column("a"));
        let board = store.board();
        assert!(board.task("t1").is_none());
        assert!(board.task("t2").is_none());
        assert_eq!(board.task_count(), 1);
        assert_eq!(order(&store), vec!["b"]);
    }

    #[test]
    fn test_invariants_hold_across_mixed_operations() {
        let mut store = Store::new(test_board(&[("a", &["t1", "t2"]), ("b", &["t3"])]));
        let c = store.add_column("c");
        let t = store.add_task(c.as_str(), "new").unwrap();
        store.board().check_invariants().unwrap();
        store.remove_task("t1");
        store.board().check_invariants().unwrap();
        store.move_task(c.as_str(), "b", 0, 0);
        store.board().check_invariants().unwrap();
        store.remove_column("b");
        store.board().check_invariants().unwrap();
        assert!(store.board().task(t.as_str()).is_none());
        assert!(store.board().task("t3").is_none());
        assert_eq!(store.board().task_count(), 1);
    }

    // -----------------------------------------------------------------------
    // Connectivity & subscriptions
    // -----------------------------------------------------------------------

    #[test]
    fn test_set_online_is_idempotent() {
        let mut store = Store::default();
        let seen = recorder(&mut store);
        let before = store.board();
        store.set_online(true);
        store.set_online(true);
        assert!(store.is_online());
        assert!(seen.borrow().is_empty());

        store.set_online(false);
        store.set_online(false);
        assert!(!store.is_online());
        assert_eq!(*seen.borrow(), vec![Change::OnlineChanged(false)]);
        assert!(Arc::ptr_eq(&before, &store.board()));
    }

    #[test]
    fn test_subscribers_see_changes_in_order() {
        let mut store = Store::new(test_board(&[("a", &["t1", "t2"]), ("b", &[])]));
        let seen = recorder(&mut store);
        store.move_task("a", "a", 0, 1);
        store.remove_column("a");
        assert_eq!(
            *seen.borrow(),
            vec![
                Change::TaskMoved {
                    task: "t1".into(),
                    from: "a".into(),
                    to: "a".into(),
                    to_index: 1,
                },
                Change::ColumnRemoved {
                    column: "a".into(),
                    tasks: vec!["t2".into(), "t1".into()],
                },
            ]
        );
    }

    #[test]
    fn test_listener_receives_new_snapshot() {
        let mut store = Store::new(test_board(&[("a", &["t1"]), ("b", &[])]));
        let counts = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&counts);
        store.subscribe(move |_, board| sink.borrow_mut().push(board.columns["b"].task_ids.len()));
        store.move_task("a", "b", 0, 0);
        assert_eq!(*counts.borrow(), vec![1]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut store = Store::new(test_board(&[("a", &["t1"])]));
        let seen = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&seen);
        let sub = store.subscribe(move |_, _| *sink.borrow_mut() += 1);
        store.remove_task("t1");
        assert!(store.unsubscribe(sub));
        assert!(!store.unsubscribe(sub));
        store.add_column("x");
        assert_eq!(*seen.borrow(), 1);
    }

    // -----------------------------------------------------------------------
    // Random operation sequences
    // -----------------------------------------------------------------------

    mod properties {
        use proptest::prelude::*;

        use super::*;

        #[derive(Debug, Clone)]
        enum Op {
            AddTask { column: usize },
            RemoveTask { task: usize },
            AddColumn,
            RemoveColumn { column: usize },
            MoveTask { from: usize, to: usize, from_index: usize, to_index: usize },
            ReorderColumns { from_index: usize, to_index: usize },
        }

        /// Slots past the end of the board resolve to unknown ids or out-of-range indices.
        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0usize..6).prop_map(|column| Op::AddTask { column }),
                (0usize..12).prop_map(|task| Op::RemoveTask { task }),
                Just(Op::AddColumn),
                (0usize..6).prop_map(|column| Op::RemoveColumn { column }),
                (0usize..6, 0usize..6, 0usize..8, 0usize..8).prop_map(
                    |(from, to, from_index, to_index)| Op::MoveTask { from, to, from_index, to_index }
                ),
                (0usize..6, 0usize..6)
                    .prop_map(|(from_index, to_index)| Op::ReorderColumns { from_index, to_index }),
            ]
        }

        fn column_at(board: &Board, slot: usize) -> String {
            board
                .column_order
                .get(slot)
                .map_or_else(|| "ghost-col".to_string(), ToString::to_string)
        }

        fn task_at(board: &Board, slot: usize) -> String {
            let mut ids: Vec<String> = board.tasks.keys().map(ToString::to_string).collect();
            ids.sort();
            ids.get(slot).cloned().unwrap_or_else(|| "ghost-task".to_string())
        }

        fn sorted_order(board: &Board) -> Vec<ColumnId> {
            let mut order = board.column_order.clone();
            order.sort();
            order
        }

        proptest! {
            #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

            #[test]
            fn test_random_operations_keep_board_consistent(
                ops in proptest::collection::vec(op_strategy(), 1..40)
            ) {
                let mut store = Store::new(test_board(&[("a", &["t1", "t2"]), ("b", &["t3"]), ("c", &[])]));

                for op in ops {
                    let before = store.board();
                    let applied = match op {
                        Op::AddTask { column } => {
                            let column = column_at(&before, column);
                            let added = store.add_task(&column, "task").is_some();
                            prop_assert_eq!(added, before.columns.contains_key(column.as_str()));
                            added
                        }
                        Op::RemoveTask { task } => store.remove_task(&task_at(&before, task)),
                        Op::AddColumn => {
                            store.add_column("col");
                            prop_assert_eq!(store.board().column_order.len(), before.column_order.len() + 1);
                            true
                        }
                        Op::RemoveColumn { column } => {
                            let column = column_at(&before, column);
                            let removed = store.remove_column(&column);
                            if let Some(col) = before.column(&column) {
                                prop_assert!(removed);
                                prop_assert_eq!(
                                    store.board().task_count(),
                                    before.task_count() - col.task_ids.len()
                                );
                            }
                            removed
                        }
                        Op::MoveTask { from, to, from_index, to_index } => {
                            let (from, to) = (column_at(&before, from), column_at(&before, to));
                            let moved = store.move_task(&from, &to, from_index, to_index);
                            let after = store.board();
                            prop_assert_eq!(after.task_count(), before.task_count());
                            let placed: usize = after.columns.values().map(|c| c.task_ids.len()).sum();
                            prop_assert_eq!(placed, before.task_count());
                            prop_assert_eq!(&after.column_order, &before.column_order);
                            moved
                        }
                        Op::ReorderColumns { from_index, to_index } => {
                            let reordered = store.reorder_columns(from_index, to_index);
                            let after = store.board();
                            prop_assert_eq!(reordered, from_index < before.column_order.len());
                            prop_assert_eq!(sorted_order(&after), sorted_order(&before));
                            prop_assert_eq!(after.task_count(), before.task_count());
                            reordered
                        }
                    };

                    let after = store.board();
                    prop_assert_eq!(after.check_invariants(), Ok(()));
                    prop_assert_eq!(applied, !Arc::ptr_eq(&before, &after));
                }
            }
        }
    }
}
