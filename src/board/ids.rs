use chrono::{DateTime, Utc};

/// Issues time-based ids (`task-1718000000123`) that never repeat within a session.
///
/// Two ids minted in the same millisecond, or after the wall clock steps
/// backwards, get the last issued stamp plus one.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last_stamp: i64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next id for `prefix` and advance the counter.
    pub fn next(&mut self, prefix: &str, now: DateTime<Utc>) -> String {
        let mut stamp = now.timestamp_millis();
        if stamp <= self.last_stamp {
            stamp = self.last_stamp + 1;
        }
        self.last_stamp = stamp;
        format!("{prefix}-{stamp}")
    }
}
