use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Millisecond timestamps that never repeat and never go backwards.
///
/// Backup and upload names embed these tokens, so two saves landing in the
/// same millisecond (or a wall clock stepping back) still produce distinct,
/// strictly increasing names.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: AtomicI64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }

    pub fn next_millis(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut previous = self.last.load(Ordering::SeqCst);

        loop {
            let next = if now > previous { now } else { previous + 1 };
            match self
                .last
                .compare_exchange(previous, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => previous = actual,
            }
        }
    }

    // raise the floor so tokens issued later sort after one already on disk
    pub fn observe(&self, millis: i64) {
        self.last.fetch_max(millis, Ordering::SeqCst);
    }
}
