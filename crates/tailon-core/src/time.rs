// ── Paired monotonic / wall-clock instant ──
//
// Deadlines are compared on the monotonic clock; everything shown to the
// user (elapsed time, synthetic log timestamps) uses wall-clock time.
// Capturing both at once keeps a single tick internally consistent and
// lets tests drive time explicitly.

use std::time::{Duration, Instant};

use chrono::{DateTime, TimeDelta, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moment {
    pub instant: Instant,
    pub wall: DateTime<Utc>,
}

impl Moment {
    pub fn now() -> Self {
        Self {
            instant: Instant::now(),
            wall: Utc::now(),
        }
    }

    /// Both clocks moved forward by `by`.
    pub fn advance(self, by: Duration) -> Self {
        Self {
            instant: self.instant + by,
            wall: self.wall + TimeDelta::from_std(by).unwrap_or(TimeDelta::zero()),
        }
    }
}
