use chrono::{DateTime, Utc};

const MS_PER_SECOND: i64 = 1_000;
const MS_PER_MINUTE: i64 = 60 * MS_PER_SECOND;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Remaining time until the reveal target, broken into display fields.
///
/// All fields use floor semantics on the millisecond difference; once the
/// target has passed every field is zero and the gate is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeLeft {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub total_ms: i64,
}

impl TimeLeft {
    /// True once the wall clock has reached the target timestamp.
    pub fn is_open(&self) -> bool {
        self.total_ms == 0
    }
}

/// Compute the time remaining from `now` until `target`.
pub fn time_left(now: DateTime<Utc>, target: DateTime<Utc>) -> TimeLeft {
    let diff = (target - now).num_milliseconds();
    if diff <= 0 {
        return TimeLeft::default();
    }
    TimeLeft {
        days: diff / MS_PER_DAY,
        hours: (diff / MS_PER_HOUR) % 24,
        minutes: (diff / MS_PER_MINUTE) % 60,
        seconds: (diff / MS_PER_SECOND) % 60,
        total_ms: diff,
    }
}
