// Clock collaborator
// Supplies "now" so time-sensitive rules never read the system clock directly

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

/// Source of the current UTC instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time from the operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to one instant, for tests and replays
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// One reading of the clock in both frames the domain needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockReading {
    /// Used for metadata stamps
    pub instant: DateTime<Utc>,
    /// Property-local wall time, comparable with reservation windows
    pub local: NaiveDateTime,
}

impl ClockReading {
    pub fn new(instant: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            instant,
            local: instant.with_timezone(&offset).naive_local(),
        }
    }

    /// Read a clock and convert to property-local time
    pub fn read(clock: &dyn Clock, offset: FixedOffset) -> Self {
        Self::new(clock.now(), offset)
    }

    /// Property-local calendar date
    pub fn today(&self) -> NaiveDate {
        self.local.date()
    }
}
