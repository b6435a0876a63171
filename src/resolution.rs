use chrono::{DateTime, Utc};
use std::time::Duration;

/// The time unit a generator counts ticks in.
///
/// A coarser resolution stretches the lifetime of the timestamp bits at the
/// cost of fewer identifiers per unit of wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Resolution {
    #[default]
    Millisecond,
    /// 10 msec, the unit used by Sonyflake-style generators.
    Centisecond,
    Second,
    Minute,
}

impl Resolution {
    /// Length of one tick in nanoseconds.
    pub const fn nanos(self) -> i128 {
        match self {
            Resolution::Millisecond => 1_000_000,
            Resolution::Centisecond => 10_000_000,
            Resolution::Second => 1_000_000_000,
            Resolution::Minute => 60_000_000_000,
        }
    }

    /// Length of one tick.
    pub fn duration(self) -> Duration {
        Duration::from_nanos(self.nanos() as u64)
    }

    /// Number of whole ticks elapsed between `epoch` and `now`.
    ///
    /// Floors toward negative infinity, so any instant before the epoch maps
    /// to a negative tick.
    pub fn ticks_between(self, epoch: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        let ticks = elapsed_nanos(epoch, now).div_euclid(self.nanos());
        ticks.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
    }

    /// Time left until the tick containing `now` ends.
    pub fn until_next_tick(self, epoch: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
        let into_tick = elapsed_nanos(epoch, now).rem_euclid(self.nanos());
        Duration::from_nanos((self.nanos() - into_tick) as u64)
    }
}

fn elapsed_nanos(epoch: DateTime<Utc>, now: DateTime<Utc>) -> i128 {
    to_nanos(now) - to_nanos(epoch)
}

fn to_nanos(time: DateTime<Utc>) -> i128 {
    i128::from(time.timestamp()) * 1_000_000_000 + i128::from(time.timestamp_subsec_nanos())
}
