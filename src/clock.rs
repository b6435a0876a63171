use chrono::{DateTime, Utc};
use std::{thread, time::Duration};

/// A source of wall-clock time for generators.
///
/// This lets tests drive a generator with a manual clock instead of the
/// system time. Implementations that don't really sleep must still make
/// `now` advance after `sleep`, otherwise a generator waiting out an
/// exhausted tick never returns.
pub trait Clock {
    /// The current time.
    fn now(&self) -> DateTime<Utc>;

    /// Block the calling thread for `duration`.
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}
