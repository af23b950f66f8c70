//! Clock sources consumed by the generators.
//!
//! The generators never read the system time directly; they ask a [`Clock`] for the current UTC
//! instant. [`SystemClock`] is used by the default entry points, while tests and simulations can
//! pass a [`FixedClock`] or any closure returning a [`DateTime<Utc>`].
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use sortid::clock::{Clock, FixedClock};
//!
//! let clock = FixedClock::new(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap());
//! assert_eq!(clock.unix_ts_ms(), 1_700_000_000_000);
//!
//! clock.advance(chrono::Duration::milliseconds(5));
//! assert_eq!(clock.unix_ts_ms(), 1_700_000_000_005);
//! ```

use chrono::{DateTime, TimeZone, Utc};
use std::cell::Cell;

use crate::id::MAX_TIMESTAMP;

/// A source of the current UTC instant.
pub trait Clock {
    /// Returns the current instant in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the current instant converted into the time zone `tz`.
    fn now_in<Tz: TimeZone>(&self, tz: &Tz) -> DateTime<Tz>
    where
        Self: Sized,
    {
        self.now().with_timezone(tz)
    }

    /// Returns the current instant as milliseconds since the Unix epoch, saturated into the
    /// 48-bit range an identifier timestamp can hold.
    ///
    /// Instants before the Unix epoch read as `0`; instants past the year 10889 read as
    /// `2^48 - 1`.
    fn unix_ts_ms(&self) -> u64 {
        self.now().timestamp_millis().clamp(0, MAX_TIMESTAMP as i64) as u64
    }

    /// Returns the current instant as 100-nanosecond ticks since 0001-01-01T00:00:00Z,
    /// saturated into the `i64` range.
    fn ticks(&self) -> i64 {
        crate::version::datetime_to_ticks(&self.now())
    }
}

/// The operating system's wall clock.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that returns a stored instant until told otherwise.
///
/// The stored instant lives in a [`Cell`], so a shared reference is enough to move the clock
/// forwards or backwards between generator calls.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FixedClock(Cell<DateTime<Utc>>);

impl FixedClock {
    /// Creates a clock frozen at `instant`.
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self(Cell::new(instant))
    }

    /// Creates a clock frozen at `unix_ts_ms` milliseconds since the Unix epoch.
    ///
    /// Values outside the range `chrono` can represent saturate to its bounds.
    pub fn from_unix_ts_ms(unix_ts_ms: i64) -> Self {
        let instant = match Utc.timestamp_millis_opt(unix_ts_ms).single() {
            Some(instant) => instant,
            None if unix_ts_ms < 0 => DateTime::<Utc>::MIN_UTC,
            None => DateTime::<Utc>::MAX_UTC,
        };
        Self::new(instant)
    }

    /// Moves the clock to `instant`, which may be earlier than the current one.
    pub fn set(&self, instant: DateTime<Utc>) {
        self.0.set(instant);
    }

    /// Moves the clock forwards by `delta`, saturating at the largest representable instant.
    pub fn advance(&self, delta: chrono::Duration) {
        let next = self
            .0
            .get()
            .checked_add_signed(delta)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.0.set(next);
    }

    /// Moves the clock backwards by `delta`, saturating at the smallest representable instant.
    pub fn rewind(&self, delta: chrono::Duration) {
        let prev = self
            .0
            .get()
            .checked_sub_signed(delta)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.0.set(prev);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0.get()
    }
}

impl<F: Fn() -> DateTime<Utc>> Clock for F {
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}
