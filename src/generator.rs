//! Time-ordered identifier generator and related types.

use rand::RngCore;
use std::{hint, thread};

use crate::clock::{Clock, SystemClock};
use crate::id::{MAX_COUNTER, MAX_RANDOM_TAIL, MAX_TIMESTAMP};
use crate::TimeOrderedId;

/// Represents an identifier generator that encapsulates a counter and guarantees the monotonic
/// order of identifiers generated through the same instance.
///
/// The generator keeps the last timestamp and counter it emitted. On each call:
///
/// 1.  If the clock has moved past the last timestamp, the new timestamp is adopted and the
///     counter restarts at zero.
/// 2.  If the clock still reads the last timestamp, or reads an earlier one (a clock rollback),
///     the last timestamp is kept and the counter is incremented.
/// 3.  If the counter cannot be incremented any further, [`generate_with`] spins until the clock
///     moves past the last timestamp, while [`generate_core`] returns `None`.
///
/// Every identifier receives a fresh random tail from the generator's random number generator.
///
/// The default entry points keep one generator per thread. To guarantee the order across
/// threads, share one instance behind a lock, as [`new_id_global`](crate::new_id_global) does:
///
/// ```rust
/// use rand::rngs::OsRng;
/// use sortid::IdGenerator;
/// use std::{sync, thread};
///
/// let g = sync::Arc::new(sync::Mutex::new(IdGenerator::new(OsRng)));
/// thread::scope(|s| {
///     for i in 0..4 {
///         let g = sync::Arc::clone(&g);
///         s.spawn(move || {
///             for _ in 0..8 {
///                 println!("{} by thread {}", g.lock().unwrap().generate(), i);
///                 thread::yield_now();
///             }
///         });
///     }
/// });
/// ```
///
/// [`generate_with`]: IdGenerator::generate_with
/// [`generate_core`]: IdGenerator::generate_core
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct IdGenerator<R> {
    timestamp: u64,
    counter: u32,

    /// The random number generator used by the generator.
    rng: R,
}

impl<R: RngCore> IdGenerator<R> {
    /// Creates a generator instance.
    pub const fn new(rng: R) -> Self {
        Self {
            timestamp: 0,
            counter: 0,
            rng,
        }
    }

    /// Generates a new identifier from the system clock.
    pub fn generate(&mut self) -> TimeOrderedId {
        self.generate_with(&SystemClock)
    }

    /// Generates a new identifier from the time `clock` reports.
    ///
    /// When more than [`MAX_COUNTER`](crate::MAX_COUNTER) + 1 identifiers have been requested
    /// within the same millisecond, this method re-reads `clock`, yielding the thread in between,
    /// until it reports a later millisecond.
    pub fn generate_with<C: Clock + ?Sized>(&mut self, clock: &C) -> TimeOrderedId {
        if let Some(value) = self.generate_core(clock.unix_ts_ms()) {
            return value;
        }

        tracing::debug!(
            timestamp = self.timestamp,
            "counter exhausted; waiting for the clock to advance"
        );
        let mut yields: u64 = 0;
        loop {
            hint::spin_loop();
            thread::yield_now();
            yields += 1;
            if let Some(value) = self.generate_core(clock.unix_ts_ms()) {
                tracing::trace!(timestamp = self.timestamp, yields, "clock advanced");
                return value;
            }
        }
    }

    /// Generates a new identifier from the `unix_ts_ms` passed, or returns `None` if the counter
    /// is exhausted for the timestamp in use.
    ///
    /// A `unix_ts_ms` smaller than the one most recently used is treated as equal to it. Values
    /// beyond the 48-bit range saturate to [`MAX_TIMESTAMP`](crate::MAX_TIMESTAMP).
    ///
    /// `None` leaves the generator untouched; call again with a larger `unix_ts_ms`.
    pub fn generate_core(&mut self, unix_ts_ms: u64) -> Option<TimeOrderedId> {
        let unix_ts_ms = unix_ts_ms.min(MAX_TIMESTAMP);

        if unix_ts_ms > self.timestamp {
            self.timestamp = unix_ts_ms;
            self.counter = 0;
        } else if self.counter < MAX_COUNTER {
            if unix_ts_ms < self.timestamp {
                tracing::trace!(
                    observed = unix_ts_ms,
                    last = self.timestamp,
                    "clock behind last timestamp; reusing last timestamp"
                );
            }
            self.counter += 1;
        } else {
            return None;
        }

        Some(TimeOrderedId::from_fields(
            self.timestamp,
            self.counter,
            self.rng.next_u64() & MAX_RANDOM_TAIL,
        ))
    }
}

/// Supports operations as an infinite iterator that produces a new identifier for each call of
/// `next()`.
///
/// # Examples
///
/// ```rust
/// use sortid::IdGenerator;
///
/// IdGenerator::new(rand::thread_rng())
///     .enumerate()
///     .skip(4)
///     .take(4)
///     .for_each(|(i, e)| println!("[{i}] {e}"));
/// ```
impl<R: RngCore> Iterator for IdGenerator<R> {
    type Item = TimeOrderedId;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.generate())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

impl<R: RngCore> std::iter::FusedIterator for IdGenerator<R> {}
