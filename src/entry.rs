//! Thread-local generators and default entry point functions.

use rand::rngs::ThreadRng;
use std::cell::{Cell, RefCell};

use crate::clock::{Clock, SystemClock};
use crate::{IdGenerator, MonotonicVersion, TimeOrderedId, VersionGenerator};

thread_local! {
    static ID_GENERATOR: RefCell<IdGenerator<ThreadRng>> = Default::default();
    static VERSION_GENERATOR: Cell<VersionGenerator> = const { Cell::new(VersionGenerator::new()) };
}

/// Generates a time-ordered identifier.
///
/// This function employs a thread-local generator and guarantees the per-thread monotonic order of
/// identifiers. Identifiers from different threads are ordered only as far as their timestamps
/// differ. On Unix, this function resets the generator when the process ID changes (i.e. upon
/// process forks) to prevent collisions across processes.
///
/// # Examples
///
/// ```rust
/// let id = sortid::new_id();
/// println!("{id}"); // e.g., "018bcfe5-6800-7000-8000-9d3c01b4a7e2"
/// println!("{:?}", id.as_bytes()); // as 16-byte big-endian array
///
/// let id_string: String = sortid::new_id().to_string();
/// ```
pub fn new_id() -> TimeOrderedId {
    new_id_with(&SystemClock)
}

/// Generates a time-ordered identifier from the time `clock` reports, using the same thread-local
/// state as [`new_id`].
///
/// # Examples
///
/// ```rust
/// use sortid::clock::FixedClock;
///
/// let clock = FixedClock::from_unix_ts_ms(1_700_000_000_000);
/// let a = sortid::new_id_with(&clock);
/// let b = sortid::new_id_with(&clock);
/// assert!(a < b);
/// assert_eq!(a.timestamp(), b.timestamp());
/// ```
pub fn new_id_with<C: Clock + ?Sized>(clock: &C) -> TimeOrderedId {
    ID_GENERATOR.with(|g| {
        if unix_fork_safety::reseed_thread_rng_upon_pid_change() {
            tracing::debug!("process id changed; resetting thread-local identifier generator");
            g.replace(Default::default());
        }

        g.borrow_mut().generate_with(clock)
    })
}

/// Generates a monotonic version.
///
/// This function employs a thread-local generator: every version it returns on a thread exceeds
/// the previous one returned on that thread by at least one tick.
///
/// # Examples
///
/// ```rust
/// let v1 = sortid::new_version();
/// let v2 = sortid::new_version();
/// assert!(v1 < v2);
/// ```
pub fn new_version() -> MonotonicVersion {
    new_version_with(&SystemClock)
}

/// Generates a monotonic version from the time `clock` reports, using the same thread-local state
/// as [`new_version`].
pub fn new_version_with<C: Clock + ?Sized>(clock: &C) -> MonotonicVersion {
    VERSION_GENERATOR.with(|g| {
        let mut generator = g.get();
        let value = generator.generate_with(clock);
        g.set(generator);
        value
    })
}

#[cfg(unix)]
mod unix_fork_safety {
    use std::{cell::Cell, process};

    thread_local! {
        static PID: Cell<u32> = Cell::new(process::id());
    }

    /// Reseeds ThreadRng immediately when the process ID changes (i.e. upon process forks),
    /// returning true if ThreadRng is reseeded or false otherwise.
    pub fn reseed_thread_rng_upon_pid_change() -> bool {
        PID.with(|last_pid| {
            let pid = process::id();
            if pid == last_pid.replace(pid) {
                false
            } else {
                // ThreadRng (rand v0.8) only reseeds after a fork once the buffered block of
                // output is used up, so drain two blocks to force fresh entropy.
                let _: [[u32; 32]; 2] = rand::random();
                true
            }
        })
    }
}

#[cfg(not(unix))]
mod unix_fork_safety {
    pub const fn reseed_thread_rng_upon_pid_change() -> bool {
        false
    }
}


#[cfg(test)]
mod tests_version {
    use super::{new_version, new_version_with};
    use crate::clock::FixedClock;
    use chrono::Duration;

    /// Generates strictly increasing versions on one thread
    #[test]
    fn generates_strictly_increasing_versions_on_one_thread() {
        let samples: Vec<_> = (0..100_000).map(|_| new_version()).collect();
        for pair in samples.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    /// Increments by one tick from an injected fixed clock
    #[test]
    fn increments_by_one_tick_from_an_injected_fixed_clock() {
        let clock = FixedClock::from_unix_ts_ms(1_700_000_000_000);
        let v1 = new_version_with(&clock);
        let v2 = new_version_with(&clock);
        let v3 = new_version_with(&clock);
        assert!(v1.ticks() >= 638_355_968_000_000_000);
        assert_eq!(v2.ticks(), v1.ticks() + 1);
        assert_eq!(v3.ticks(), v2.ticks() + 1);
    }

    /// Ignores a backward jump of the injected clock
    #[test]
    fn ignores_a_backward_jump_of_the_injected_clock() {
        let clock = FixedClock::from_unix_ts_ms(1_700_000_000_000);
        let v1 = new_version_with(&clock);
        clock.rewind(Duration::microseconds(1));
        let v2 = new_version_with(&clock);
        assert_eq!(v2.ticks(), v1.ticks() + 1);
    }
}
