//! Monotonic version generator.

use crate::clock::{Clock, SystemClock};
use crate::MonotonicVersion;

/// Represents a version generator that guarantees each version it emits exceeds the previous one
/// by at least one tick.
///
/// If the clock reports a tick value greater than the last version, that value becomes the new
/// version. Otherwise (the clock did not advance or moved backwards) the new version is the last
/// one plus one tick. There is no randomness and no waiting.
///
/// # Examples
///
/// ```rust
/// use sortid::clock::FixedClock;
/// use sortid::VersionGenerator;
///
/// let clock = FixedClock::from_unix_ts_ms(1_700_000_000_000);
/// let mut g = VersionGenerator::new();
/// let v1 = g.generate_with(&clock);
/// let v2 = g.generate_with(&clock);
/// assert_eq!(v2.ticks(), v1.ticks() + 1);
/// ```
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct VersionGenerator {
    last_ticks: i64,
}

impl Default for VersionGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionGenerator {
    /// Creates a generator instance.
    pub const fn new() -> Self {
        Self {
            last_ticks: i64::MIN,
        }
    }

    /// Generates a new version from the system clock.
    pub fn generate(&mut self) -> MonotonicVersion {
        self.generate_with(&SystemClock)
    }

    /// Generates a new version from the time `clock` reports.
    pub fn generate_with<C: Clock + ?Sized>(&mut self, clock: &C) -> MonotonicVersion {
        self.generate_core(clock.ticks())
    }

    /// Generates a new version from the `ticks` passed.
    ///
    /// After [`MonotonicVersion::MAX`] has been emitted, the generator keeps returning it.
    pub fn generate_core(&mut self, ticks: i64) -> MonotonicVersion {
        if ticks > self.last_ticks {
            self.last_ticks = ticks;
        } else {
            tracing::trace!(
                observed = ticks,
                last = self.last_ticks,
                "clock not ahead of last version; incrementing"
            );
            self.last_ticks = self.last_ticks.saturating_add(1);
        }
        MonotonicVersion::from_raw(self.last_ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::VersionGenerator;
    use crate::clock::FixedClock;
    use crate::MonotonicVersion;
    use chrono::Duration;
    use std::collections::HashSet;

    const T0: i64 = 638_355_968_000_000_000;

    /// Increments by one tick while the clock stands still
    #[test]
    fn increments_by_one_tick_while_the_clock_stands_still() {
        let mut g = VersionGenerator::new();
        let v1 = g.generate_core(T0);
        let v2 = g.generate_core(T0);
        let v3 = g.generate_core(T0);
        assert_eq!(v1.ticks(), T0);
        assert_eq!(v2.ticks(), v1.ticks() + 1);
        assert_eq!(v3.ticks(), v2.ticks() + 1);
    }

    /// Increments by one tick when the clock moves backwards
    #[test]
    fn increments_by_one_tick_when_the_clock_moves_backwards() {
        let mut g = VersionGenerator::new();
        let v1 = g.generate_core(T0);
        let v2 = g.generate_core(T0 - 10);
        assert_eq!(v2.ticks(), v1.ticks() + 1);
    }

    /// Adopts a later clock reading as is
    #[test]
    fn adopts_a_later_clock_reading_as_is() {
        let mut g = VersionGenerator::new();
        g.generate_core(T0);
        g.generate_core(T0);
        assert_eq!(g.generate_core(T0 + 500).ticks(), T0 + 500);
    }

    /// Reads ticks from an injected clock
    #[test]
    fn reads_ticks_from_an_injected_clock() {
        let clock = FixedClock::from_unix_ts_ms(1_700_000_000_000);
        let mut g = VersionGenerator::new();
        assert_eq!(g.generate_with(&clock).ticks(), T0);

        clock.rewind(Duration::seconds(1));
        assert_eq!(g.generate_with(&clock).ticks(), T0 + 1);

        clock.advance(Duration::seconds(2));
        assert_eq!(g.generate_with(&clock).ticks(), T0 + 10_000_000);
    }

    /// Saturates at the largest version
    #[test]
    fn saturates_at_the_largest_version() {
        let mut g = VersionGenerator::new();
        g.generate_core(i64::MAX - 1);
        assert_eq!(g.generate_core(0), MonotonicVersion::MAX);
        assert_eq!(g.generate_core(0), MonotonicVersion::MAX);
    }

    /// Generates 10k versions without duplicates from the system clock
    #[test]
    fn generates_10k_versions_without_duplicates_from_the_system_clock() {
        let mut g = VersionGenerator::new();
        let samples: Vec<_> = (0..10_000).map(|_| g.generate()).collect();
        for pair in samples.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        let s: HashSet<_> = samples.iter().collect();
        assert_eq!(s.len(), samples.len());
    }
}
