//! Monotonic 64-bit version counters for optimistic concurrency.
//!
//! A [`MonotonicVersion`] counts 100-nanosecond ticks since 0001-01-01T00:00:00Z, the same scale
//! many databases and runtimes use for tick-based timestamps. New versions come from
//! [`new_version`](crate::new_version) or a [`VersionGenerator`](crate::VersionGenerator); stored
//! versions are restored with [`MonotonicVersion::from_raw`].
//!
//! # Comparing versions
//!
//! Versions are optimistic-concurrency tokens. A writer reads an entity together with its
//! version, and commits only if the stored version is still *exactly equal* to the one it read:
//!
//! ```rust
//! use sortid::MonotonicVersion;
//!
//! let stored = MonotonicVersion::from_raw(638_362_368_000_000_000);
//! let expected = MonotonicVersion::from_raw(638_362_368_000_000_000);
//! assert!(stored == expected, "someone else wrote first");
//! ```
//!
//! Do not pick a "latest" version with `<` or `>` across writers. A version minted on a machine
//! whose clock runs far ahead would win every such comparison until real time caught up.
//! [`MonotonicVersion::check_not_in_future`] rejects such versions where they enter a system.

use chrono::{DateTime, Utc};
use std::{fmt, str};

use crate::ParseError;

/// Ticks from 0001-01-01T00:00:00Z to the Unix epoch.
pub const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;

/// Number of 100-nanosecond ticks per second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Default tolerance of [`MonotonicVersion::check_not_in_future`]: five minutes.
pub const DEFAULT_FUTURE_TOLERANCE: chrono::Duration = chrono::Duration::seconds(300);

/// Represents a 64-bit monotonic version counted in 100-nanosecond ticks.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct MonotonicVersion(i64);

impl MonotonicVersion {
    /// The smallest version.
    pub const MIN: Self = Self(i64::MIN);

    /// The largest version.
    pub const MAX: Self = Self(i64::MAX);

    /// Restores a version from a stored tick value.
    ///
    /// This performs no monotonicity check and must not be used to mint new versions.
    pub const fn from_raw(ticks: i64) -> Self {
        Self(ticks)
    }

    /// Returns the tick value.
    pub const fn ticks(&self) -> i64 {
        self.0
    }

    /// Returns the big-endian 8-byte representation.
    pub const fn to_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Restores a version from its big-endian 8-byte representation.
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(i64::from_be_bytes(bytes))
    }

    /// Creates a version from a UTC instant, saturating at the bounds of the tick range.
    ///
    /// Like [`from_raw`](Self::from_raw), this is a conversion and does not mint a new version.
    pub fn from_datetime(instant: &DateTime<Utc>) -> Self {
        Self(datetime_to_ticks(instant))
    }

    /// Returns the UTC instant the tick value denotes.
    pub fn to_datetime(&self) -> DateTime<Utc> {
        ticks_to_datetime(self.0)
    }

    /// Returns `Ok(self)` unless the version lies more than `tolerance` after `now`.
    ///
    /// Use this where versions enter a system from outside (deserialized messages, imports) to
    /// keep a runaway clock from planting a version that dominates later writes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chrono::{Duration, Utc};
    /// use sortid::{MonotonicVersion, DEFAULT_FUTURE_TOLERANCE};
    ///
    /// let now = Utc::now();
    /// let fine = MonotonicVersion::from_datetime(&now);
    /// assert!(fine.check_not_in_future(&now, DEFAULT_FUTURE_TOLERANCE).is_ok());
    ///
    /// let runaway = MonotonicVersion::from_datetime(&(now + Duration::days(365)));
    /// assert!(runaway.check_not_in_future(&now, DEFAULT_FUTURE_TOLERANCE).is_err());
    /// ```
    pub fn check_not_in_future(
        self,
        now: &DateTime<Utc>,
        tolerance: chrono::Duration,
    ) -> Result<Self, FutureVersionError> {
        let limit = now
            .checked_add_signed(tolerance)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let limit_ticks = datetime_to_ticks(&limit);
        if self.0 > limit_ticks {
            Err(FutureVersionError {
                version: self,
                limit: Self(limit_ticks),
            })
        } else {
            Ok(self)
        }
    }
}

/// Converts a UTC instant into ticks since 0001-01-01T00:00:00Z, saturating into `i64`.
pub(crate) fn datetime_to_ticks(instant: &DateTime<Utc>) -> i64 {
    let ticks = i128::from(instant.timestamp()) * i128::from(TICKS_PER_SECOND)
        + i128::from(instant.timestamp_subsec_nanos() / 100)
        + i128::from(UNIX_EPOCH_TICKS);
    ticks.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

/// Converts ticks since 0001-01-01T00:00:00Z into a UTC instant.
fn ticks_to_datetime(ticks: i64) -> DateTime<Utc> {
    let since_unix = i128::from(ticks) - i128::from(UNIX_EPOCH_TICKS);
    let secs = since_unix.div_euclid(i128::from(TICKS_PER_SECOND)) as i64;
    let nanos = (since_unix.rem_euclid(i128::from(TICKS_PER_SECOND)) * 100) as u32;
    // the whole i64 tick range (about +-29,000 years) lies within chrono's range
    DateTime::from_timestamp(secs, nanos).unwrap_or(if secs < 0 {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

impl fmt::Display for MonotonicVersion {
    /// Writes the tick value as a signed decimal integer.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl str::FromStr for MonotonicVersion {
    type Err = ParseError;

    /// Parses a signed decimal tick value.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        src.parse::<i64>().map(Self).map_err(|_| ParseError {})
    }
}

impl From<MonotonicVersion> for i64 {
    fn from(src: MonotonicVersion) -> Self {
        src.0
    }
}

impl From<i64> for MonotonicVersion {
    fn from(src: i64) -> Self {
        Self(src)
    }
}

impl From<MonotonicVersion> for [u8; 8] {
    fn from(src: MonotonicVersion) -> Self {
        src.to_bytes()
    }
}

impl From<[u8; 8]> for MonotonicVersion {
    fn from(src: [u8; 8]) -> Self {
        Self::from_bytes(src)
    }
}

impl From<MonotonicVersion> for DateTime<Utc> {
    fn from(src: MonotonicVersion) -> Self {
        src.to_datetime()
    }
}

/// Error returned by [`MonotonicVersion::check_not_in_future`].
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct FutureVersionError {
    version: MonotonicVersion,
    limit: MonotonicVersion,
}

impl FutureVersionError {
    /// Returns the rejected version.
    pub const fn version(&self) -> MonotonicVersion {
        self.version
    }

    /// Returns the latest version that would have been accepted.
    pub const fn limit(&self) -> MonotonicVersion {
        self.limit
    }
}

impl fmt::Display for FutureVersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "version {} is ahead of the latest acceptable version {}",
            self.version, self.limit
        )
    }
}

impl std::error::Error for FutureVersionError {}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde_support {
    use super::MonotonicVersion;
    use serde::{Deserializer, Serializer};

    impl serde::Serialize for MonotonicVersion {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_i64(self.0)
        }
    }

    impl<'de> serde::Deserialize<'de> for MonotonicVersion {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            <i64 as serde::Deserialize>::deserialize(deserializer).map(Self)
        }
    }

}

#[cfg(test)]
mod tests {
    use super::{MonotonicVersion, DEFAULT_FUTURE_TOLERANCE, UNIX_EPOCH_TICKS};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    /// Maps the Unix epoch and a known instant to tick values
    #[test]
    fn maps_the_unix_epoch_and_a_known_instant_to_tick_values() {
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        assert_eq!(MonotonicVersion::from_datetime(&epoch).ticks(), UNIX_EPOCH_TICKS);

        let year_one = Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(MonotonicVersion::from_datetime(&year_one).ticks(), 0);

        let instant = Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap();
        let v = MonotonicVersion::from_datetime(&instant);
        assert_eq!(v.ticks(), 638_355_968_000_000_000);
        assert_eq!(v.to_datetime(), instant);
    }

    /// Converts ticks to instants and back without loss
    #[test]
    fn converts_ticks_to_instants_and_back_without_loss() {
        for ticks in [
            0,
            1,
            -1,
            UNIX_EPOCH_TICKS - 1,
            638_355_968_000_000_007,
            i64::MIN,
            i64::MAX,
        ] {
            let v = MonotonicVersion::from_raw(ticks);
            assert_eq!(MonotonicVersion::from_datetime(&v.to_datetime()), v);
            assert_eq!(MonotonicVersion::from(i64::from(v)), v);
            assert_eq!(MonotonicVersion::from(<[u8; 8]>::from(v)), v);
            assert_eq!(v.to_string().parse(), Ok(v));
        }
    }

    /// Saturates instants beyond the tick range
    #[test]
    fn saturates_instants_beyond_the_tick_range() {
        assert_eq!(
            MonotonicVersion::from_datetime(&DateTime::<Utc>::MAX_UTC),
            MonotonicVersion::MAX
        );
        assert_eq!(
            MonotonicVersion::from_datetime(&DateTime::<Utc>::MIN_UTC),
            MonotonicVersion::MIN
        );
    }

    /// Encodes bytes in big-endian order
    #[test]
    fn encodes_bytes_in_big_endian_order() {
        let v = MonotonicVersion::from_raw(0x0102_0304_0506_0708);
        assert_eq!(v.to_bytes(), [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    /// Returns error to invalid decimal representation
    #[test]
    fn returns_error_to_invalid_decimal_representation() {
        for e in ["", " 1", "1 ", "0x10", "1.5", "9223372036854775808", "--1"] {
            assert!(e.parse::<MonotonicVersion>().is_err());
        }
    }

    /// Rejects versions far ahead of the current instant
    #[test]
    fn rejects_versions_far_ahead_of_the_current_instant() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let at_limit = MonotonicVersion::from_datetime(&(now + DEFAULT_FUTURE_TOLERANCE));
        assert_eq!(at_limit.check_not_in_future(&now, DEFAULT_FUTURE_TOLERANCE), Ok(at_limit));

        let past = MonotonicVersion::from_datetime(&(now - Duration::days(30)));
        assert!(past.check_not_in_future(&now, DEFAULT_FUTURE_TOLERANCE).is_ok());

        let beyond = MonotonicVersion::from_raw(at_limit.ticks() + 1);
        let err = beyond
            .check_not_in_future(&now, DEFAULT_FUTURE_TOLERANCE)
            .unwrap_err();
        assert_eq!(err.version(), beyond);
        assert_eq!(err.limit(), at_limit);
    }
}
