//! Time-ordered 128-bit identifiers and monotonic 64-bit version counters
//!
//! ```rust
//! let id = sortid::new_id();
//! println!("{}", id); // e.g. "018bcfe5-6800-7000-8000-9d3c01b4a7e2"
//! println!("{:?}", id.as_bytes()); // as 16-byte big-endian array
//!
//! let version = sortid::new_version();
//! println!("{}", version); // e.g. "638355968000000000"
//! ```
//!
//! Both kinds of values are produced without any coordinator. Each thread keeps its own generator
//! state, so values generated by one thread strictly increase no matter how the system clock
//! behaves, and no lock is taken on the default path.
//!
//! # Identifier field and bit layout
//!
//! [`TimeOrderedId`] values are standard 16-byte UUIDs with the following bit layout:
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           timestamp                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |           timestamp           |  ver  |        counter        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |var|          counter          |          random_tail          |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                          random_tail                          |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Where:
//!
//! - The 48-bit `timestamp` field is dedicated to the Unix timestamp in milliseconds.
//! - The 4-bit `ver` field is set at `0111`.
//! - The 26-bit `counter` field (12 bits before `var`, 14 bits after) numbers the identifiers a
//!   generator emits within the same millisecond. It restarts at zero whenever the `timestamp`
//!   advances.
//! - The 2-bit `var` field is set at `10`.
//! - The 48-bit `random_tail` field is filled with a cryptographically strong random number for
//!   every identifier.
//!
//! If the system clock moves backwards, the generator keeps the last `timestamp` and increments
//! the `counter`. If the `counter` reaches its maximum within one millisecond, the generator
//! yields the thread until the clock advances. Both cases keep the per-thread order intact.
//!
//! # Versions
//!
//! [`MonotonicVersion`] values count 100-nanosecond ticks since 0001-01-01T00:00:00Z. A new
//! version equals the current tick count, or the previous version from the same thread plus one
//! tick if the clock has not moved past it. Versions are meant to be compared by exact equality
//! in optimistic-concurrency checks; see the [`version`] module.
//!
//! # Ordering scope
//!
//! | Function                | Order guaranteed across   | Synchronization |
//! | ----------------------- | ------------------------- | --------------- |
//! | [`new_id`]              | calls on the same thread  | none            |
//! | [`new_id_global`]       | all calls in the process  | one mutex       |
//! | [`new_version`]         | calls on the same thread  | none            |
//!
//! Each function has a `_with` variant taking a [`clock::Clock`], which makes the generators
//! deterministic under test.
//!
//! # Crate features
//!
//! - `global_gen` (default): enables [`new_id_global`].
//! - `serde`: implements `Serialize` and `Deserialize` for both value types.
//! - `uuid`: converts [`TimeOrderedId`] to and from `uuid::Uuid`.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod clock;

mod id;
pub use id::{ParseError, TimeOrderedId, MAX_COUNTER, MAX_RANDOM_TAIL, MAX_TIMESTAMP};

pub mod version;
#[doc(inline)]
pub use version::{FutureVersionError, MonotonicVersion, DEFAULT_FUTURE_TOLERANCE};

mod generator;
pub use generator::IdGenerator;

mod version_gen;
pub use version_gen::VersionGenerator;

mod entry;
pub use entry::{new_id, new_id_with, new_version, new_version_with};

mod global_gen;
#[cfg(feature = "global_gen")]
pub use global_gen::{new_id_global, new_id_global_with};
