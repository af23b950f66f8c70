//! Process-wide identifier generator.

#![cfg(feature = "global_gen")]
#![cfg_attr(docsrs, doc(cfg(feature = "global_gen")))]

use std::sync;

use crate::clock::{Clock, SystemClock};
use crate::TimeOrderedId;
use inner::GlobalGenInner;

/// Returns the lock handle of process-wide global generator, creating one if none exists.
fn lock_global_gen() -> sync::MutexGuard<'static, GlobalGenInner> {
    static G: sync::OnceLock<sync::Mutex<GlobalGenInner>> = sync::OnceLock::new();
    G.get_or_init(Default::default)
        .lock()
        .unwrap_or_else(|poisoned| {
            // the guarded state is replaced only by whole-value assignments
            tracing::warn!("global identifier generator lock was poisoned; recovering");
            poisoned.into_inner()
        })
}

/// Generates a time-ordered identifier from a single generator shared by all threads.
///
/// Unlike [`new_id`](crate::new_id), this function serializes every caller in the process through
/// one lock and thus guarantees the process-wide monotonic order of identifiers, at the cost of
/// contention. On Unix, this function resets the generator when the process ID changes (i.e. upon
/// process forks) to prevent collisions across processes.
///
/// # Examples
///
/// ```rust
/// let a = sortid::new_id_global();
/// let b = std::thread::spawn(sortid::new_id_global).join().unwrap();
/// assert!(a < b);
/// ```
pub fn new_id_global() -> TimeOrderedId {
    new_id_global_with(&SystemClock)
}

/// Generates a time-ordered identifier from the time `clock` reports, using the same shared state
/// as [`new_id_global`].
pub fn new_id_global_with<C: Clock + ?Sized>(clock: &C) -> TimeOrderedId {
    lock_global_gen().get_mut().generate_with(clock)
}

mod inner {
    use rand::rngs::{adapter::ReseedingRng, OsRng};
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Core;

    use crate::IdGenerator;

    /// The random number generator of the global generator.
    ///
    /// [`ChaCha12Core`] wrapped in [`ReseedingRng`] follows the strategy of
    /// [`rand::rngs::ThreadRng`].
    pub type GlobalGenRng = ReseedingRng<ChaCha12Core, OsRng>;

    /// A thin wrapper to reset the state when the process ID changes (i.e. upon Unix forks).
    #[derive(Debug)]
    pub struct GlobalGenInner {
        #[cfg(unix)]
        pid: u32,
        generator: IdGenerator<GlobalGenRng>,
    }

    impl Default for GlobalGenInner {
        fn default() -> Self {
            Self {
                #[cfg(unix)]
                pid: std::process::id(),
                generator: IdGenerator::new(ReseedingRng::new(
                    ChaCha12Core::from_entropy(),
                    1024 * 64,
                    OsRng,
                )),
            }
        }
    }

    impl GlobalGenInner {
        /// Returns a mutable reference to the inner [`IdGenerator`] instance, resetting the
        /// generator state on Unix if the process ID has changed.
        pub fn get_mut(&mut self) -> &mut IdGenerator<GlobalGenRng> {
            #[cfg(unix)]
            if self.pid != std::process::id() {
                tracing::debug!("process id changed; resetting global identifier generator");
                *self = Default::default();
            }
            &mut self.generator
        }
    }
}
