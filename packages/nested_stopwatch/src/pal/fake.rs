//! Fake platform implementation for testing.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::pal::abstractions::Platform;

/// Internal state for the fake platform that can be shared between clones.
#[derive(Debug)]
struct FakePlatformState {
    origin: Instant,
    offset: Duration,
    reads: u64,
}

/// Fake implementation of the platform abstraction for testing.
///
/// Time stands still until a test moves it with [`advance()`](Self::advance).
/// Multiple clones of the same `FakePlatform` share the same underlying state,
/// so a test can keep one clone and hand another to the session under test.
#[derive(Clone, Debug)]
pub(crate) struct FakePlatform {
    state: Arc<Mutex<FakePlatformState>>,
}

impl FakePlatform {
    /// Creates a new fake platform whose clock is frozen at an arbitrary instant.
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakePlatformState {
                origin: Instant::now(),
                offset: Duration::ZERO,
                reads: 0,
            })),
        }
    }

    /// Moves the clock forward.
    ///
    /// This affects all clones of this platform.
    pub(crate) fn advance(&self, by: Duration) {
        let mut state = self
            .state
            .lock()
            .expect("FakePlatform state lock should not be poisoned");

        state.offset = state
            .offset
            .checked_add(by)
            .expect("fake clock offset overflows Duration");
    }

    /// How many times the clock has been read, across all clones.
    pub(crate) fn reads(&self) -> u64 {
        self.state
            .lock()
            .expect("FakePlatform state lock should not be poisoned")
            .reads
    }
}

impl Platform for FakePlatform {
    fn now(&self) -> Instant {
        let mut state = self
            .state
            .lock()
            .expect("FakePlatform state lock should not be poisoned");

        state.reads = state.reads.wrapping_add(1);

        state
            .origin
            .checked_add(state.offset)
            .expect("fake clock moved beyond what Instant can represent")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn time_is_frozen_until_advanced() {
        let platform = FakePlatform::new();

        assert_eq!(platform.now(), platform.now());
    }

    #[test]
    fn advance_moves_time_forward() {
        let platform = FakePlatform::new();
        let before = platform.now();

        platform.advance(Duration::from_millis(150));

        assert_eq!(
            platform.now().duration_since(before),
            Duration::from_millis(150)
        );
    }

    #[test]
    fn counts_reads() {
        let platform = FakePlatform::new();
        assert_eq!(platform.reads(), 0);

        _ = platform.now();
        _ = platform.now();

        assert_eq!(platform.reads(), 2);
    }

    #[test]
    fn shared_state_between_clones() {
        let platform1 = FakePlatform::new();
        let platform2 = platform1.clone();

        let start = platform2.now();
        platform1.advance(Duration::from_millis(100));

        assert_eq!(
            platform2.now().duration_since(start),
            Duration::from_millis(100)
        );
        assert_eq!(platform1.reads(), 2);
    }
}
