use std::time::Instant;

use crate::pal::Platform;

/// The real clock, backed by the monotonic [`Instant`] of the standard library.
#[derive(Debug, Default)]
pub(crate) struct RealPlatform;

pub(crate) static REAL_PLATFORM: RealPlatform = RealPlatform;

impl Platform for RealPlatform {
    #[cfg_attr(test, mutants::skip)] // Real time cannot be asserted on exactly.
    fn now(&self) -> Instant {
        Instant::now()
    }
}
