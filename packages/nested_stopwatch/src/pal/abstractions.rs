//! Platform abstraction trait definitions.

use std::fmt::Debug;
use std::time::Instant;

/// Provides the timestamps that all measurements are built from.
///
/// The timestamps must be monotonic within one session, otherwise elapsed
/// times could come out negative.
pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// Gets the current timestamp.
    fn now(&self) -> Instant;
}
