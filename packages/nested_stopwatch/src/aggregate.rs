//! Accumulation of repeated passes through the same piece of code.

use std::fmt;
use std::time::{Duration, Instant};

use crate::Measurement;
use crate::error::{Error, Result};

/// Accumulates the time spent in many passes through the same operation.
///
/// Where a [`MeasurementTree`](crate::MeasurementTree) records every interval as its
/// own node, an aggregate measurement only keeps a pass count and a running total,
/// which makes it suitable for timing the body of a hot loop. The individual passes
/// are retained for inspection.
///
/// At most one pass can be running at any time.
///
/// # Examples
///
/// ```
/// use nested_stopwatch::Session;
///
/// let mut session = Session::new();
///
/// for _ in 0..3 {
///     session.start_aggregate("loop_body");
///     // Work being timed happens here.
///     session.pause_aggregate("loop_body");
/// }
///
/// let aggregate = session.aggregate("loop_body").unwrap();
/// assert_eq!(aggregate.count(), 3);
/// println!("{aggregate}");
/// ```
#[derive(Clone, Debug)]
pub struct AggregateMeasurement {
    name: String,
    passes: Vec<Measurement>,
    total: Duration,
    count: u64,
}

impl AggregateMeasurement {
    /// Creates an aggregate with no passes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passes: Vec::new(),
            total: Duration::ZERO,
            count: 0,
        }
    }

    /// Starts a new pass at `now`.
    ///
    /// # Errors
    ///
    /// [`Error::DoubleStart`] if the previous pass has not been paused yet.
    pub fn start(&mut self, now: Instant) -> Result<&Self> {
        if self.is_running() {
            return Err(Error::DoubleStart {
                name: self.name.clone(),
            });
        }

        // Passes are named after their position, which equals the number of completed passes.
        self.passes
            .push(Measurement::new(self.count.to_string(), now));

        Ok(self)
    }

    /// Ends the running pass at `now` and adds its duration to the total.
    ///
    /// # Errors
    ///
    /// [`Error::NotStarted`] if no pass was ever started.
    ///
    /// [`Error::AlreadyStopped`] if the latest pass has already been paused.
    pub fn pause(&mut self, now: Instant) -> Result<&Self> {
        let Some(pass) = self.passes.last_mut() else {
            return Err(Error::NotStarted {
                name: self.name.clone(),
            });
        };

        if pass.is_stopped() {
            return Err(Error::AlreadyStopped {
                name: self.name.clone(),
            });
        }

        pass.finish(now)?;
        let elapsed = pass.elapsed().expect("pass was stopped above");

        self.total = self
            .total
            .checked_add(elapsed)
            .expect("aggregate total overflows Duration - this indicates an unrealistic scenario");

        self.count = self
            .count
            .checked_add(1)
            .expect("aggregate pass count overflows u64 - this indicates an unrealistic scenario");

        Ok(self)
    }

    /// The name of the aggregate.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every pass recorded so far, including a running one.
    #[must_use]
    pub fn passes(&self) -> &[Measurement] {
        &self.passes
    }

    /// Total time of all completed passes.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Number of completed passes.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean time per completed pass.
    ///
    /// Returns zero duration if no pass has completed.
    #[must_use]
    pub fn mean(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(
                self.total
                    .as_nanos()
                    .checked_div(u128::from(self.count))
                    .expect("guarded by if condition")
                    .try_into()
                    .expect("all realistic values fit in u64"),
            )
        }
    }

    /// Whether a pass has been started and not yet paused.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.passes.last().is_some_and(|pass| !pass.is_stopped())
    }
}

impl fmt::Display for AggregateMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:?} in {} passes ({:?} mean)",
            self.name,
            self.total,
            self.count,
            self.mean()
        )
    }
}
