use thiserror::Error;

/// Ways in which a caller can get the order of stopwatch calls wrong.
///
/// None of these indicate corrupted state: the operation that failed is
/// abandoned and everything recorded before it stays valid.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A measurement or aggregate pass was stopped a second time.
    #[error("measurement '{name}' has already been stopped")]
    AlreadyStopped {
        /// Name of the measurement or aggregate that was already stopped.
        name: String,
    },

    /// An aggregate pass was started while the previous pass was still running.
    #[error("aggregate measurement '{name}' was started again before being paused")]
    DoubleStart {
        /// Name of the aggregate.
        name: String,
    },

    /// Something was stopped or paused that was never started.
    #[error("measurement '{name}' was never started")]
    NotStarted {
        /// The name the caller asked for.
        name: String,
    },

    /// A stop was requested for a measurement that is not the innermost running one.
    #[error("unable to stop measurement '{requested}' as the active measurement is '{active}'")]
    NotActive {
        /// The name the caller asked to stop.
        requested: String,

        /// The name of the measurement that is actually running.
        active: String,
    },

    /// A stop or mark was requested while no measurement is running anywhere.
    #[error("unable to process '{name}' as there is no active measurement")]
    NoActiveMeasurement {
        /// The name the caller passed in.
        name: String,
    },

    /// A mark was requested under a measurement whose child is still running.
    #[error("unable to mark '{parent}' as its sub-measurement '{child}' is still running")]
    SubMeasurementNotStopped {
        /// The measurement that was asked to hold the mark.
        parent: String,

        /// The running child that is in the way.
        child: String,
    },
}

/// A specialized `Result` type for stopwatch operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn not_active_names_both_measurements() {
        let error = Error::NotActive {
            requested: "outer".to_string(),
            active: "inner".to_string(),
        };

        let message = error.to_string();
        assert!(message.contains("'outer'"));
        assert!(message.contains("'inner'"));
    }

    #[test]
    fn sub_measurement_not_stopped_names_both_measurements() {
        let error = Error::SubMeasurementNotStopped {
            parent: "request".to_string(),
            child: "database".to_string(),
        };

        let message = error.to_string();
        assert!(message.contains("'request'"));
        assert!(message.contains("'database'"));
    }
}
