//! Configuration of a stopwatch session.

use std::fmt;

use tracing::debug;

use crate::pal::PlatformFacade;
use crate::report::MAX_ROUND_DIGITS;
use crate::{Error, Session};

/// Receives every error that a [`Session`] swallows.
pub(crate) type ErrorHandler = Box<dyn Fn(&Error) + Send + Sync>;

/// Creates instances of [`Session`].
///
/// All properties are optional. Use `Session::builder()` to create a new instance
/// of this builder.
///
/// # Examples
///
/// ```
/// use nested_stopwatch::Session;
///
/// let mut session = Session::builder()
///     .round_digits(2)
///     .on_error(|error| eprintln!("stopwatch misuse: {error}"))
///     .build();
///
/// // Stopping something that was never started is reported to the handler.
/// assert!(session.stop("never_started").is_none());
/// ```
pub struct SessionBuilder {
    /// Whether the session starts out recording. Defaults to `true`.
    enabled: bool,

    /// Decimals used when the session renders its own report. Defaults to 0.
    round_digits: usize,

    /// Defaults to none, which silently drops errors.
    on_error: Option<ErrorHandler>,

    platform: PlatformFacade,
}

impl SessionBuilder {
    pub(crate) fn new() -> Self {
        Self {
            enabled: true,
            round_digits: 0,
            on_error: None,
            platform: PlatformFacade::real(),
        }
    }

    /// Sets whether the session records anything.
    ///
    /// A disabled session does not read the clock and does not allocate; every call
    /// returns `None`. It can be enabled later with
    /// [`Session::set_enabled()`](crate::Session::set_enabled).
    #[must_use]
    pub fn enabled(self, enabled: bool) -> Self {
        Self { enabled, ..self }
    }

    /// Sets the number of decimals of the millisecond values in the session's
    /// own [`Report`](crate::Report).
    ///
    /// Values above 17 are clamped to 17, the most an `f64` can meaningfully show.
    #[must_use]
    pub fn round_digits(self, round_digits: usize) -> Self {
        Self {
            round_digits: round_digits.min(MAX_ROUND_DIGITS),
            ..self
        }
    }

    /// Installs a handler that is called with every error the session swallows.
    ///
    /// Without a handler, errors are only visible as `tracing` debug events and as
    /// `None` return values. The handler decides whether a misuse is worth
    /// logging, counting or even panicking over.
    #[must_use]
    pub fn on_error<F>(self, handler: F) -> Self
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        Self {
            on_error: Some(Box::new(handler)),
            ..self
        }
    }

    /// Replaces the clock, allowing tests to control time.
    #[cfg(test)]
    #[must_use]
    pub(crate) fn platform(self, platform: PlatformFacade) -> Self {
        Self { platform, ..self }
    }

    /// Creates the session.
    #[must_use]
    pub fn build(self) -> Session {
        debug!(
            enabled = self.enabled,
            round_digits = self.round_digits,
            has_error_handler = self.on_error.is_some(),
            "creating stopwatch session"
        );

        Session::new_inner(self.enabled, self.round_digits, self.on_error, self.platform)
    }
}

impl fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("enabled", &self.enabled)
            .field("round_digits", &self.round_digits)
            .field("on_error", &self.on_error.as_ref().map(|_| "Fn(&Error)"))
            .field("platform", &self.platform)
            .finish()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn defaults() {
        let session = SessionBuilder::new().build();

        assert!(session.is_enabled());
        assert_eq!(session.round_digits(), 0);
    }

    #[test]
    fn applies_settings() {
        let session = SessionBuilder::new()
            .enabled(false)
            .round_digits(3)
            .build();

        assert!(!session.is_enabled());
        assert_eq!(session.round_digits(), 3);
    }

    #[test]
    fn clamps_round_digits() {
        let mut session = SessionBuilder::new().round_digits(usize::MAX).build();
        session.start("work");
        session.stop("work");

        assert_eq!(session.round_digits(), MAX_ROUND_DIGITS);
        let text = session.to_string();
        let decimals = text.trim_end().rsplit('.').next().unwrap();
        assert_eq!(decimals.len(), MAX_ROUND_DIGITS);
    }

    #[test]
    fn installs_error_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);

        let mut session = SessionBuilder::new()
            .on_error(move |_| {
                calls_clone.fetch_add(1, Ordering::Relaxed);
            })
            .build();

        session.stop("missing");

        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn debug_output_mentions_handler() {
        let builder = SessionBuilder::new().on_error(|_| {});

        let debug = format!("{builder:?}");

        assert!(debug.contains("Fn(&Error)"), "got {debug}");
    }

    static_assertions::assert_impl_all!(SessionBuilder: Send, Sync);
}
