use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::Result;
use crate::pal::{Platform, PlatformFacade};
use crate::session_builder::ErrorHandler;
use crate::{
    AggregateMeasurement, Error, Measurement, MeasurementId, MeasurementTree, Report,
    SessionBuilder,
};

/// Addresses one measurement inside a [`Session`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct MeasurementHandle {
    tree: usize,
    id: MeasurementId,
}

impl MeasurementHandle {
    /// Index of the measurement tree in [`Session::trees()`].
    #[must_use]
    pub fn tree_index(&self) -> usize {
        self.tree
    }

    /// Identifier of the measurement within its tree.
    #[must_use]
    pub fn id(&self) -> MeasurementId {
        self.id
    }
}

/// Owns all measurements taken during one run, such as one request or one script.
///
/// The session keeps the root measurement trees in the order they were started and
/// an index of aggregate measurements by name. Callers refer to measurements by
/// name: a stop always applies to whatever measurement is currently innermost, so
/// instrumented code does not need to carry handles around.
///
/// # Errors are swallowed
///
/// Calling the session in the wrong order (stopping the wrong level, pausing an
/// aggregate twice, ...) never panics and never returns an error. The call is
/// abandoned, a `tracing` debug event is emitted, the optional error handler
/// configured via [`SessionBuilder::on_error()`] is invoked and `None` is returned.
/// Instrumentation must never be the reason the instrumented code fails.
///
/// # Examples
///
/// ```
/// use nested_stopwatch::Session;
///
/// let mut session = Session::new();
///
/// session.start("request");
/// session.start("database");
/// session.mark("connected");
/// session.stop("database");
/// let request = session.stop("request").unwrap();
///
/// println!("request took {:?}", request.elapsed().unwrap());
/// println!("{session}");
/// ```
pub struct Session {
    trees: Vec<MeasurementTree>,
    aggregates: HashMap<String, AggregateMeasurement>,
    enabled: bool,
    round_digits: usize,
    on_error: Option<ErrorHandler>,
    platform: PlatformFacade,
    // Unset until the session is first enabled, so a disabled session never reads the clock.
    created: Option<Instant>,
}

impl Session {
    /// Creates a new session that records measurements with default settings.
    ///
    /// Use [`Session::builder()`] to customize the session.
    #[expect(
        clippy::new_without_default,
        reason = "to avoid ambiguity with the notion of a 'default session' that is not actually a default session"
    )]
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Starts configuring a new session.
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub(crate) fn new_inner(
        enabled: bool,
        round_digits: usize,
        on_error: Option<ErrorHandler>,
        platform: PlatformFacade,
    ) -> Self {
        let created = enabled.then(|| platform.now());

        Self {
            trees: Vec::new(),
            aggregates: HashMap::new(),
            enabled,
            round_digits,
            on_error,
            platform,
            created,
        }
    }

    /// Starts a named measurement.
    ///
    /// The measurement is nested under the innermost running measurement. If nothing
    /// is running, it becomes the root of a new measurement tree.
    ///
    /// Returns `None` only if the session is disabled.
    pub fn start(&mut self, name: impl Into<String>) -> Option<MeasurementHandle> {
        if !self.enabled {
            return None;
        }

        let name = name.into();
        let now = self.platform.now();

        trace!(%name, "starting measurement");

        // Only the newest root can still be running.
        let handle = match self.trees.len().checked_sub(1) {
            Some(tree) if self.trees.get(tree).is_some_and(MeasurementTree::is_running) => {
                let id = self.tree_mut(tree).start(MeasurementId::ROOT, name, now);
                MeasurementHandle { tree, id }
            }
            _ => {
                let tree = self.trees.len();
                self.trees.push(MeasurementTree::new(name, now));
                MeasurementHandle {
                    tree,
                    id: MeasurementId::ROOT,
                }
            }
        };

        Some(handle)
    }

    /// Stops the innermost running measurement, which must be named `name`.
    ///
    /// Returns the stopped measurement, or `None` if the session is disabled or the
    /// stop was rejected:
    ///
    /// * [`Error::NotActive`] if the innermost running measurement has another name.
    /// * [`Error::NotStarted`] if nothing is running and no measurement called `name`
    ///   was ever started.
    /// * [`Error::NoActiveMeasurement`] if nothing is running.
    pub fn stop(&mut self, name: &str) -> Option<&Measurement> {
        if !self.enabled {
            return None;
        }

        let now = self.platform.now();

        match self.try_stop(name, now) {
            Ok(handle) => self.measurement(handle),
            Err(error) => {
                self.swallow(&error);
                None
            }
        }
    }

    fn try_stop(&mut self, name: &str, now: Instant) -> Result<MeasurementHandle> {
        let Some(handle) = self.find_active() else {
            return Err(if self.trees.iter().any(|tree| tree.contains_name(name)) {
                Error::NoActiveMeasurement {
                    name: name.to_owned(),
                }
            } else {
                Error::NotStarted {
                    name: name.to_owned(),
                }
            });
        };

        let tree = self.tree_mut(handle.tree);
        let active = tree.node(handle.id).name();

        if active != name {
            return Err(Error::NotActive {
                requested: name.to_owned(),
                active: active.to_owned(),
            });
        }

        let stopped = tree.stop(handle.id, now)?;

        trace!(
            name,
            elapsed_ms = stopped.elapsed().map(|elapsed| elapsed.as_secs_f64() * 1000.0),
            "stopped measurement"
        );

        Ok(handle)
    }

    /// Records a zero-duration checkpoint under the innermost running measurement.
    ///
    /// Returns `None` if the session is disabled or if nothing is running
    /// ([`Error::NoActiveMeasurement`]).
    pub fn mark(&mut self, name: impl Into<String>) -> Option<MeasurementHandle> {
        if !self.enabled {
            return None;
        }

        let name = name.into();
        let now = self.platform.now();

        match self.try_mark(name, now) {
            Ok(handle) => Some(handle),
            Err(error) => {
                self.swallow(&error);
                None
            }
        }
    }

    fn try_mark(&mut self, name: String, now: Instant) -> Result<MeasurementHandle> {
        let Some(active) = self.find_active() else {
            return Err(Error::NoActiveMeasurement { name });
        };

        let tree = self.tree_mut(active.tree);
        let id = tree.mark(active.id, name, now)?;

        trace!(
            name = tree.node(id).name(),
            parent = tree.node(active.id).name(),
            "recorded mark"
        );

        Ok(MeasurementHandle {
            tree: active.tree,
            id,
        })
    }

    /// Starts a new pass of the aggregate measurement `name`, creating the aggregate
    /// on first use.
    ///
    /// Returns `None` if the session is disabled or if the previous pass is still
    /// running ([`Error::DoubleStart`]).
    pub fn start_aggregate(&mut self, name: &str) -> Option<&AggregateMeasurement> {
        if !self.enabled {
            return None;
        }

        let now = self.platform.now();

        let started = self
            .aggregates
            .entry(name.to_owned())
            .or_insert_with(|| AggregateMeasurement::new(name))
            .start(now)
            .map(AggregateMeasurement::count);

        match started {
            Ok(completed) => {
                trace!(name, pass = completed, "started aggregate pass");
                self.aggregates.get(name)
            }
            Err(error) => {
                self.swallow(&error);
                None
            }
        }
    }

    /// Ends the running pass of the aggregate measurement `name`.
    ///
    /// Returns `None` if the session is disabled or the pause was rejected:
    ///
    /// * [`Error::NotStarted`] if the aggregate was never started.
    /// * [`Error::AlreadyStopped`] if the latest pass was already paused.
    pub fn pause_aggregate(&mut self, name: &str) -> Option<&AggregateMeasurement> {
        if !self.enabled {
            return None;
        }

        let now = self.platform.now();

        let paused = match self.aggregates.get_mut(name) {
            Some(aggregate) => aggregate
                .pause(now)
                .map(|aggregate| (aggregate.count(), aggregate.total())),
            None => Err(Error::NotStarted {
                name: name.to_owned(),
            }),
        };

        match paused {
            Ok((count, total)) => {
                trace!(name, count, total_ms = total.as_secs_f64() * 1000.0, "paused aggregate");
                self.aggregates.get(name)
            }
            Err(error) => {
                self.swallow(&error);
                None
            }
        }
    }

    /// Renders the measurement at `handle` and everything below it as an indented
    /// tree with millisecond values rounded to `round_digits` decimals.
    ///
    /// Returns `None` if the session is disabled or the handle does not belong to
    /// this session.
    #[must_use]
    pub fn report(&self, handle: MeasurementHandle, round_digits: usize) -> Option<String> {
        if !self.enabled {
            return None;
        }

        self.measurement(handle)?;

        self.trees
            .get(handle.tree)
            .map(|tree| tree.report(handle.id, round_digits))
    }

    /// Enables or disables the session.
    ///
    /// While disabled, all recording calls return `None` without reading the clock or
    /// touching any recorded data. Measurements that are running when the session
    /// is disabled keep running and can be stopped after re-enabling.
    pub fn set_enabled(&mut self, enabled: bool) {
        debug!(enabled, "stopwatch session enabled state changed");
        self.enabled = enabled;

        if enabled && self.created.is_none() {
            self.created = Some(self.platform.now());
        }
    }

    /// Whether the session is recording.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of decimals the session uses for its own [`Report`].
    #[must_use]
    pub fn round_digits(&self) -> usize {
        self.round_digits
    }

    /// Looks up a measurement by handle.
    #[must_use]
    pub fn measurement(&self, handle: MeasurementHandle) -> Option<&Measurement> {
        self.trees.get(handle.tree)?.get(handle.id)
    }

    /// The measurement tree that contains the measurement at `handle`.
    #[must_use]
    pub fn tree(&self, handle: MeasurementHandle) -> Option<&MeasurementTree> {
        self.trees.get(handle.tree)
    }

    /// All measurement trees, in the order their roots were started.
    #[must_use]
    pub fn trees(&self) -> &[MeasurementTree] {
        &self.trees
    }

    /// Looks up an aggregate measurement by name.
    #[must_use]
    pub fn aggregate(&self, name: &str) -> Option<&AggregateMeasurement> {
        self.aggregates.get(name)
    }

    /// All aggregate measurements, in no particular order.
    pub fn aggregates(&self) -> impl Iterator<Item = &AggregateMeasurement> {
        self.aggregates.values()
    }

    /// Time elapsed since the session was created, or since it was first enabled if
    /// it was built disabled. Zero if the session has never been enabled.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.created.map_or(Duration::ZERO, |created| {
            self.platform.now().saturating_duration_since(created)
        })
    }

    /// Creates a snapshot of everything measured so far.
    #[must_use]
    pub fn to_report(&self) -> Report {
        Report::new(&self.trees, &self.aggregates, self.round_digits)
    }

    /// Prints all measurements to stdout.
    ///
    /// This is a convenience method equivalent to `self.to_report().print_to_stdout()`.
    /// Prints nothing if nothing was measured.
    #[cfg_attr(test, mutants::skip)] // Too difficult to test stdout output reliably - manually tested.
    pub fn print_to_stdout(&self) {
        self.to_report().print_to_stdout();
    }

    /// Whether there is any recorded activity in this session.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty() && self.aggregates.values().all(|a| a.count() == 0)
    }

    /// The innermost running measurement of the first tree that has one.
    fn find_active(&self) -> Option<MeasurementHandle> {
        self.trees.iter().enumerate().find_map(|(tree, tree_ref)| {
            tree_ref
                .active(tree_ref.root())
                .map(|id| MeasurementHandle { tree, id })
        })
    }

    fn tree_mut(&mut self, index: usize) -> &mut MeasurementTree {
        self.trees
            .get_mut(index)
            .expect("tree index was obtained from this session")
    }

    fn swallow(&self, error: &Error) {
        debug!(%error, "ignoring stopwatch error");

        if let Some(handler) = &self.on_error {
            handler(error);
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("trees", &self.trees)
            .field("aggregates", &self.aggregates)
            .field("enabled", &self.enabled)
            .field("round_digits", &self.round_digits)
            .field("on_error", &self.on_error.as_ref().map(|_| "Fn(&Error)"))
            .field("platform", &self.platform)
            .field("created", &self.created)
            .finish()
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Delegate to Report's Display implementation for consistency
        write!(f, "{}", self.to_report())
    }
}
