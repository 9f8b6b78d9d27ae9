//! Nested measurements stored in an arena-backed tree.

use std::time::{Duration, Instant};

use crate::error::{Error, Result};
use crate::report;

/// Identifies one measurement inside the [`MeasurementTree`] that created it.
///
/// Identifiers are only meaningful for the tree that issued them.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct MeasurementId(usize);

impl MeasurementId {
    pub(crate) const ROOT: Self = Self(0);
}

/// One named, timed interval.
///
/// A measurement is running from the moment it is created until it is stopped,
/// after which its end time never changes again. Stopping a measurement does not
/// stop any of its children and stopping all children does not stop the parent.
#[derive(Clone, Debug)]
pub struct Measurement {
    name: String,
    start: Instant,
    end: Option<Instant>,
    children: Vec<MeasurementId>,

    // Marks are created already stopped and never get children.
    instantaneous: bool,
}

impl Measurement {
    pub(crate) fn new(name: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.into(),
            start,
            end: None,
            children: Vec::new(),
            instantaneous: false,
        }
    }

    fn new_mark(name: impl Into<String>, at: Instant) -> Self {
        Self {
            name: name.into(),
            start: at,
            end: Some(at),
            children: Vec::new(),
            instantaneous: true,
        }
    }

    /// The name the measurement was started with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// When the measurement was started.
    #[must_use]
    pub fn start(&self) -> Instant {
        self.start
    }

    /// When the measurement was stopped, or `None` if it is still running.
    #[must_use]
    pub fn end(&self) -> Option<Instant> {
        self.end
    }

    /// Time between start and end, or `None` if the measurement is still running.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        self.end
            .map(|end| end.saturating_duration_since(self.start))
    }

    /// Whether the measurement has been stopped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.end.is_some()
    }

    /// Whether this is a zero-duration checkpoint created by a mark.
    #[must_use]
    pub fn is_mark(&self) -> bool {
        self.instantaneous
    }

    /// The children of this measurement, in the order they were started.
    #[must_use]
    pub fn children(&self) -> &[MeasurementId] {
        &self.children
    }

    /// Records the end time. Fails if an end time has already been recorded.
    pub(crate) fn finish(&mut self, now: Instant) -> Result<()> {
        if self.is_stopped() {
            return Err(Error::AlreadyStopped {
                name: self.name.clone(),
            });
        }

        self.end = Some(now);
        Ok(())
    }
}

/// A root measurement together with everything that was measured while it ran.
///
/// All nodes live in one flat arena owned by the tree and refer to their
/// children by [`MeasurementId`]. No node refers to its parent, so locating the
/// running measurement is always a top-down search from some starting node.
///
/// Within the children of any one node, only the most recently started child
/// can still be running: a new child is only ever appended under the innermost
/// running node.
///
/// All operations that take a [`MeasurementId`] panic if the identifier was not
/// issued by this tree.
#[derive(Clone, Debug)]
pub struct MeasurementTree {
    nodes: Vec<Measurement>,
}

impl MeasurementTree {
    /// Creates a tree whose root measurement starts at `now`.
    #[must_use]
    pub fn new(name: impl Into<String>, now: Instant) -> Self {
        Self {
            nodes: vec![Measurement::new(name, now)],
        }
    }

    /// The root measurement of the tree.
    #[must_use]
    pub fn root(&self) -> MeasurementId {
        MeasurementId::ROOT
    }

    /// Whether the root measurement is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.node(MeasurementId::ROOT).is_stopped()
    }

    /// Looks up a measurement, returning `None` if `id` is not part of this tree.
    #[must_use]
    pub fn get(&self, id: MeasurementId) -> Option<&Measurement> {
        self.nodes.get(id.0)
    }

    /// All measurements of the tree in the order they were created.
    pub fn iter(&self) -> impl Iterator<Item = (MeasurementId, &Measurement)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (MeasurementId(index), node))
    }

    /// Starts a new measurement below `parent`.
    ///
    /// If `parent` has a running child, the new measurement is started below that
    /// child instead, continuing down until a node without a running child is found.
    /// Starting a measurement is always possible, at any depth.
    pub fn start(
        &mut self,
        parent: MeasurementId,
        name: impl Into<String>,
        now: Instant,
    ) -> MeasurementId {
        let mut parent = parent;

        while let Some(child) = self.active_child(parent) {
            parent = child;
        }

        let id = self.push(Measurement::new(name, now));
        self.node_mut(parent).children.push(id);
        id
    }

    /// Stops the measurement, leaving its children as they are.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyStopped`] if the measurement has already been stopped. The
    /// original end time is kept.
    pub fn stop(&mut self, id: MeasurementId, now: Instant) -> Result<&Measurement> {
        let node = self.node_mut(id);
        node.finish(now)?;
        Ok(node)
    }

    /// The running child of a measurement, if there is one.
    ///
    /// Only the last child can be running, so this does not search.
    #[must_use]
    pub fn active_child(&self, id: MeasurementId) -> Option<MeasurementId> {
        let last = *self.node(id).children.last()?;

        (!self.node(last).is_stopped()).then_some(last)
    }

    /// The innermost running measurement at or below `id`.
    ///
    /// Returns `None` if `id` itself is stopped. Otherwise returns the first running
    /// descendant found in child order, or `id` itself if none of its children
    /// are running.
    #[must_use]
    pub fn active(&self, id: MeasurementId) -> Option<MeasurementId> {
        let node = self.node(id);

        if node.is_stopped() {
            return None;
        }

        node.children
            .iter()
            .find_map(|&child| self.active(child))
            .or(Some(id))
    }

    /// Adds a zero-duration checkpoint as the newest child of `id`.
    ///
    /// # Errors
    ///
    /// [`Error::SubMeasurementNotStopped`] if `id` has a running child, as the mark
    /// would otherwise be recorded out of order relative to that child.
    pub fn mark(
        &mut self,
        id: MeasurementId,
        name: impl Into<String>,
        now: Instant,
    ) -> Result<MeasurementId> {
        if let Some(child) = self.active_child(id) {
            return Err(Error::SubMeasurementNotStopped {
                parent: self.node(id).name.clone(),
                child: self.node(child).name.clone(),
            });
        }

        let mark = self.push(Measurement::new_mark(name, now));
        self.node_mut(id).children.push(mark);
        Ok(mark)
    }

    /// Renders the measurement at `id` and everything below it as an indented tree,
    /// with elapsed times in milliseconds rounded to `round_digits` decimals.
    ///
    /// See [`Report`](crate::Report) for the exact format.
    #[must_use]
    pub fn report(&self, id: MeasurementId, round_digits: usize) -> String {
        report::render_tree(self, id, round_digits)
    }

    /// Whether any measurement in the tree was started with this name.
    pub(crate) fn contains_name(&self, name: &str) -> bool {
        self.nodes.iter().any(|node| node.name == name)
    }

    pub(crate) fn node(&self, id: MeasurementId) -> &Measurement {
        self.nodes
            .get(id.0)
            .expect("measurement identifier does not belong to this tree")
    }

    fn node_mut(&mut self, id: MeasurementId) -> &mut Measurement {
        self.nodes
            .get_mut(id.0)
            .expect("measurement identifier does not belong to this tree")
    }

    fn push(&mut self, measurement: Measurement) -> MeasurementId {
        let id = MeasurementId(self.nodes.len());
        self.nodes.push(measurement);
        id
    }
}
