//! Text rendering of measurements and session snapshots.

use std::collections::HashMap;
use std::fmt::{self, Write};
use std::time::Duration;

use crate::{AggregateMeasurement, MeasurementId, MeasurementTree};

const MID_CHILD: &str = "├── ";
const LAST_CHILD: &str = "└── ";
const CONTINUATION: &str = "│   ";
const GAP: &str = "    ";

/// Decimals beyond this carry no information in an `f64` millisecond value.
pub(crate) const MAX_ROUND_DIGITS: usize = 17;

/// Snapshot of everything a [`Session`](crate::Session) has measured.
///
/// The report owns its data, so it can outlive the session and be sent to other
/// threads.
///
/// # Format
///
/// Each measurement tree is rendered with one line per measurement:
///
/// ```text
/// Total: 112
/// ├── Init: 9
/// └── Database: 91
///     ├── Connection: 76
///     └── Read: 15
///         └── Cache: 3
/// ```
///
/// Times are in milliseconds, rounded to the configured number of decimals.
/// Every nesting level adds exactly four columns of prefix, so the depth of a line
/// is the width of its prefix divided by four. Measurements that are still running
/// show `running` instead of a time.
///
/// Aggregate measurements follow in a separate section, sorted by name.
///
/// # Examples
///
/// ```
/// use nested_stopwatch::Session;
///
/// let mut session = Session::new();
/// session.start("request");
/// session.stop("request");
///
/// let report = session.to_report();
/// assert!(!report.is_empty());
/// report.print_to_stdout();
/// ```
#[derive(Clone, Debug)]
pub struct Report {
    trees: Vec<MeasurementTree>,
    aggregates: Vec<ReportAggregate>,
    round_digits: usize,
}

/// Totals of one aggregate measurement in a report.
#[derive(Clone, Debug)]
pub struct ReportAggregate {
    name: String,
    total: Duration,
    count: u64,
}

impl Report {
    pub(crate) fn new(
        trees: &[MeasurementTree],
        aggregates: &HashMap<String, AggregateMeasurement>,
        round_digits: usize,
    ) -> Self {
        let mut aggregates: Vec<_> = aggregates
            .values()
            .map(|aggregate| ReportAggregate {
                name: aggregate.name().to_owned(),
                total: aggregate.total(),
                count: aggregate.count(),
            })
            .collect();

        // Sort aggregates by name for consistent output.
        aggregates.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            trees: trees.to_vec(),
            aggregates,
            round_digits,
        }
    }

    /// Prints the report to stdout.
    ///
    /// Prints nothing if nothing was measured, so that a session which never
    /// recorded anything does not add output to whatever the program prints.
    #[cfg_attr(test, mutants::skip)] // Too difficult to test stdout output reliably - manually tested.
    pub fn print_to_stdout(&self) {
        if self.is_empty() {
            return;
        }
        println!("{self}");
    }

    /// Whether there is any recorded activity in this report.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty() && self.aggregates.iter().all(|a| a.count == 0)
    }

    /// The measurement trees in the order their roots were started.
    #[must_use]
    pub fn trees(&self) -> &[MeasurementTree] {
        &self.trees
    }

    /// The aggregate measurements, sorted by name.
    pub fn aggregates(&self) -> impl Iterator<Item = &ReportAggregate> {
        self.aggregates.iter()
    }
}

impl ReportAggregate {
    /// The name of the aggregate.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
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
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "No measurements captured.");
        }

        for tree in &self.trees {
            write_node(f, tree, tree.root(), self.round_digits, "", None)?;
        }

        if !self.aggregates.is_empty() {
            writeln!(f, "Aggregates:")?;

            for aggregate in &self.aggregates {
                writeln!(
                    f,
                    "  {}: {} in {} passes ({} mean)",
                    aggregate.name,
                    Millis(Some(aggregate.total), self.round_digits),
                    aggregate.count,
                    Millis(Some(aggregate.mean()), self.round_digits)
                )?;
            }
        }

        Ok(())
    }
}

/// Renders the subtree rooted at `id` as text.
pub(crate) fn render_tree(tree: &MeasurementTree, id: MeasurementId, round_digits: usize) -> String {
    let mut text = String::new();

    write_node(&mut text, tree, id, round_digits, "", None)
        .expect("writing to a String cannot fail");

    text
}

/// Writes one node and its subtree.
///
/// `is_last` is `None` for the node the rendering started from, which gets no
/// connector of its own.
fn write_node(
    out: &mut impl Write,
    tree: &MeasurementTree,
    id: MeasurementId,
    round_digits: usize,
    prefix: &str,
    is_last: Option<bool>,
) -> fmt::Result {
    let node = tree
        .get(id)
        .expect("children always refer to nodes of the same tree");

    let (connector, continuation) = match is_last {
        None => ("", ""),
        Some(false) => (MID_CHILD, CONTINUATION),
        Some(true) => (LAST_CHILD, GAP),
    };

    writeln!(
        out,
        "{prefix}{connector}{}: {}",
        node.name(),
        Millis(node.elapsed(), round_digits)
    )?;

    let child_prefix = format!("{prefix}{continuation}");
    let mut children = node.children().iter().peekable();

    while let Some(&child) = children.next() {
        let is_last = children.peek().is_none();
        write_node(out, tree, child, round_digits, &child_prefix, Some(is_last))?;
    }

    Ok(())
}

/// A duration shown in milliseconds with a fixed number of decimals.
///
/// Ties round away from zero, so 2.5 ms with no decimals is shown as `3`.
struct Millis(Option<Duration>, usize);

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(elapsed) = self.0 else {
            return write!(f, "running");
        };

        let digits = self.1.min(MAX_ROUND_DIGITS);
        let scale = 10_f64.powi(
            i32::try_from(digits).expect("digits are clamped to MAX_ROUND_DIGITS, which fits in i32"),
        );

        write!(f, "{:.*}", digits, (millis(elapsed) * scale).round() / scale)
    }
}

/// Milliseconds in `elapsed`. Subsecond nanos are divided directly so that
/// representable values such as 1.25 ms come out exact before rounding.
fn millis(elapsed: Duration) -> f64 {
    let whole_seconds = Duration::from_secs(elapsed.as_secs()).as_secs_f64();

    whole_seconds * 1000.0 + f64::from(elapsed.subsec_nanos()) / 1_000_000.0
}
