//! Integration tests for `nested_stopwatch` against the real clock.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use nested_stopwatch::{Error, Session};

const SLEEP: Duration = Duration::from_millis(5);

#[test]
#[cfg_attr(miri, ignore)] // Sleeping under Miri is impractically slow.
fn nested_measurements_contain_their_children() {
    let mut session = Session::new();

    let total = session.start("Total").unwrap();
    session.start("Init");
    thread::sleep(SLEEP);
    session.stop("Init");
    session.start("Database");
    session.start("Connection");
    thread::sleep(SLEEP);
    session.stop("Connection");
    session.stop("Database");
    session.stop("Total");

    let tree = session.tree(total).unwrap();
    let root = tree.get(tree.root()).unwrap();
    let root_elapsed = root.elapsed().unwrap();
    assert!(root_elapsed >= SLEEP * 2);

    for &child in root.children() {
        let child = tree.get(child).unwrap();
        assert!(child.start() >= root.start());
        assert!(child.end().unwrap() <= root.end().unwrap());
        assert!(child.elapsed().unwrap() >= SLEEP);
    }

    let text = session.report(total, 0).unwrap();
    let names: Vec<_> = text
        .lines()
        .map(|line| line.trim_start_matches(['│', '├', '└', '─', ' ']))
        .map(|line| line.split(':').next().unwrap())
        .collect();
    assert_eq!(names, ["Total", "Init", "Database", "Connection"]);
}

#[test]
#[cfg_attr(miri, ignore)] // Sleeping under Miri is impractically slow.
fn aggregate_total_covers_all_passes() {
    const PASSES: u32 = 10;

    let mut session = Session::new();

    for _ in 0..PASSES {
        session.start_aggregate("loop");
        thread::sleep(SLEEP);
        session.pause_aggregate("loop");
    }

    let aggregate = session.aggregate("loop").unwrap();
    assert_eq!(aggregate.count(), u64::from(PASSES));
    assert!(aggregate.total() >= SLEEP * PASSES);
    // Generous upper bound, CI machines can be slow to wake up.
    assert!(aggregate.total() < SLEEP * PASSES * 20);
    assert!(aggregate.mean() >= SLEEP);
}

#[test]
fn zero_length_measurement_is_recorded() {
    let mut session = Session::new();

    session.start("Zero");
    let zero = session.stop("Zero").unwrap();

    assert!(zero.is_stopped());
    assert!(zero.elapsed().unwrap() < Duration::from_secs(1));
}

#[test]
fn error_handler_receives_error_kinds() {
    let errors: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let errors_clone = Arc::clone(&errors);

    let mut session = Session::builder()
        .on_error(move |error| {
            let kind = match error {
                Error::NotActive { .. } => "not active",
                Error::DoubleStart { .. } => "double start",
                _ => "other",
            };
            errors_clone.lock().unwrap().push(kind.to_owned());
        })
        .build();

    session.start("outer");
    session.start("inner");
    session.stop("outer");
    session.start_aggregate("loop");
    session.start_aggregate("loop");
    session.mark("fine");

    assert_eq!(*errors.lock().unwrap(), ["not active", "double start"]);
}

#[test]
fn disabled_session_is_inert() {
    let mut session = Session::builder().enabled(false).build();

    session.start("a");
    session.mark("b");
    session.stop("a");
    session.start_aggregate("c");
    session.pause_aggregate("c");

    assert!(session.is_empty());
    assert_eq!(session.to_string(), "No measurements captured.\n");
}

#[test]
fn report_outlives_session() {
    let mut session = Session::builder().round_digits(1).build();
    session.start("work");
    session.stop("work");

    let report = session.to_report();
    drop(session);

    let text = thread::spawn(move || report.to_string()).join().unwrap();
    assert!(text.starts_with("work: "), "got {text}");
}
