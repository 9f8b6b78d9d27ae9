//! Times a simulated request with nested steps and a loop, then prints the report.
//!
//! The session's `tracing` events are printed at debug level. Change the maximum
//! level below to see more or less of them.

use std::thread;
use std::time::Duration;

use nested_stopwatch::Session;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut session = Session::builder()
        .round_digits(1)
        .on_error(|error| eprintln!("stopwatch misuse: {error}"))
        .build();

    session.start("Init");
    thread::sleep(Duration::from_millis(35));
    if let Some(init) = session.stop("Init") {
        println!("Init took {:?}", init.elapsed().unwrap_or_default());
    }

    session.start("Total");
    session.start("Init");
    thread::sleep(Duration::from_millis(9));
    session.stop("Init");
    session.start("Database");
    session.start("Connection");
    thread::sleep(Duration::from_millis(76));
    session.stop("Connection");
    session.mark("Connected");
    session.start("Read");
    thread::sleep(Duration::from_millis(12));
    session.start("Cache");
    thread::sleep(Duration::from_millis(3));
    session.stop("Cache");
    session.stop("Read");
    session.stop("Database");

    // Deliberate misuse: "Total" is the active measurement, not "Database".
    session.stop("Database");

    if let Some(total) = session.stop("Total") {
        println!("Total has {} direct children", total.children().len());
    }

    for _ in 0..10 {
        session.start_aggregate("loop");
        thread::sleep(Duration::from_millis(3));
        session.pause_aggregate("loop");
    }

    session.print_to_stdout();
    println!("Session lifetime: {:?}", session.elapsed());
}
