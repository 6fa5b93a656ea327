//! Operator-facing report lines.

use ctfix_fixer::{Outcome, Reporter};
use std::io::{self, Write};

/// Prints one line per reported key: informational outcomes to stdout,
/// failures to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

/// The line printed for `key`.
pub fn line(key: &str, outcome: &Outcome) -> String {
    format!("{key}: {outcome}")
}

impl Reporter for ConsoleReporter {
    fn report(&self, key: &str, outcome: &Outcome) {
        let line = line(key, outcome);
        // A closed pipe (e.g. `| head`) must not take the workers down.
        let _ = match outcome.is_failure() {
            true => writeln!(io::stderr().lock(), "{line}"),
            false => writeln!(io::stdout().lock(), "{line}"),
        };
    }
}
