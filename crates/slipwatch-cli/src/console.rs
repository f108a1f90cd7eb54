//! Human-readable progress on stdout.

use std::time::Duration;

use slipwatch_core::{CatalogEntry, PeriodSummary, RevisionDescriptor};
use slipwatch_watch::{DocumentOutcome, PassObserver, PassReport};

pub struct ConsoleObserver {
    verbose: bool,
}

impl ConsoleObserver {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl PassObserver for ConsoleObserver {
    fn term_listed(&mut self, summary: &PeriodSummary) {
        match &summary.listed {
            Ok(count) if self.verbose => println!("Opinions for 20{}: {count}", summary.period),
            Ok(_) => {}
            Err(e) => println!("Error: '{e}'"),
        }
    }

    fn checking(&mut self, entry: &CatalogEntry) {
        if self.verbose {
            println!("Checking: '{}'", entry.identity);
        }
    }

    fn downloading(&mut self, entry: &CatalogEntry, revision: &RevisionDescriptor) {
        if self.verbose {
            println!(
                "Downloading NEW: {}\t{}\t{}\t{}",
                entry.identity, revision.revision, revision.fingerprint, entry.location
            );
        } else {
            println!("Downloading latest version of '{}'", entry.identity);
        }
    }

    fn finished(&mut self, entry: &CatalogEntry, outcome: &DocumentOutcome) {
        if let Some(error) = outcome.error() {
            println!("Error: '{error}'\t{}\t{}", entry.identity, entry.location);
        }
    }

    fn pass_finished(&mut self, report: &PassReport) {
        for identity in &report.changed {
            println!("Changes found in: {identity}");
        }
        if self.verbose {
            println!(
                "{} checked, {} new, {} unchanged, {} failed",
                report.outcomes.len(),
                report.changed.len(),
                report.already_captured(),
                report.failures().count()
            );
        }
    }

    fn sleeping(&mut self, interval: Duration) {
        println!("[*] Sleeping for {} seconds...", interval.as_secs());
    }
}
