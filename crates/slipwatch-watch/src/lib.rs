//! Watcher runtime: one change-detection pass over the catalog, and the driver
//! that repeats passes on an interval until shut down.

mod driver;
mod pass;
mod settings;

#[cfg(test)]
mod testing;

pub use driver::{WatchError, Watcher};
pub use pass::{DocumentOutcome, NoopObserver, PassObserver, PassReport, run_pass};
pub use settings::{DEFAULT_STORE_ROOT, Settings};
