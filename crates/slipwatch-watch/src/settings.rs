use std::path::PathBuf;
use std::time::Duration;

use slipwatch_core::{IdentityFilter, Period, PeriodRange};

pub const DEFAULT_STORE_ROOT: &str = "scotus_opinions";

/// Validated watcher configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub store_root: PathBuf,
    /// Audit log; disabled when `None`.
    pub log_path: Option<PathBuf>,
    /// Repeat passes forever with this pause between them.
    pub poll_interval: Option<Duration>,
    /// Earliest term to list; defaults to three terms before the current one.
    pub first_period: Option<Period>,
    pub identity_filter: Option<IdentityFilter>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_root: PathBuf::from(DEFAULT_STORE_ROOT),
            log_path: None,
            poll_interval: None,
            first_period: None,
            identity_filter: None,
        }
    }
}

impl Settings {
    /// Terms to list when the current term is `current`.
    pub fn period_range(&self, current: Period) -> PeriodRange {
        match self.first_period {
            Some(first) => PeriodRange::new(first, current),
            None => PeriodRange::default_for(current),
        }
    }
}
