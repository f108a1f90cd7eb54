//! Polling driver: build the catalog, run a pass, sleep, repeat.
//!
//! Each pass starts from scratch; the only state carried between passes is
//! what the revision store holds on disk. Shutdown is observed both during a
//! pass and while sleeping. Dropping an in-flight pass is safe because no
//! marker exists until its payload has been written.

use std::future::Future;
use std::time::Duration;

use slipwatch_core::{CatalogSource, Period, RevisionSource, build_catalog};
use slipwatch_store::{AuditLog, RevisionStore, StoreError};
use thiserror::Error;
use tracing::{info, warn};

use crate::{PassObserver, PassReport, Settings, run_pass};

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("cannot open revision store: {0}")]
    Store(#[source] StoreError),
    #[error("cannot open audit log: {0}")]
    AuditLog(#[source] StoreError),
}

/// Owns the source, the store, and the audit log for the life of the process.
pub struct Watcher<S> {
    source: S,
    store: RevisionStore,
    audit: Option<AuditLog>,
    settings: Settings,
}

impl<S> Watcher<S>
where
    S: CatalogSource + RevisionSource,
{
    /// Create the store root and open the audit log. Either failing is fatal.
    pub fn open(source: S, settings: Settings) -> Result<Self, WatchError> {
        let store = RevisionStore::open(&settings.store_root).map_err(WatchError::Store)?;
        let audit = settings
            .log_path
            .as_deref()
            .map(AuditLog::open)
            .transpose()
            .map_err(WatchError::AuditLog)?;
        Ok(Self {
            source,
            store,
            audit,
            settings,
        })
    }

    pub fn store(&self) -> &RevisionStore {
        &self.store
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// One full pass: list every term, then check every cataloged document.
    pub async fn run_once(&mut self, observer: &mut dyn PassObserver) -> PassReport {
        let range = self.settings.period_range(Period::current());
        let build = build_catalog(
            &self.source,
            range,
            self.settings.identity_filter.as_ref(),
        )
        .await;
        for summary in &build.periods {
            observer.term_listed(summary);
        }
        if let Some(log) = self.audit.as_mut() {
            for summary in build.unavailable() {
                let Err(error) = &summary.listed else {
                    continue;
                };
                let identity = format!("Term={}", summary.period);
                let location = self.source.period_location(summary.period);
                if let Err(e) = log.record_error(&identity, &location, error) {
                    warn!(path = %log.path().display(), error = %e, "audit log write failed");
                }
            }
        }

        let report = run_pass(
            &build.catalog,
            &self.source,
            &self.store,
            self.audit.as_mut(),
            observer,
        )
        .await;
        observer.pass_finished(&report);
        report
    }

    /// Run passes with `interval` between them until `shutdown` resolves.
    ///
    /// Returns the number of passes that ran to completion.
    pub async fn run_forever<F>(
        &mut self,
        interval: Duration,
        shutdown: F,
        observer: &mut dyn PassObserver,
    ) -> usize
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut completed = 0;

        loop {
            let finished = tokio::select! {
                _ = self.run_once(&mut *observer) => true,
                () = &mut shutdown => false,
            };
            if !finished {
                info!("shutdown requested during pass");
                break;
            }
            completed += 1;

            info!(seconds = interval.as_secs(), "sleeping until next pass");
            observer.sleeping(interval);
            let woke = tokio::select! {
                () = tokio::time::sleep(interval) => true,
                () = &mut shutdown => false,
            };
            if !woke {
                info!("shutdown requested while sleeping");
                break;
            }
        }

        completed
    }
}
