//! One change-detection pass over a catalog.
//!
//! Per document: probe → already captured? → retrieve → commit. Every failure
//! is confined to its own document; a pass always visits the whole catalog.
//! Nothing is committed unless the download succeeded, so a failed document is
//! simply retried on the next pass.

use std::collections::BTreeSet;
use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

use slipwatch_core::{
    Catalog, CatalogEntry, PeriodSummary, ProbeError, RetrieveError, RevisionDescriptor,
    RevisionSource, payload_filename,
};
use slipwatch_store::{AuditLog, RevisionStore, StoreError};
use tracing::{debug, info, warn};

/// Final state of one document in one pass.
#[derive(Debug)]
pub enum DocumentOutcome {
    AlreadyCaptured {
        revision: RevisionDescriptor,
    },
    NewlyCaptured {
        revision: RevisionDescriptor,
        path: PathBuf,
    },
    ProbeFailed(ProbeError),
    RetrieveFailed {
        revision: RevisionDescriptor,
        error: RetrieveError,
    },
    StoreFailed(StoreError),
}

impl DocumentOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::ProbeFailed(_) | Self::RetrieveFailed { .. } | Self::StoreFailed(_)
        )
    }

    /// The error, for failed outcomes.
    pub fn error(&self) -> Option<&dyn std::error::Error> {
        match self {
            Self::ProbeFailed(e) => Some(e),
            Self::RetrieveFailed { error, .. } => Some(error),
            Self::StoreFailed(e) => Some(e),
            Self::AlreadyCaptured { .. } | Self::NewlyCaptured { .. } => None,
        }
    }
}

/// Hooks for progress reporting. All methods default to doing nothing.
pub trait PassObserver {
    fn term_listed(&mut self, _summary: &PeriodSummary) {}

    fn checking(&mut self, _entry: &CatalogEntry) {}

    /// A new revision was detected and is about to be downloaded.
    fn downloading(&mut self, _entry: &CatalogEntry, _revision: &RevisionDescriptor) {}

    fn finished(&mut self, _entry: &CatalogEntry, _outcome: &DocumentOutcome) {}

    fn pass_finished(&mut self, _report: &PassReport) {}

    /// The driver is about to wait `_interval` before the next pass.
    fn sleeping(&mut self, _interval: Duration) {}
}

pub struct NoopObserver;

impl PassObserver for NoopObserver {}

#[derive(Debug, Default)]
pub struct PassReport {
    /// Outcomes in catalog (sorted identity) order.
    pub outcomes: Vec<(String, DocumentOutcome)>,
    /// Identities captured for the first time at their current revision.
    pub changed: BTreeSet<String>,
}

impl PassReport {
    pub fn failures(&self) -> impl Iterator<Item = (&str, &DocumentOutcome)> {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.is_failure())
            .map(|(id, o)| (id.as_str(), o))
    }

    pub fn already_captured(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, DocumentOutcome::AlreadyCaptured { .. }))
            .count()
    }
}

/// Check every catalog entry once, capturing revisions the store has not seen.
pub async fn run_pass<S>(
    catalog: &Catalog,
    source: &S,
    store: &RevisionStore,
    mut audit: Option<&mut AuditLog>,
    observer: &mut dyn PassObserver,
) -> PassReport
where
    S: RevisionSource + ?Sized,
{
    let mut report = PassReport::default();

    for entry in catalog.iter() {
        observer.checking(entry);
        let outcome = check_document(entry, source, store, &mut audit, observer).await;
        observer.finished(entry, &outcome);

        if let DocumentOutcome::NewlyCaptured { .. } = outcome {
            report.changed.insert(entry.identity.clone());
        }
        report.outcomes.push((entry.identity.clone(), outcome));
    }

    info!(
        documents = report.outcomes.len(),
        changed = report.changed.len(),
        failed = report.failures().count(),
        "pass complete"
    );
    report
}

async fn check_document<S>(
    entry: &CatalogEntry,
    source: &S,
    store: &RevisionStore,
    audit: &mut Option<&mut AuditLog>,
    observer: &mut dyn PassObserver,
) -> DocumentOutcome
where
    S: RevisionSource + ?Sized,
{
    let revision = match source.probe(entry).await {
        Ok(revision) => revision,
        Err(e) => {
            warn!(identity = %entry.identity, location = %entry.location, error = %e, "probe failed");
            audit_error(audit, entry, &e);
            return DocumentOutcome::ProbeFailed(e);
        }
    };

    match store.has_captured(&entry.identity, &revision.revision) {
        Ok(true) => {
            debug!(identity = %entry.identity, revision = %revision.revision, "already captured");
            return DocumentOutcome::AlreadyCaptured { revision };
        }
        Ok(false) => {}
        Err(e) => {
            warn!(identity = %entry.identity, error = %e, "store lookup failed");
            audit_error(audit, entry, &e);
            return DocumentOutcome::StoreFailed(e);
        }
    }

    observer.downloading(entry, &revision);
    let payload = match source.retrieve(&entry.location).await {
        Ok(payload) => payload,
        Err(error) => {
            warn!(identity = %entry.identity, location = %entry.location, error = %error, "download failed");
            audit_error(audit, entry, &error);
            return DocumentOutcome::RetrieveFailed { revision, error };
        }
    };

    let filename = payload_filename(&entry.location);
    match store.commit(&entry.identity, &revision.revision, &payload, &filename) {
        Ok(path) => {
            info!(
                identity = %entry.identity,
                revision = %revision.revision,
                fingerprint = %revision.fingerprint,
                "captured new revision"
            );
            if let Some(log) = audit.as_deref_mut() {
                if let Err(e) = log.record_capture(&revision, &entry.location) {
                    warn!(path = %log.path().display(), error = %e, "audit log write failed");
                }
            }
            DocumentOutcome::NewlyCaptured { revision, path }
        }
        Err(e) => {
            warn!(identity = %entry.identity, error = %e, "commit failed");
            audit_error(audit, entry, &e);
            DocumentOutcome::StoreFailed(e)
        }
    }
}

fn audit_error(audit: &mut Option<&mut AuditLog>, entry: &CatalogEntry, error: &dyn Display) {
    let Some(log) = audit.as_deref_mut() else {
        return;
    };
    if let Err(e) = log.record_error(&entry.identity, &entry.location, error) {
        warn!(path = %log.path().display(), error = %e, "audit log write failed");
    }
}
