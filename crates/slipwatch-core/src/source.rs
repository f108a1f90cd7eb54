//! Seams between the watcher and the remote site.
//!
//! `slipwatch-sync` implements both traits over HTTP; tests implement them in
//! memory.

use async_trait::async_trait;

use crate::{
    CatalogEntry, CatalogError, Listing, Period, ProbeError, RetrieveError, RevisionDescriptor,
};

/// Enumerates the opinion links published for a term.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_period(&self, period: Period) -> Result<Vec<Listing>, CatalogError>;

    /// Where the listing for `period` lives, for audit records.
    fn period_location(&self, period: Period) -> String {
        format!("Term={period}")
    }
}

/// Reads revision metadata and document bodies.
#[async_trait]
pub trait RevisionSource: Send + Sync {
    /// Metadata-only request for the document's current revision.
    async fn probe(&self, entry: &CatalogEntry) -> Result<RevisionDescriptor, ProbeError>;

    /// Download the full document body.
    async fn retrieve(&self, location: &str) -> Result<Vec<u8>, RetrieveError>;
}
