//! Core types for slipwatch: terms, catalog entries, revisions, and the source traits
//! the watcher is built against.

pub mod catalog;
pub mod error;
pub mod period;
pub mod revision;
pub mod segment;
pub mod source;

pub use catalog::{
    Catalog, CatalogBuild, CatalogEntry, IdentityFilter, Listing, PeriodSummary,
    SupersededListing, build_catalog,
};
pub use error::{CatalogError, PeriodError, ProbeError, RetrieveError, SegmentError};
pub use period::{Period, PeriodRange};
pub use revision::{RevisionDescriptor, payload_filename, strip_fingerprint};
pub use segment::to_segment;
pub use source::{CatalogSource, RevisionSource};
