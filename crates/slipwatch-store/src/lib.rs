//! Storage layer: revision markers on the filesystem and the audit log.

mod audit;
mod error;
mod revisions;

pub use audit::AuditLog;
pub use error::StoreError;
pub use revisions::{Anomaly, AnomalyKind, RevisionStore};
