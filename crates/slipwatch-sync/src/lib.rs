//! Sync layer: the HTTP session that lists terms, probes revisions, and downloads opinions.

pub mod http;
pub mod listing;

pub use http::{ClientConfig, SlipClient, SyncError};
pub use listing::parse_listing;
