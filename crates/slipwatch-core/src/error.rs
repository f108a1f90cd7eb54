use thiserror::Error;

use crate::Period;

/// A term listing could not be fetched or read. Never fatal for a catalog build.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("listing for term {period} unavailable: {reason}")]
    PeriodUnavailable { period: Period, reason: String },
}

/// Remote metadata for a document could not be established.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("request failed: {0}")]
    Unreachable(String),

    #[error("server returned {status}")]
    Status { status: u16 },

    #[error("response missing {0} header")]
    MissingHeader(&'static str),
}

/// The document body could not be downloaded after a change was detected.
#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("request failed: {0}")]
    Unreachable(String),

    #[error("server returned {status}")]
    Status { status: u16 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SegmentError {
    #[error("empty path segment")]
    Empty,

    #[error("reserved path segment {0:?}")]
    Reserved(String),

    #[error("path segment longer than {max} bytes")]
    TooLong { max: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("invalid term {0:?}: expected YY or YYYY")]
    Invalid(String),
}
