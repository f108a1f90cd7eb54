use std::path::PathBuf;

use slipwatch_core::SegmentError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid {field} for storage: {source}")]
    InvalidSegment {
        field: &'static str,
        #[source]
        source: SegmentError,
    },

    #[error("revision already captured: {}", .0.display())]
    AlreadyCaptured(PathBuf),

    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
