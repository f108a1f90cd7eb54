//! Remote revision metadata for a single document.

use serde::{Deserialize, Serialize};

/// Fallback payload name when a retrieval location has no usable basename.
pub const DEFAULT_PAYLOAD_NAME: &str = "opinion.pdf";

/// What the server says about a document's current state.
///
/// `revision` is the raw `Last-Modified` value and is compared only for
/// equality. `fingerprint` is the entity tag, recorded in the audit log and
/// never used to decide whether a revision is new.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionDescriptor {
    pub identity: String,
    pub revision: String,
    pub fingerprint: String,
}

/// Strip the surrounding quotes from an entity tag.
///
/// A weak validator keeps its `W/` prefix: `W/"abc"` → `W/abc`.
pub fn strip_fingerprint(raw: &str) -> String {
    let raw = raw.trim();
    match raw.strip_prefix("W/") {
        Some(rest) => format!("W/{}", rest.trim_matches('"')),
        None => raw.trim_matches('"').to_string(),
    }
}

/// The last path component of a retrieval location, used as the payload file name.
///
/// Query strings and fragments are ignored. Returns [`DEFAULT_PAYLOAD_NAME`]
/// when the location ends in `/` or cannot be parsed.
pub fn payload_filename(location: &str) -> String {
    let from_url = url::Url::parse(location).ok().and_then(|u| {
        u.path_segments()
            .and_then(|mut segs| segs.next_back().map(str::to_string))
    });
    let name = from_url.unwrap_or_else(|| {
        let path = location.split(['?', '#']).next().unwrap_or_default();
        path.rsplit('/').next().unwrap_or_default().to_string()
    });
    if name.is_empty() {
        DEFAULT_PAYLOAD_NAME.to_string()
    } else {
        name
    }
}
