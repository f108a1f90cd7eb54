//! Conversion of untrusted remote strings into single filesystem path segments.
//!
//! Case names, `Last-Modified` values and URL basenames all end up as directory
//! or file names in the revision store. Each is escaped into exactly one path
//! component, and the escape is reversible so distinct inputs never share a
//! segment:
//!
//! - `%`, `/`, `\` and control characters become `%XX` (one per UTF-8 byte)
//! - leading and trailing whitespace is escaped the same way
//! - `""`, `"."` and `".."` are rejected
//!
//! Everything else (spaces, commas, colons, periods, underscores) is kept
//! verbatim so that `Roe v. Wade` and `Mon, 22 Sep 2014 10:00:00 GMT` stay
//! recognisable on disk.

use std::fmt::Write;

use crate::SegmentError;

/// Common filesystem limit for one path component.
pub const MAX_SEGMENT_BYTES: usize = 255;

/// Escape `raw` into a safe, non-empty single path segment.
pub fn to_segment(raw: &str) -> Result<String, SegmentError> {
    match raw {
        "" => return Err(SegmentError::Empty),
        "." | ".." => return Err(SegmentError::Reserved(raw.to_string())),
        _ => {}
    }

    let inner = raw.trim();
    let lead = raw.len() - raw.trim_start().len();
    let tail = raw.trim_end().len();

    let mut out = String::with_capacity(raw.len());
    for (i, c) in raw.char_indices() {
        let edge = inner.is_empty() || i < lead || i >= tail;
        if needs_escape(c) || (edge && c.is_whitespace()) {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                // Writing to a String cannot fail.
                let _ = write!(out, "%{byte:02X}");
            }
        } else {
            out.push(c);
        }
    }

    if out.len() > MAX_SEGMENT_BYTES {
        return Err(SegmentError::TooLong {
            max: MAX_SEGMENT_BYTES,
        });
    }
    Ok(out)
}

fn needs_escape(c: char) -> bool {
    matches!(c, '%' | '/' | '\\') || c.is_control()
}
