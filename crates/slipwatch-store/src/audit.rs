//! Append-only audit log, one line per captured revision or failure.
//!
//! ```text
//! 20140922-10:15:02,Mon, 22 Sep 2014 10:00:00 GMT,Case A,5a1f-4e2b,http://x/03-123.pdf
//! 20140922-10:15:09,"Error: server returned 404",Case B,http://x/03-456.pdf
//! ```
//!
//! Fields are joined with commas and not quoted, except the error description.
//! The file is opened in append mode and is never truncated or rewritten.

use std::fmt::Display;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use slipwatch_core::RevisionDescriptor;

use crate::StoreError;

const EVENT_TIME_FORMAT: &str = "%Y%m%d-%H:%M:%S";

/// Audit log handle. The file is closed when the handle is dropped.
pub struct AuditLog {
    file: File,
    path: PathBuf,
}

impl AuditLog {
    /// Open (or create) the log for appending, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(StoreError::io(parent))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(StoreError::io(path))?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record a newly captured revision.
    pub fn record_capture(
        &mut self,
        revision: &RevisionDescriptor,
        location: &str,
    ) -> Result<(), StoreError> {
        let line = capture_line(&event_time(), revision, location);
        self.append(&line)
    }

    /// Record a failure for one document.
    pub fn record_error(
        &mut self,
        identity: &str,
        location: &str,
        error: &dyn Display,
    ) -> Result<(), StoreError> {
        let line = error_line(&event_time(), identity, location, &error.to_string());
        self.append(&line)
    }

    fn append(&mut self, line: &str) -> Result<(), StoreError> {
        self.file
            .write_all(line.as_bytes())
            .and_then(|()| self.file.flush())
            .map_err(StoreError::io(&self.path))
    }
}

fn event_time() -> String {
    Local::now().format(EVENT_TIME_FORMAT).to_string()
}

fn capture_line(at: &str, revision: &RevisionDescriptor, location: &str) -> String {
    format!(
        "{},{},{},{},{}\n",
        at,
        one_line(&revision.revision),
        one_line(&revision.identity),
        one_line(&revision.fingerprint),
        one_line(location),
    )
}

fn error_line(at: &str, identity: &str, location: &str, description: &str) -> String {
    let description = one_line(description).replace('"', "\"\"");
    format!(
        "{},\"Error: {}\",{},{}\n",
        at,
        description,
        one_line(identity),
        one_line(location),
    )
}

/// Keep every event on exactly one line.
fn one_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor() -> RevisionDescriptor {
        RevisionDescriptor {
            identity: "Case A".into(),
            revision: "Mon, 22 Sep 2014 10:00:00 GMT".into(),
            fingerprint: "5a1f-4e2b".into(),
        }
    }

    #[test]
    fn capture_line_format() {
        let line = capture_line("20140922-10:15:02", &descriptor(), "http://x/03-123.pdf");
        assert_eq!(
            line,
            "20140922-10:15:02,Mon, 22 Sep 2014 10:00:00 GMT,Case A,5a1f-4e2b,http://x/03-123.pdf\n"
        );
    }

    #[test]
    fn error_line_format() {
        let line = error_line(
            "20140922-10:15:09",
            "Case B",
            "http://x/03-456.pdf",
            "server returned 404",
        );
        assert_eq!(
            line,
            "20140922-10:15:09,\"Error: server returned 404\",Case B,http://x/03-456.pdf\n"
        );
    }

    #[test]
    fn error_description_escaped_to_one_line() {
        let line = error_line("t", "Case B", "u", "bad \"thing\"\nhappened");
        assert_eq!(line, "t,\"Error: bad \"\"thing\"\" happened\",Case B,u\n");
    }

    #[test]
    fn event_time_shape() {
        let at = event_time();
        assert_eq!(at.len(), "20140922-10:15:02".len());
        assert_eq!(&at[8..9], "-");
    }

    #[test]
    fn log_only_grows() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("logs").join("scotus.log");

        let mut log = AuditLog::open(&path).unwrap();
        log.record_capture(&descriptor(), "http://x/03-123.pdf").unwrap();
        let first = fs::metadata(&path).unwrap().len();
        drop(log);

        let mut log = AuditLog::open(&path).unwrap();
        log.record_error("Case B", "http://x/03-456.pdf", &"timed out")
            .unwrap();
        drop(log);

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.len() as u64 > first);
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(",Case A,5a1f-4e2b,http://x/03-123.pdf"));
        assert!(lines[1].ends_with(",\"Error: timed out\",Case B,http://x/03-456.pdf"));
    }
}
