//! Filesystem-backed revision markers.
//!
//! Layout: `root/{identity}/{revision}/{payload}`. The existence of the
//! `root/{identity}/{revision}` directory is the only record that a revision
//! has been captured; there is no index beside it.
//!
//! A commit writes the payload into a hidden staging directory next to the
//! marker and then renames the staging directory into place. The rename is the
//! commit point, so a marker never appears without its payload. Existing
//! markers are never overwritten or removed.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use slipwatch_core::to_segment;
use tracing::{debug, info};

use crate::StoreError;

/// Prefix of in-progress commit directories inside an identity directory.
const STAGING_PREFIX: &str = ".staging-";

/// Revision store rooted at a directory.
#[derive(Debug, Clone)]
pub struct RevisionStore {
    root: PathBuf,
}

/// Something in the store that does not look like a completed commit.
///
/// Reported by [`RevisionStore::anomalies`] and never repaired automatically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anomaly {
    pub path: PathBuf,
    pub kind: AnomalyKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnomalyKind {
    /// Marker directory with no payload file in it.
    MissingPayload,
    /// Marker directory whose payload files are all zero bytes.
    EmptyPayload,
    /// Staging directory left behind by an interrupted commit.
    AbandonedStaging,
}

impl AnomalyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingPayload => "missing-payload",
            Self::EmptyPayload => "empty-payload",
            Self::AbandonedStaging => "abandoned-staging",
        }
    }
}

impl RevisionStore {
    /// Open the store, creating the root directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(StoreError::io(&root))?;
        info!(root = %root.display(), "revision store ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the marker for `(identity, revision)`.
    pub fn marker_path(&self, identity: &str, revision: &str) -> Result<PathBuf, StoreError> {
        let identity = to_segment(identity).map_err(|source| StoreError::InvalidSegment {
            field: "identity",
            source,
        })?;
        let revision = to_segment(revision).map_err(|source| StoreError::InvalidSegment {
            field: "revision",
            source,
        })?;
        Ok(self.root.join(identity).join(revision))
    }

    /// Whether `(identity, revision)` has already been captured.
    pub fn has_captured(&self, identity: &str, revision: &str) -> Result<bool, StoreError> {
        let marker = self.marker_path(identity, revision)?;
        marker.try_exists().map_err(StoreError::io(marker))
    }

    /// Record a new revision by writing `payload` beneath its marker.
    ///
    /// Returns the path of the written payload file. Fails with
    /// [`StoreError::AlreadyCaptured`] if the marker exists.
    pub fn commit(
        &self,
        identity: &str,
        revision: &str,
        payload: &[u8],
        filename: &str,
    ) -> Result<PathBuf, StoreError> {
        let marker = self.marker_path(identity, revision)?;
        let filename = to_segment(filename).map_err(|source| StoreError::InvalidSegment {
            field: "filename",
            source,
        })?;

        if marker.try_exists().map_err(StoreError::io(&marker))? {
            return Err(StoreError::AlreadyCaptured(marker));
        }

        let identity_dir = marker.parent().unwrap_or(self.root.as_path());
        fs::create_dir_all(identity_dir).map_err(StoreError::io(identity_dir))?;

        // Removed on drop if anything below fails.
        let staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(identity_dir)
            .map_err(StoreError::io(identity_dir))?;
        set_marker_permissions(staging.path())?;

        let staged_file = staging.path().join(&filename);
        let mut file = File::create(&staged_file).map_err(StoreError::io(&staged_file))?;
        file.write_all(payload)
            .and_then(|()| file.sync_all())
            .map_err(StoreError::io(&staged_file))?;
        drop(file);

        fs::rename(staging.path(), &marker).map_err(StoreError::io(&marker))?;
        debug!(marker = %marker.display(), bytes = payload.len(), "revision committed");

        Ok(marker.join(filename))
    }

    /// Captured revisions of `identity` as stored on disk (escaped), sorted.
    pub fn revisions(&self, identity: &str) -> Result<Vec<String>, StoreError> {
        let identity = to_segment(identity).map_err(|source| StoreError::InvalidSegment {
            field: "identity",
            source,
        })?;
        let dir = self.root.join(identity);
        if !dir.try_exists().map_err(StoreError::io(&dir))? {
            return Ok(Vec::new());
        }
        let mut revisions: Vec<String> = subdirs(&dir)?
            .into_iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .filter(|name| !name.starts_with(STAGING_PREFIX))
            .collect();
        revisions.sort();
        Ok(revisions)
    }

    /// Scan the whole store for markers without usable payloads and abandoned
    /// staging directories.
    pub fn anomalies(&self) -> Result<Vec<Anomaly>, StoreError> {
        let mut found = Vec::new();
        for identity_dir in subdirs(&self.root)? {
            for marker in subdirs(&identity_dir)? {
                let is_staging = marker
                    .file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with(STAGING_PREFIX));
                let kind = if is_staging {
                    Some(AnomalyKind::AbandonedStaging)
                } else {
                    payload_anomaly(&marker)?
                };
                if let Some(kind) = kind {
                    found.push(Anomaly { path: marker, kind });
                }
            }
        }
        found.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(found)
    }
}

fn payload_anomaly(marker: &Path) -> Result<Option<AnomalyKind>, StoreError> {
    let mut files = 0usize;
    for entry in fs::read_dir(marker).map_err(StoreError::io(marker))? {
        let entry = entry.map_err(StoreError::io(marker))?;
        let meta = entry.metadata().map_err(StoreError::io(entry.path()))?;
        if meta.is_file() {
            files += 1;
            if meta.len() > 0 {
                return Ok(None);
            }
        }
    }
    Ok(Some(if files == 0 {
        AnomalyKind::MissingPayload
    } else {
        AnomalyKind::EmptyPayload
    }))
}

fn subdirs(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir).map_err(StoreError::io(dir))? {
        let entry = entry.map_err(StoreError::io(dir))?;
        let file_type = entry.file_type().map_err(StoreError::io(entry.path()))?;
        if file_type.is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

#[cfg(unix)]
fn set_marker_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    // tempfile creates 0700 directories; markers are ordinary data.
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(StoreError::io(path))
}

#[cfg(not(unix))]
fn set_marker_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const T1: &str = "Mon, 22 Sep 2014 10:00:00 GMT";
    const T2: &str = "Tue, 23 Sep 2014 08:30:00 GMT";

    fn store() -> (tempfile::TempDir, RevisionStore) {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = RevisionStore::open(tmp.path().join("scotus_opinions")).unwrap();
        (tmp, store)
    }

    #[test]
    fn open_creates_root() {
        let (tmp, store) = store();
        assert!(store.root().is_dir());
        assert_eq!(store.root(), tmp.path().join("scotus_opinions"));
    }

    #[test]
    fn unknown_revision_not_captured() {
        let (_tmp, store) = store();
        assert!(!store.has_captured("Case A", T1).unwrap());
    }

    #[test]
    fn commit_creates_marker_and_payload() {
        let (_tmp, store) = store();
        let written = store.commit("Case A", T1, b"%PDF-1.4", "03-123.pdf").unwrap();

        assert_eq!(written, store.root().join("Case A").join(T1).join("03-123.pdf"));
        assert_eq!(fs::read(&written).unwrap(), b"%PDF-1.4");
        assert!(store.has_captured("Case A", T1).unwrap());
        assert!(!store.has_captured("Case A", T2).unwrap());
        assert!(!store.has_captured("Case B", T1).unwrap());
    }

    #[test]
    fn commit_never_overwrites() {
        let (_tmp, store) = store();
        let written = store.commit("Case A", T1, b"first", "03-123.pdf").unwrap();

        let err = store
            .commit("Case A", T1, b"second", "03-123.pdf")
            .unwrap_err();
        assert!(matches!(err, StoreError::AlreadyCaptured(_)));
        assert_eq!(fs::read(written).unwrap(), b"first");
    }

    #[test]
    fn captured_state_survives_reopen() {
        let (tmp, store) = store();
        store.commit("Case A", T1, b"pdf", "03-123.pdf").unwrap();
        drop(store);

        let reopened = RevisionStore::open(tmp.path().join("scotus_opinions")).unwrap();
        assert!(reopened.has_captured("Case A", T1).unwrap());
    }

    #[test]
    fn revisions_listed_sorted_without_staging() {
        let (_tmp, store) = store();
        store.commit("Case A", T2, b"v2", "03-123.pdf").unwrap();
        store.commit("Case A", T1, b"v1", "03-123.pdf").unwrap();
        fs::create_dir(store.root().join("Case A").join(".staging-abc")).unwrap();

        let revisions = store.revisions("Case A").unwrap();
        assert_eq!(revisions, vec![T1.to_string(), T2.to_string()]);
        assert!(store.revisions("Case B").unwrap().is_empty());
    }

    #[test]
    fn no_staging_left_after_commit() {
        let (_tmp, store) = store();
        store.commit("Case A", T1, b"pdf", "03-123.pdf").unwrap();
        let leftovers: Vec<_> = fs::read_dir(store.root().join("Case A"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .filter(|n| n.to_string_lossy().starts_with(STAGING_PREFIX))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn hostile_identity_stays_inside_root() {
        let (_tmp, store) = store();
        let written = store.commit("../../etc", T1, b"pdf", "x.pdf").unwrap();
        assert!(written.starts_with(store.root()));
        assert!(store.has_captured("../../etc", T1).unwrap());
        assert!(store.root().join("..%2F..%2Fetc").is_dir());
    }

    #[test]
    fn separator_and_underscore_names_get_separate_markers() {
        let (_tmp, store) = store();
        store.commit("Doe v. A/B", T1, b"slash", "03-1.pdf").unwrap();

        assert!(!store.has_captured("Doe v. A_B", T1).unwrap());
        let written = store.commit("Doe v. A_B", T1, b"underscore", "03-2.pdf").unwrap();

        assert_eq!(fs::read(written).unwrap(), b"underscore");
        assert_ne!(
            store.marker_path("Doe v. A/B", T1).unwrap(),
            store.marker_path("Doe v. A_B", T1).unwrap()
        );
    }

    #[test]
    fn reserved_identity_rejected() {
        let (_tmp, store) = store();
        let err = store.has_captured("..", T1).unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidSegment {
                field: "identity",
                ..
            }
        ));
        assert!(store.commit("Case A", T1, b"pdf", "").is_err());
    }

    #[test]
    fn anomalies_reported_not_repaired() {
        let (_tmp, store) = store();
        store.commit("Case A", T1, b"pdf", "03-123.pdf").unwrap();
        store.commit("Case B", T1, b"", "03-456.pdf").unwrap();
        fs::create_dir_all(store.root().join("Case C").join(T1)).unwrap();
        fs::create_dir_all(store.root().join("Case D").join(".staging-xyz")).unwrap();

        let anomalies = store.anomalies().unwrap();
        let kinds: Vec<(String, AnomalyKind)> = anomalies
            .iter()
            .map(|a| {
                let identity = a.path.parent().unwrap().file_name().unwrap();
                (identity.to_string_lossy().into_owned(), a.kind)
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("Case B".to_string(), AnomalyKind::EmptyPayload),
                ("Case C".to_string(), AnomalyKind::MissingPayload),
                ("Case D".to_string(), AnomalyKind::AbandonedStaging),
            ]
        );
        // Still present afterwards.
        assert!(store.root().join("Case C").join(T1).is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn commit_fails_on_readonly_root() {
        use std::os::unix::fs::PermissionsExt;

        let (_tmp, store) = store();
        fs::set_permissions(store.root(), fs::Permissions::from_mode(0o555)).unwrap();
        // Root may bypass permission bits; only assert when the write is refused.
        let result = store.commit("Case A", T1, b"pdf", "03-123.pdf");
        fs::set_permissions(store.root(), fs::Permissions::from_mode(0o755)).unwrap();
        if let Err(err) = result {
            assert!(matches!(err, StoreError::Io { .. }));
            assert!(!store.has_captured("Case A", T1).unwrap());
        }
    }
}
