//! Mark-and-sweep bookkeeping for output files.
//!
//! A [`StalePathSet`] starts out holding every file a previous run left behind.
//! The walk removes each path it produces again; whatever is still listed when
//! the walk is over no longer has a source and gets deleted.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::Result;

#[derive(Debug, Clone, Default)]
pub struct StalePathSet {
    paths: BTreeSet<PathBuf>,
}

impl StalePathSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects the files under `root` (up to `max_depth` levels deep) that
    /// `keep` accepts. A missing root yields an empty set.
    pub fn scan<F>(root: &Path, max_depth: usize, keep: F) -> Self
    where
        F: Fn(&Path) -> bool,
    {
        let mut paths = BTreeSet::new();
        if root.exists() {
            for entry in WalkDir::new(root).max_depth(max_depth) {
                match entry {
                    Ok(entry) if entry.file_type().is_file() && keep(entry.path()) => {
                        paths.insert(entry.into_path());
                    }
                    Ok(_) => {}
                    Err(e) => warn!(error = %e, root = %root.display(), "Skipping unreadable entry"),
                }
            }
        }
        debug!(root = %root.display(), existing = paths.len(), "Scanned existing output files");
        StalePathSet { paths }
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>) {
        self.paths.insert(path.into());
    }

    /// Records that `path` is still produced. Returns true if it was listed.
    pub fn mark_seen(&mut self, path: &Path) -> bool {
        self.paths.remove(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }

    /// Deletes every path still listed and empties the set. Files that are
    /// already gone are not an error.
    pub fn sweep(&mut self) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();
        for path in std::mem::take(&mut self.paths) {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    info!(path = %path.display(), "Removed stale file");
                    removed.push(path);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!(path = %path.display(), "Stale file already gone");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }
}
