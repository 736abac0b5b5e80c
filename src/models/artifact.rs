use crate::error::KabuError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Point-in-time set of plot files (`*.png`) in a single directory.
///
/// Snapshots are plain values: the orchestrator takes one before and one
/// after execution and owns the set difference between them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArtifactSet {
    paths: BTreeSet<PathBuf>,
}

impl ArtifactSet {
    pub fn scan(dir: &Path) -> Result<Self, KabuError> {
        let mut paths = BTreeSet::new();

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_file() && is_plot_file(&path) {
                paths.insert(path);
            }
        }

        Ok(Self { paths })
    }

    /// Paths present in `self` but not in `before`. Ordering is the
    /// lexicographic path order, so reports are deterministic.
    pub fn new_since(&self, before: &ArtifactSet) -> Vec<PathBuf> {
        self.paths.difference(&before.paths).cloned().collect()
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

    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter()
    }
}

impl FromIterator<PathBuf> for ArtifactSet {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}

fn is_plot_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "png")
}

/// One successfully uploaded artifact: where it lived locally and the
/// durable URL it is now reachable at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedArtifact {
    pub filename: String,
    pub url: String,
    pub local_path: PathBuf,
}

impl PublishedArtifact {
    pub fn new(local_path: PathBuf, url: String) -> Self {
        let filename = local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            filename,
            url,
            local_path,
        }
    }
}
