//! Classify every file below a set of roots.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use super::oracle::{ContentOracle, ContentProbe, ContentStatus};

/// Result of classifying a tree of archived files.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub entries: Vec<(PathBuf, ContentStatus)>,
    /// Entries that could not be inspected, with the reason.
    pub errors: Vec<(PathBuf, String)>,
}

impl ScanReport {
    pub fn count(&self, status: ContentStatus) -> usize {
        self.entries.iter().filter(|(_, s)| *s == status).count()
    }

    /// True when every classified entry has its content present.
    pub fn all_materialized(&self) -> bool {
        self.errors.is_empty()
            && self
                .entries
                .iter()
                .all(|(_, s)| *s == ContentStatus::Materialized)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Walk `roots` without following directory links and classify each
/// non-directory entry. Hidden entries below a root (`.git`, tool state)
/// are skipped. A root that is not a directory is classified itself,
/// which reports a missing root as [`ContentStatus::Absent`].
pub fn scan<P: ContentProbe>(oracle: &ContentOracle<P>, roots: &[PathBuf]) -> ScanReport {
    let mut report = ScanReport::default();

    for root in roots {
        let is_dir = std::fs::symlink_metadata(root)
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            classify(oracle, root, &mut report);
            continue;
        }

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_dir() => {}
                Ok(entry) => classify(oracle, entry.path(), &mut report),
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root.clone());
                    tracing::warn!(path = %path.display(), error = %e, "Failed to walk directory");
                    report.errors.push((path, e.to_string()));
                }
            }
        }
    }

    report
}

fn classify<P: ContentProbe>(oracle: &ContentOracle<P>, path: &Path, report: &mut ScanReport) {
    match oracle.status(path) {
        Ok(status) => report.entries.push((path.to_path_buf(), status)),
        Err(e) => {
            tracing::warn!(error = %e, "Content check failed");
            report.errors.push((path.to_path_buf(), e.to_string()));
        }
    }
}
