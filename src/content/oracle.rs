//! Three-way content status for paths in the archive.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;

use super::error::ContentError;

/// Whether an archived item is known and whether its bytes are local.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentStatus {
    /// Nothing exists at the path.
    Absent,
    /// An entry exists but what it points at does not (e.g. an annex link
    /// whose object was never fetched or has been dropped).
    Referenced,
    /// The path resolves to actual content.
    Materialized,
}

impl ContentStatus {
    /// Label used by manifests and exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absent => "metadata_only",
            Self::Referenced => "tracked",
            Self::Materialized => "downloaded",
        }
    }

    /// Parse a manifest label.
    #[allow(dead_code)] // Symmetric with as_str; used in tests
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "metadata_only" => Some(Self::Absent),
            "tracked" => Some(Self::Referenced),
            "downloaded" => Some(Self::Materialized),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two filesystem predicates the oracle is built on.
///
/// Both return `Ok(false)` only when the entry is genuinely missing; any
/// other failure is an error.
pub trait ContentProbe {
    /// An entry exists at `path`, without following links.
    fn exists_no_follow(&self, path: &Path) -> io::Result<bool>;

    /// `path` resolves to an existing entry after following all links.
    fn exists_follow(&self, path: &Path) -> io::Result<bool>;
}

/// Probe backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalProbe;

fn found(result: io::Result<fs::Metadata>) -> io::Result<bool> {
    match result {
        Ok(_) => Ok(true),
        // A path component that is a plain file also means "no such entry"
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

impl ContentProbe for LocalProbe {
    fn exists_no_follow(&self, path: &Path) -> io::Result<bool> {
        found(fs::symlink_metadata(path))
    }

    fn exists_follow(&self, path: &Path) -> io::Result<bool> {
        found(fs::metadata(path))
    }
}

/// Reports content status for paths. Nothing is cached; every call looks
/// at the filesystem again, and nothing is ever fetched or repaired.
#[derive(Debug, Clone, Default)]
pub struct ContentOracle<P = LocalProbe> {
    probe: P,
}

impl ContentOracle<LocalProbe> {
    pub fn new() -> Self {
        Self { probe: LocalProbe }
    }
}

impl<P: ContentProbe> ContentOracle<P> {
    pub fn with_probe(probe: P) -> Self {
        Self { probe }
    }

    /// True if an entry exists at `path`, even a dangling link.
    pub fn is_tracked(&self, path: &Path) -> Result<bool, ContentError> {
        self.probe
            .exists_no_follow(path)
            .map_err(|source| probe_error(path, source))
    }

    /// True if `path` resolves to real content.
    pub fn is_available(&self, path: &Path) -> Result<bool, ContentError> {
        self.probe
            .exists_follow(path)
            .map_err(|source| probe_error(path, source))
    }

    pub fn status(&self, path: &Path) -> Result<ContentStatus, ContentError> {
        if !self.is_tracked(path)? {
            return Ok(ContentStatus::Absent);
        }
        if self.is_available(path)? {
            Ok(ContentStatus::Materialized)
        } else {
            Ok(ContentStatus::Referenced)
        }
    }
}

fn probe_error(path: &Path, source: io::Error) -> ContentError {
    ContentError::Probe {
        path: path.to_path_buf(),
        source,
    }
}
