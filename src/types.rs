//! Core types shared across the conversion pipeline.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Generic 256-bit hash value (blake3 digest)
pub type Hash = [u8; 32];

/// Classification of a tree node once fully resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    File,
    Directory,
    /// Not yet resolved; only exists between parsing and reconciliation.
    Unknown,
}

/// Where a tree node was first seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeOrigin {
    AsciiTree,
    Heading,
    Hint,
    Inferred,
}

/// A claim made on a path during reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindClaim {
    AsFile,
    AsDirectory,
}

impl KindClaim {
    pub fn as_kind(self) -> NodeKind {
        match self {
            KindClaim::AsFile => NodeKind::File,
            KindClaim::AsDirectory => NodeKind::Directory,
        }
    }
}

/// Normalized, slash-separated relative path. The unique identity for all
/// per-path entities.
///
/// Invariants: no leading `/`, no `..` segments, no backslashes, no empty
/// segments, case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathKey(String);

impl PathKey {
    /// Normalize and validate a raw path string into a `PathKey`.
    ///
    /// Normalization: trims whitespace, converts backslashes to slashes,
    /// collapses repeated slashes, strips leading `./` and trailing slashes.
    /// Validation rejects absolute paths, drive/UNC prefixes, URL schemes,
    /// `..` traversal, control characters, and reserved characters.
    pub fn new(raw: &str) -> Result<Self, Error> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(invalid(raw, "empty path"));
        }
        if trimmed.starts_with('/') || trimmed.starts_with('\\') {
            return Err(invalid(raw, "absolute paths are not allowed"));
        }
        if trimmed.len() >= 2 && trimmed.as_bytes()[1] == b':' {
            return Err(invalid(raw, "drive-prefixed paths are not allowed"));
        }
        if trimmed.contains("://") {
            return Err(invalid(raw, "URL schemes are not allowed"));
        }
        if trimmed.chars().any(|c| c.is_control()) {
            return Err(invalid(raw, "control characters are not allowed"));
        }

        let mut segments: Vec<&str> = Vec::new();
        for seg in trimmed.split(['/', '\\']) {
            let seg = seg.trim();
            if seg.is_empty() || seg == "." {
                continue;
            }
            if seg == ".." {
                return Err(invalid(raw, "parent traversal ('..') is not allowed"));
            }
            if seg.ends_with(' ') || seg.ends_with('.') {
                return Err(invalid(raw, "trailing spaces or dots in a segment"));
            }
            if seg
                .chars()
                .any(|c| matches!(c, '<' | '>' | ':' | '"' | '|' | '?' | '*'))
            {
                return Err(invalid(raw, "reserved characters in a segment"));
            }
            segments.push(seg);
        }
        if segments.is_empty() {
            return Err(invalid(raw, "no usable path segments"));
        }
        Ok(PathKey(segments.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment.
    pub fn basename(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Parent path, or `None` for a top-level entry (the root is the
    /// implicit empty path).
    pub fn parent(&self) -> Option<PathKey> {
        self.0.rfind('/').map(|idx| PathKey(self.0[..idx].to_string()))
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.0.split('/').count()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Extension of the basename (without the dot), if any. A leading dot
    /// alone (hidden file) does not count as an extension.
    pub fn extension(&self) -> Option<&str> {
        let base = self.basename();
        match base.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&base[idx + 1..]),
        }
    }

    /// Join onto a filesystem root.
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        let mut out = root.to_path_buf();
        for seg in self.segments() {
            out.push(seg);
        }
        out
    }

    /// Extend with a child segment.
    pub fn join(&self, segment: &str) -> Result<PathKey, Error> {
        PathKey::new(&format!("{}/{}", self.0, segment))
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn invalid(path: &str, reason: &str) -> Error {
    Error::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}
