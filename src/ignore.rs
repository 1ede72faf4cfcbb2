//! Ignore rules
//!
//! Glob-based filtering for the export walk. Built-in patterns cover the
//! usual tool and dependency directories; config and CLI patterns stack on
//! top. Matching runs against slash-normalized relative paths and against
//! every individual path segment, so `__pycache__` prunes the directory at
//! any depth.

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::Error;
use crate::types::PathKey;

/// Always-ignored names and patterns.
pub const DEFAULT_IGNORE_PATTERNS: [&str; 12] = [
    ".git",
    "__pycache__",
    "node_modules",
    "target",
    ".venv",
    "venv",
    ".idea",
    ".vscode",
    ".DS_Store",
    "*.pyc",
    ".mdfold-cache.json",
    ".mdfold.json",
];

/// Compiled ignore matcher.
#[derive(Debug)]
pub struct IgnoreSet {
    set: GlobSet,
}

impl IgnoreSet {
    /// Build a matcher from the defaults plus `extra` patterns.
    pub fn build(extra: &[String]) -> Result<Self, Error> {
        let mut builder = GlobSetBuilder::new();
        for pattern in DEFAULT_IGNORE_PATTERNS.iter().copied() {
            builder.add(compile(pattern)?);
        }
        for pattern in extra {
            builder.add(compile(pattern)?);
        }
        let set = builder
            .build()
            .map_err(|e| Error::Pattern {
                pattern: "<ignore set>".to_string(),
                reason: e.to_string(),
            })?;
        Ok(IgnoreSet { set })
    }

    /// True when `path` or any of its segments matches an ignore pattern.
    pub fn is_ignored(&self, path: &PathKey) -> bool {
        if self.set.is_match(path.as_str()) {
            return true;
        }
        path.segments().any(|seg| self.set.is_match(seg))
    }
}

fn compile(pattern: &str) -> Result<Glob, Error> {
    Glob::new(pattern).map_err(|e| Error::Pattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> PathKey {
        PathKey::new(s).unwrap()
    }

    #[test]
    fn defaults_match_at_any_depth() {
        let set = IgnoreSet::build(&[]).unwrap();
        assert!(set.is_ignored(&key(".git")));
        assert!(set.is_ignored(&key("src/__pycache__/mod.pyc")));
        assert!(set.is_ignored(&key("a/b/node_modules")));
        assert!(!set.is_ignored(&key("src/main.rs")));
    }

    #[test]
    fn extension_globs_match_basenames() {
        let set = IgnoreSet::build(&[]).unwrap();
        assert!(set.is_ignored(&key("pkg/cached.pyc")));
        assert!(!set.is_ignored(&key("pkg/cached.py")));
    }

    #[test]
    fn extra_patterns_stack_on_defaults() {
        let set = IgnoreSet::build(&["*.log".to_string(), "tmp".to_string()]).unwrap();
        assert!(set.is_ignored(&key("out/run.log")));
        assert!(set.is_ignored(&key("tmp/x.txt")));
        assert!(set.is_ignored(&key(".git")));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let err = IgnoreSet::build(&["[".to_string()]).unwrap_err();
        assert!(matches!(err, Error::Pattern { .. }));
    }
}
