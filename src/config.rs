//! Runtime configuration
//!
//! Optional JSON configuration merged over built-in defaults. Covers the
//! extension tables (fence language tags, placeholder comment styles),
//! extra ignore patterns, and the logging section. A missing config file is
//! not an error; defaults apply.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::logging::LoggingConfig;
use crate::types::PathKey;

/// File name probed in the working directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = ".mdfold.json";

/// Well-known extensionless file names that still count as files.
const SPECIAL_FILES: [&str; 10] = [
    "Makefile",
    "Dockerfile",
    "Rakefile",
    "Gemfile",
    "Procfile",
    "Vagrantfile",
    "Justfile",
    "LICENSE",
    "README",
    "CHANGELOG",
];

pub fn is_special_file(name: &str) -> bool {
    SPECIAL_FILES.contains(&name) || name.starts_with('.')
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Extra ignore globs applied on top of the defaults.
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Extension to fence language tag overrides.
    #[serde(default)]
    pub languages: HashMap<String, String>,

    /// Extension to placeholder comment prefix overrides.
    #[serde(default)]
    pub comment_prefixes: HashMap<String, String>,

    /// Names or paths always treated as files when claims conflict.
    #[serde(default)]
    pub force_file: Vec<String>,

    /// Names or paths always treated as directories when claims conflict.
    #[serde(default)]
    pub force_dir: Vec<String>,

    /// Remove consumed inline path hints from rescued blocks.
    #[serde(default = "default_true")]
    pub strip_hints: bool,

    /// Files above this size are skipped on export with a notice.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_true() -> bool {
    true
}

fn default_max_file_size() -> u64 {
    1024 * 1024
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ignore: Vec::new(),
            languages: HashMap::new(),
            comment_prefixes: HashMap::new(),
            force_file: Vec::new(),
            force_dir: Vec::new(),
            strip_hints: default_true(),
            max_file_size: default_max_file_size(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit path.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load `.mdfold.json` from `dir` if present, else defaults.
    pub fn discover(dir: &Path) -> Result<Self, Error> {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Fence language tag for a path, `text` when unknown.
    pub fn language_for(&self, path: &PathKey) -> &str {
        let ext = match path.extension() {
            Some(ext) => ext,
            None => return "text",
        };
        if let Some(tag) = self.languages.get(ext) {
            return tag;
        }
        default_language(ext)
    }

    /// Comment prefix used for placeholder stubs, `None` for binary-ish or
    /// unknown extensions.
    pub fn comment_prefix_for(&self, path: &PathKey) -> Option<&str> {
        let ext = path.extension()?;
        if let Some(prefix) = self.comment_prefixes.get(ext) {
            return Some(prefix);
        }
        default_comment_prefix(ext)
    }

    /// Stub content for a declared file that arrived with no block.
    pub fn placeholder_for(&self, path: &PathKey) -> String {
        match self.comment_prefix_for(path) {
            Some(prefix) => format!("{} {}\n", prefix, path),
            None => String::new(),
        }
    }
}

fn default_language(ext: &str) -> &'static str {
    match ext {
        "rs" => "rust",
        "py" => "python",
        "js" => "javascript",
        "ts" => "typescript",
        "jsx" => "jsx",
        "tsx" => "tsx",
        "md" => "markdown",
        "json" => "json",
        "toml" => "toml",
        "yaml" | "yml" => "yaml",
        "sh" | "bash" => "bash",
        "html" | "htm" => "html",
        "css" => "css",
        "sql" => "sql",
        "go" => "go",
        "c" | "h" => "c",
        "cpp" | "cc" | "hpp" => "cpp",
        "java" => "java",
        "rb" => "ruby",
        "xml" => "xml",
        _ => "text",
    }
}

fn default_comment_prefix(ext: &str) -> Option<&'static str> {
    match ext {
        "py" | "sh" | "bash" | "rb" | "yaml" | "yml" | "toml" => Some("#"),
        "rs" | "js" | "ts" | "jsx" | "tsx" | "go" | "c" | "h" | "cpp" | "cc" | "hpp" | "java" => {
            Some("//")
        }
        "css" => Some("/*"),
        _ => None,
    }
}
