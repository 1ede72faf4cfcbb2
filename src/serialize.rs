//! Folder serializer
//!
//! The export direction: walk a directory and emit the Markdown document
//! the generate direction consumes. Ordering is deterministic, directories
//! before files and byte-lexicographic within each group, so the same tree
//! always serializes to the same bytes. Bodies pass through the fence
//! escape so any file content survives embedding.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::Error;
use crate::fence;
use crate::ignore::IgnoreSet;
use crate::types::PathKey;

/// One walked entry, pre-order, depth relative to the root.
#[derive(Debug, Clone)]
struct WalkEntry {
    path: PathKey,
    depth: usize,
    is_dir: bool,
}

/// Serializer output.
#[derive(Debug)]
pub struct SerializedDoc {
    pub markdown: String,
    pub file_count: usize,
    /// Divergences from the source: omitted files and adjusted bodies.
    pub notices: Vec<String>,
}

/// Options for one export run.
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    pub source_root: PathBuf,
    /// Document title, defaults to "Generated Folder Structure".
    pub title: Option<String>,
}

impl SerializeOptions {
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        SerializeOptions {
            source_root: source_root.into(),
            title: None,
        }
    }
}

/// Collect the tree under `root` in render order.
fn walk(root: &Path, ignore: &IgnoreSet) -> Result<Vec<WalkEntry>, Error> {
    let mut entries = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by(|a, b| {
            let a_dir = a.file_type().is_dir();
            let b_dir = b.file_type().is_dir();
            b_dir.cmp(&a_dir).then_with(|| a.file_name().cmp(b.file_name()))
        });
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            match e.into_io_error() {
                Some(io) => Error::io(&path, io),
                None => Error::Structural(format!("walk failed under {}", path.display())),
            }
        })?;
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| Error::Structural(format!("walk escaped root at {}", entry.path().display())))?;
        let rel_str = rel.to_string_lossy().replace('\\', "/");
        let path = match PathKey::new(&rel_str) {
            Ok(p) => p,
            Err(_) => {
                warn!(path = %rel_str, "skipping unrepresentable path");
                continue;
            }
        };
        if ignore.is_ignored(&path) {
            continue;
        }
        entries.push(WalkEntry {
            depth: entry.depth(),
            is_dir: entry.file_type().is_dir(),
            path,
        });
    }
    Ok(entries)
}

/// Render the ASCII tree for the walked entries.
fn render_tree(root_name: &str, entries: &[WalkEntry]) -> String {
    let mut out = format!("{}/\n", root_name);
    // is_last flag per ancestor depth, rebuilt as the walk descends
    let mut last_flags: Vec<bool> = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        let is_last = !entries[i + 1..]
            .iter()
            .take_while(|e| e.depth >= entry.depth)
            .any(|e| e.depth == entry.depth);
        last_flags.truncate(entry.depth - 1);
        let mut line = String::new();
        for &ancestor_last in &last_flags {
            line.push_str(if ancestor_last { "    " } else { "│   " });
        }
        line.push_str(if is_last { "└── " } else { "├── " });
        line.push_str(entry.path.basename());
        if entry.is_dir {
            line.push('/');
        }
        out.push_str(&line);
        out.push('\n');
        last_flags.push(is_last);
    }
    out
}

/// Read a file body for embedding. Returns `None` with a notice when the
/// file cannot be embedded as text.
fn read_body(
    path: &PathKey,
    fs_path: &Path,
    config: &Config,
    notices: &mut Vec<String>,
) -> Result<Option<String>, Error> {
    let meta = std::fs::metadata(fs_path).map_err(|e| Error::io(fs_path, e))?;
    if meta.len() > config.max_file_size {
        notices.push(format!("'{}' exceeds the size limit, content omitted", path));
        return Ok(None);
    }
    let bytes = std::fs::read(fs_path).map_err(|e| Error::io(fs_path, e))?;
    if bytes.contains(&0) {
        notices.push(format!("'{}' is binary, content omitted", path));
        return Ok(None);
    }
    match String::from_utf8(bytes) {
        Ok(mut text) => {
            if !text.is_empty() && !text.ends_with('\n') {
                warn!(path = %path, "file not newline terminated, appending one");
                notices.push(format!(
                    "'{}' had no trailing newline, one was added for embedding",
                    path
                ));
                text.push('\n');
            }
            Ok(Some(text))
        }
        Err(_) => {
            notices.push(format!("'{}' is not valid UTF-8, content omitted", path));
            Ok(None)
        }
    }
}

/// Serialize the directory under `opts.source_root` into Markdown.
pub fn serialize_tree(
    opts: &SerializeOptions,
    config: &Config,
    ignore: &IgnoreSet,
) -> Result<SerializedDoc, Error> {
    let root = &opts.source_root;
    if !root.is_dir() {
        return Err(Error::InputNotFound(root.clone()));
    }
    let root_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string());
    let entries = walk(root, ignore)?;

    let title = opts.title.as_deref().unwrap_or("Generated Folder Structure");
    let mut markdown = format!("# {}\n\n## File Structure\n\n```text\n", title);
    markdown.push_str(&render_tree(&root_name, &entries));
    markdown.push_str("```\n");

    let mut notices = Vec::new();
    let mut file_count = 0usize;
    for entry in entries.iter().filter(|e| !e.is_dir) {
        let fs_path = entry.path.to_fs_path(root);
        let body = match read_body(&entry.path, &fs_path, config, &mut notices)? {
            Some(body) => body,
            None => continue,
        };
        file_count += 1;
        let tag = config.language_for(&entry.path);
        markdown.push_str(&format!("\n## {}\n\n```{}\n", entry.path, tag));
        markdown.push_str(&fence::encode(&body));
        markdown.push_str("```\n");
        debug!(path = %entry.path, bytes = body.len(), "file serialized");
    }

    Ok(SerializedDoc {
        markdown,
        file_count,
        notices,
    })
}

/// Re-parse a generated document and compare every recovered body against
/// the files it came from. Returns the list of mismatched paths.
pub fn verify_roundtrip(
    markdown: &str,
    source_root: &Path,
    config: &Config,
) -> Result<Vec<String>, Error> {
    use crate::document::blocks::{map_blocks, MapperOptions};
    use crate::document::structure::extract_structure_block;
    use crate::interactive::SilentResolver;
    use crate::reconcile::{reconcile, ForceLists};
    use crate::tree::parser::parse_tree;

    let doc = crate::document::scan(markdown);
    let structure = extract_structure_block(&doc)?;
    let parsed = parse_tree(&structure.text)?;
    let blocks = map_blocks(
        &doc,
        Some(&structure),
        Some(&parsed.tree),
        MapperOptions {
            strip_hints: config.strip_hints,
        },
    );
    let plan = reconcile(parsed, blocks, &ForceLists::default(), &mut SilentResolver);

    let mut mismatches = Vec::new();
    for (path, recovered) in &plan.contents {
        let key = PathKey::new(path)?;
        let fs_path = key.to_fs_path(source_root);
        let mut on_disk = match std::fs::read_to_string(&fs_path) {
            Ok(text) => text,
            Err(_) => {
                mismatches.push(path.clone());
                continue;
            }
        };
        if !on_disk.is_empty() && !on_disk.ends_with('\n') {
            on_disk.push('\n');
        }
        if &on_disk != recovered {
            mismatches.push(path.clone());
        }
    }
    Ok(mismatches)
}
