//! Materializer
//!
//! Writes a reconciled plan to disk. Directories first, then file bodies,
//! parents always before children. The materializer never deletes anything
//! it did not just write and never removes the output root; a stale tree is
//! the caller's problem to clean up.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::cache::Cache;
use crate::config::Config;
use crate::error::Error;
use crate::reconcile::{Reconciled, Resolution};
use crate::report::{GenerationReport, NodeStatus};
use crate::types::{KindClaim, NodeKind, PathKey};

/// Directory receiving blocks that found no destination.
pub const UNASSIGNED_DIR: &str = "_unassigned";

#[derive(Debug, Clone)]
pub struct MaterializeOptions {
    pub output_root: PathBuf,
    /// Report what would happen without touching disk.
    pub dry_run: bool,
    /// Leave existing files alone even when content differs.
    pub no_overwrite: bool,
    /// Skip unchanged files via the incremental cache.
    pub use_cache: bool,
    /// Write held blocks under [`UNASSIGNED_DIR`].
    pub write_unassigned: bool,
    /// Suppress placeholder writes for blockless files.
    pub skip_empty: bool,
    /// Mark shebang files executable after writing.
    pub set_exec: bool,
    /// Stop at the first failed write instead of recording and continuing.
    pub strict: bool,
}

impl MaterializeOptions {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        MaterializeOptions {
            output_root: output_root.into(),
            dry_run: false,
            no_overwrite: false,
            use_cache: true,
            write_unassigned: true,
            skip_empty: false,
            set_exec: false,
            strict: false,
        }
    }
}

fn conflict_line(path: &PathKey, resolution: Resolution, kind: NodeKind) -> String {
    let how = match resolution {
        Resolution::Forced(KindClaim::AsFile) => "forced to file",
        Resolution::Forced(KindClaim::AsDirectory) => "forced to directory",
        Resolution::Answered(KindClaim::AsFile) => "answered as file",
        Resolution::Answered(KindClaim::AsDirectory) => "answered as directory",
        Resolution::Defaulted(KindClaim::AsFile) => "defaulted to file",
        Resolution::Defaulted(KindClaim::AsDirectory) => "defaulted to directory",
    };
    format!("{}: {} ({:?})", path, how, kind)
}

/// Materialize the plan under `opts.output_root`.
///
/// Per-file failures are recorded and the run continues; only failures that
/// undermine the whole run, like an uncreatable output root, return an
/// error.
pub fn materialize(
    plan: &Reconciled,
    config: &Config,
    opts: &MaterializeOptions,
    cache: Option<&mut Cache>,
) -> Result<GenerationReport, Error> {
    let mut report = GenerationReport::new();
    for issue in &plan.issues {
        report.issue(issue.clone());
    }
    for conflict in &plan.conflicts {
        report
            .conflicts
            .push(conflict_line(&conflict.path, conflict.resolution, conflict.resolved_kind));
    }
    report.unassigned_blocks = plan.unassigned.len();

    if !opts.dry_run {
        std::fs::create_dir_all(&opts.output_root)
            .map_err(|e| Error::io(&opts.output_root, e))?;
    }

    let mut cache = cache.filter(|_| opts.use_cache);
    let mut written: Vec<PathKey> = Vec::new();

    for node in plan.tree.iter() {
        let fs_path = node.path.to_fs_path(&opts.output_root);
        match node.kind {
            NodeKind::Directory => {
                materialize_dir(&node.path, &fs_path, opts, &mut report);
            }
            NodeKind::File | NodeKind::Unknown => {
                // unresolved leaves materialize as files
                let (content, placeholder) = match plan.content_for(&node.path) {
                    Some(body) => (body.to_string(), false),
                    None => (config.placeholder_for(&node.path), true),
                };
                if placeholder && opts.skip_empty {
                    debug!(path = %node.path, "placeholder suppressed");
                    report.record(node.path.clone(), NodeKind::File, NodeStatus::Placeholder);
                    continue;
                }
                materialize_file(
                    &node.path,
                    &fs_path,
                    &content,
                    placeholder,
                    opts,
                    cache.as_deref_mut(),
                    &mut report,
                );
                written.push(node.path.clone());
            }
        }
        if opts.strict {
            fail_on_last(&report)?;
        }
    }

    if opts.write_unassigned && !plan.unassigned.is_empty() {
        write_unassigned(plan, opts, cache.as_deref_mut(), &mut report, &mut written)?;
    }

    if let Some(cache) = cache {
        cache.retain_paths(&written);
        if !opts.dry_run {
            if let Err(e) = cache.store() {
                warn!(error = %e, "cache not persisted, next run starts cold");
            }
        }
    }

    info!(
        created = report.count(NodeStatus::Created),
        skipped = report.count(NodeStatus::SkippedUnchanged),
        placeholders = report.count(NodeStatus::Placeholder),
        failed = report.count(NodeStatus::Failed),
        "materialization finished"
    );
    Ok(report)
}

/// Turn the most recent outcome into an error if it failed.
fn fail_on_last(report: &GenerationReport) -> Result<(), Error> {
    match report.outcomes.last() {
        Some(outcome) if outcome.status == NodeStatus::Failed => Err(Error::Strict(format!(
            "'{}' failed: {}",
            outcome.path,
            outcome.detail.as_deref().unwrap_or("unknown error")
        ))),
        _ => Ok(()),
    }
}

fn materialize_dir(
    path: &PathKey,
    fs_path: &Path,
    opts: &MaterializeOptions,
    report: &mut GenerationReport,
) {
    if fs_path.is_dir() {
        report.record(path.clone(), NodeKind::Directory, NodeStatus::SkippedUnchanged);
        return;
    }
    if opts.dry_run {
        report.record(path.clone(), NodeKind::Directory, NodeStatus::Created);
        return;
    }
    match std::fs::create_dir_all(fs_path) {
        Ok(()) => {
            debug!(path = %path, "directory created");
            report.record(path.clone(), NodeKind::Directory, NodeStatus::Created);
        }
        Err(e) => {
            warn!(path = %path, error = %e, "directory creation failed");
            report.record_detail(
                path.clone(),
                NodeKind::Directory,
                NodeStatus::Failed,
                e.to_string(),
            );
        }
    }
}

fn materialize_file(
    path: &PathKey,
    fs_path: &Path,
    content: &str,
    placeholder: bool,
    opts: &MaterializeOptions,
    cache: Option<&mut Cache>,
    report: &mut GenerationReport,
) {
    let success = if placeholder {
        NodeStatus::Placeholder
    } else {
        NodeStatus::Created
    };

    if let Some(cache) = &cache {
        if !cache.should_update(path, fs_path, content) {
            report.record(path.clone(), NodeKind::File, NodeStatus::SkippedUnchanged);
            return;
        }
    }

    if opts.no_overwrite && fs_path.is_file() {
        let existing = std::fs::read_to_string(fs_path).unwrap_or_default();
        if existing == content {
            report.record(path.clone(), NodeKind::File, NodeStatus::SkippedUnchanged);
        } else {
            report.issue(format!("'{}' exists with different content, left alone", path));
            report.record(path.clone(), NodeKind::File, NodeStatus::SkippedUnchanged);
        }
        return;
    }

    if opts.dry_run {
        report.record(path.clone(), NodeKind::File, success);
        return;
    }

    if let Some(parent) = fs_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            report.record_detail(path.clone(), NodeKind::File, NodeStatus::Failed, e.to_string());
            return;
        }
    }
    match std::fs::write(fs_path, content) {
        Ok(()) => {
            if opts.set_exec && content.starts_with("#!") {
                set_executable(fs_path);
            }
            if let Some(cache) = cache {
                cache.record(path, content);
            }
            debug!(path = %path, bytes = content.len(), placeholder, "file written");
            report.lines_written += content.lines().count();
            report.record(path.clone(), NodeKind::File, success);
        }
        Err(e) => {
            warn!(path = %path, error = %e, "write failed");
            report.record_detail(path.clone(), NodeKind::File, NodeStatus::Failed, e.to_string());
        }
    }
}

fn write_unassigned(
    plan: &Reconciled,
    opts: &MaterializeOptions,
    mut cache: Option<&mut Cache>,
    report: &mut GenerationReport,
    written: &mut Vec<PathKey>,
) -> Result<(), Error> {
    for (i, block) in plan.unassigned.iter().enumerate() {
        let ext = extension_for_tag(&block.fence_language_tag);
        let name = format!("{}/block-{:03}.{}", UNASSIGNED_DIR, i + 1, ext);
        let path = match PathKey::new(&name) {
            Ok(p) => p,
            Err(_) => continue,
        };
        let fs_path = path.to_fs_path(&opts.output_root);
        materialize_file(
            &path,
            &fs_path,
            &block.raw_text,
            false,
            opts,
            cache.as_deref_mut(),
            report,
        );
        written.push(path);
        if opts.strict {
            fail_on_last(report)?;
        }
    }
    Ok(())
}

/// File extension for a held block, from its fence language tag.
fn extension_for_tag(tag: &str) -> &'static str {
    match tag {
        "rust" => "rs",
        "python" => "py",
        "javascript" => "js",
        "typescript" => "ts",
        "markdown" => "md",
        "bash" | "sh" => "sh",
        "json" => "json",
        "yaml" => "yaml",
        "toml" => "toml",
        "html" => "html",
        "css" => "css",
        _ => "txt",
    }
}

#[cfg(unix)]
fn set_executable(fs_path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(meta) = std::fs::metadata(fs_path) {
        let mut perms = meta.permissions();
        perms.set_mode(perms.mode() | 0o111);
        if let Err(e) = std::fs::set_permissions(fs_path, perms) {
            warn!(path = %fs_path.display(), error = %e, "chmod failed");
        }
    }
}

#[cfg(not(unix))]
fn set_executable(_fs_path: &Path) {}
