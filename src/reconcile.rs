//! Reconciliation
//!
//! Merges the declared tree with the content blocks into one conflict-free
//! plan. Both sources claim paths; when a path ends up claimed as file and
//! directory at once, resolution runs through the force lists first, then
//! the resolver, and finally defaults by shape: directory when anything
//! nests beneath the path, file otherwise. Content never
//! disappears: blocks displaced by a resolution move to the unassigned
//! holding area.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info, warn};

use crate::document::blocks::{BlockMap, BlockSource, ContentBlock};
use crate::interactive::ConflictResolver;
use crate::tree::parser::ParsedTree;
use crate::tree::Tree;
use crate::types::{KindClaim, NodeKind, NodeOrigin, PathKey};

/// CLI-provided overrides. Entries match a full path or a basename, both
/// compared case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct ForceLists {
    files: HashSet<String>,
    dirs: HashSet<String>,
}

impl ForceLists {
    pub fn new(files: &[String], dirs: &[String]) -> Self {
        let lower = |v: &[String]| v.iter().map(|s| s.to_lowercase()).collect();
        ForceLists {
            files: lower(files),
            dirs: lower(dirs),
        }
    }

    fn lookup(&self, path: &PathKey) -> Option<KindClaim> {
        let full = path.as_str().to_lowercase();
        let base = path.basename().to_lowercase();
        if self.files.contains(&full) || self.files.contains(&base) {
            return Some(KindClaim::AsFile);
        }
        if self.dirs.contains(&full) || self.dirs.contains(&base) {
            return Some(KindClaim::AsDirectory);
        }
        None
    }
}

/// How one conflict was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Forced(KindClaim),
    Answered(KindClaim),
    Defaulted(KindClaim),
}

/// One file-versus-directory conflict and its outcome.
#[derive(Debug, Clone)]
pub struct ConflictRecord {
    pub path: PathKey,
    pub resolution: Resolution,
    pub resolved_kind: NodeKind,
}

/// Conflict-free plan ready for materialization.
#[derive(Debug, Default)]
pub struct Reconciled {
    /// Every path to create, kinds settled.
    pub tree: Tree,
    /// File contents keyed by path, in path order.
    pub contents: BTreeMap<String, String>,
    /// Blocks with no destination after reconciliation.
    pub unassigned: Vec<ContentBlock>,
    pub conflicts: Vec<ConflictRecord>,
    pub issues: Vec<String>,
}

impl Reconciled {
    pub fn content_for(&self, path: &PathKey) -> Option<&str> {
        self.contents.get(path.as_str()).map(String::as_str)
    }
}

/// Exported documents name the source folder as the tree root while their
/// content headings are relative to it. When the tree has a single
/// directory root that no block references, the root is a label, not a
/// path, and the subtree shifts up one level.
fn strip_wrapper_root(tree: &mut Tree, blocks: &[ContentBlock]) {
    let root = {
        let roots = tree.roots();
        if roots.len() != 1 || roots[0].kind != NodeKind::Directory {
            return;
        }
        roots[0].path.clone()
    };
    let assigned: Vec<&PathKey> = blocks.iter().filter_map(|b| b.path_hint.as_ref()).collect();
    if assigned.is_empty() {
        return;
    }
    let prefix = format!("{}/", root.as_str());
    let references_root = assigned
        .iter()
        .any(|p| p.as_str() == root.as_str() || p.as_str().starts_with(&prefix));
    if references_root {
        return;
    }
    // only shift when the shifted tree actually lines up with the content
    let lines_up = assigned.iter().any(|p| {
        root.join(p.as_str())
            .map(|full| tree.contains(&full))
            .unwrap_or(false)
    });
    if !lines_up {
        return;
    }
    debug!(root = %root, "single tree root treated as a label");
    tree.strip_root(&root);
}

/// Reconcile the parsed tree and block map into a single plan.
pub fn reconcile(
    parsed: ParsedTree,
    blocks: BlockMap,
    force: &ForceLists,
    resolver: &mut dyn ConflictResolver,
) -> Reconciled {
    let mut out = Reconciled {
        tree: parsed.tree,
        ..Reconciled::default()
    };
    out.issues.extend(parsed.issues);
    out.issues.extend(blocks.issues);

    strip_wrapper_root(&mut out.tree, &blocks.blocks);

    // content blocks claim their paths as files
    let mut assigned: Vec<ContentBlock> = Vec::new();
    for block in blocks.blocks {
        match &block.path_hint {
            Some(path) => {
                let origin = match block.source {
                    BlockSource::Heading => NodeOrigin::Heading,
                    BlockSource::Hint => NodeOrigin::Hint,
                    BlockSource::Unassigned => NodeOrigin::Inferred,
                };
                out.tree.ensure_parents(path, NodeOrigin::Inferred);
                out.tree.claim(path.clone(), NodeKind::File, origin);
                assigned.push(block);
            }
            None => out.unassigned.push(block),
        }
    }

    // settle every path claimed both ways
    let conflicted: Vec<PathKey> = out
        .tree
        .iter()
        .filter(|n| n.is_conflicted())
        .map(|n| n.path.clone())
        .collect();

    let mut dropped_files: HashSet<String> = HashSet::new();
    for path in conflicted {
        let (resolution, kind) = match force.lookup(&path) {
            Some(claim) => (Resolution::Forced(claim), claim.as_kind()),
            None => match resolver.resolve(&path) {
                Some(claim) => (Resolution::Answered(claim), claim.as_kind()),
                None => {
                    // a childless declaration has nothing to lose as a file
                    let claim = if out.tree.descendants(&path).is_empty() {
                        KindClaim::AsFile
                    } else {
                        KindClaim::AsDirectory
                    };
                    out.issues.push(format!(
                        "'{}' claimed as both file and directory, defaulting to {}",
                        path,
                        match claim {
                            KindClaim::AsFile => "file",
                            KindClaim::AsDirectory => "directory",
                        }
                    ));
                    (Resolution::Defaulted(claim), claim.as_kind())
                }
            },
        };

        match kind {
            NodeKind::Directory => {
                // any content aimed at this path has nowhere to go
                dropped_files.insert(path.as_str().to_string());
            }
            NodeKind::File => {
                let descendants = out.tree.descendants(&path);
                if !descendants.is_empty() {
                    out.issues.push(format!(
                        "'{}' resolved as file, dropping {} nested declaration(s)",
                        path,
                        descendants.len()
                    ));
                    for child in &descendants {
                        dropped_files.insert(child.as_str().to_string());
                    }
                    out.tree.remove_subtree(&path);
                    out.tree.claim(path.clone(), NodeKind::File, NodeOrigin::Heading);
                }
            }
            NodeKind::Unknown => {}
        }

        if let Some(node) = out.tree.get_mut(&path) {
            node.kind = kind;
            node.claims = vec![match kind {
                NodeKind::File => KindClaim::AsFile,
                _ => KindClaim::AsDirectory,
            }];
        }
        info!(path = %path, kind = ?kind, "conflict resolved");
        out.conflicts.push(ConflictRecord {
            path,
            resolution,
            resolved_kind: kind,
        });
    }

    // attach content, routing displaced blocks to the holding area
    for block in assigned {
        let path = match &block.path_hint {
            Some(p) => p.clone(),
            None => continue,
        };
        let is_file_dest = out
            .tree
            .get(&path)
            .map(|n| n.kind == NodeKind::File)
            .unwrap_or(false);
        if !is_file_dest || dropped_files.contains(path.as_str()) {
            warn!(path = %path, "block destination resolved away, holding content");
            out.issues.push(format!(
                "content for '{}' moved to the unassigned area",
                path
            ));
            out.unassigned.push(block);
            continue;
        }
        match out.contents.get_mut(path.as_str()) {
            Some(existing) => {
                out.issues
                    .push(format!("'{}' had multiple code blocks merged", path));
                existing.push_str(&block.raw_text);
            }
            None => {
                out.contents
                    .insert(path.as_str().to_string(), block.raw_text);
            }
        }
    }

    out
}
