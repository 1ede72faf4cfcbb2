//! Declared tree model
//!
//! An ordered, path-indexed view of everything the document declares. Nodes
//! arrive from the ASCII tree, from path headings, and from inline hints;
//! parents missing from any source are inferred. Insertion order is
//! preserved so later passes see nodes the way the document presented them.

pub mod parser;

use std::collections::HashMap;

use crate::types::{KindClaim, NodeKind, NodeOrigin, PathKey};

/// A single declared path.
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub path: PathKey,
    pub kind: NodeKind,
    pub origin: NodeOrigin,
    /// Every kind claim made against this path, in declaration order.
    pub claims: Vec<KindClaim>,
}

impl TreeNode {
    /// A node is conflicted when both kinds have been claimed for it.
    pub fn is_conflicted(&self) -> bool {
        self.claims.contains(&KindClaim::AsFile) && self.claims.contains(&KindClaim::AsDirectory)
    }
}

/// Insertion-ordered collection of declared nodes, one per normalized path.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    index: HashMap<String, usize>,
}

impl Tree {
    pub fn new() -> Self {
        Tree::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, path: &PathKey) -> bool {
        self.index.contains_key(path.as_str())
    }

    pub fn get(&self, path: &PathKey) -> Option<&TreeNode> {
        self.index.get(path.as_str()).map(|&i| &self.nodes[i])
    }

    pub fn get_mut(&mut self, path: &PathKey) -> Option<&mut TreeNode> {
        let i = *self.index.get(path.as_str())?;
        Some(&mut self.nodes[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TreeNode> {
        self.nodes.iter_mut()
    }

    /// Record a claim for `path`, creating the node on first sight.
    ///
    /// An existing `Unknown` node adopts the claimed kind; a contradicting
    /// claim is recorded on the node and left for reconciliation.
    pub fn claim(&mut self, path: PathKey, kind: NodeKind, origin: NodeOrigin) {
        let claim = match kind {
            NodeKind::File => Some(KindClaim::AsFile),
            NodeKind::Directory => Some(KindClaim::AsDirectory),
            NodeKind::Unknown => None,
        };
        if let Some(&i) = self.index.get(path.as_str()) {
            let node = &mut self.nodes[i];
            if let Some(c) = claim {
                if !node.claims.contains(&c) {
                    node.claims.push(c);
                }
            }
            if node.kind == NodeKind::Unknown {
                node.kind = kind;
            }
            return;
        }
        let node = TreeNode {
            claims: claim.into_iter().collect(),
            path: path.clone(),
            kind,
            origin,
        };
        self.index.insert(path.as_str().to_string(), self.nodes.len());
        self.nodes.push(node);
    }

    /// Ensure every ancestor of `path` exists as a directory node.
    pub fn ensure_parents(&mut self, path: &PathKey, origin: NodeOrigin) {
        let mut chain = Vec::new();
        let mut cursor = path.parent();
        while let Some(parent) = cursor {
            cursor = parent.parent();
            chain.push(parent);
        }
        for parent in chain.into_iter().rev() {
            self.claim(parent, NodeKind::Directory, origin);
        }
    }

    /// True when any other declared path nests under `path`.
    pub fn has_children(&self, path: &PathKey) -> bool {
        let prefix = format!("{}/", path.as_str());
        self.nodes.iter().any(|n| n.path.as_str().starts_with(&prefix))
    }

    /// Direct and transitive descendants of `path`, in insertion order.
    pub fn descendants(&self, path: &PathKey) -> Vec<PathKey> {
        let prefix = format!("{}/", path.as_str());
        self.nodes
            .iter()
            .filter(|n| n.path.as_str().starts_with(&prefix))
            .map(|n| n.path.clone())
            .collect()
    }

    /// Paths at depth one, in insertion order.
    pub fn roots(&self) -> Vec<&TreeNode> {
        self.nodes.iter().filter(|n| n.path.depth() == 1).collect()
    }

    /// Drop `root` and re-root its subtree one level up. Nodes outside the
    /// subtree are kept as-is.
    pub fn strip_root(&mut self, root: &PathKey) {
        let prefix = format!("{}/", root.as_str());
        let mut nodes = std::mem::take(&mut self.nodes);
        self.index.clear();
        nodes.retain(|n| n.path.as_str() != root.as_str());
        for node in &mut nodes {
            if let Some(stripped) = node.path.as_str().strip_prefix(&prefix) {
                if let Ok(path) = PathKey::new(stripped) {
                    node.path = path;
                }
            }
        }
        for (i, node) in nodes.iter().enumerate() {
            self.index.insert(node.path.as_str().to_string(), i);
        }
        self.nodes = nodes;
    }

    /// Remove `path` and everything beneath it.
    pub fn remove_subtree(&mut self, path: &PathKey) {
        let prefix = format!("{}/", path.as_str());
        self.nodes
            .retain(|n| n.path.as_str() != path.as_str() && !n.path.as_str().starts_with(&prefix));
        self.index.clear();
        for (i, node) in self.nodes.iter().enumerate() {
            self.index.insert(node.path.as_str().to_string(), i);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> PathKey {
        PathKey::new(s).unwrap()
    }

    #[test]
    fn claim_creates_then_merges() {
        let mut tree = Tree::new();
        tree.claim(key("src"), NodeKind::Unknown, NodeOrigin::AsciiTree);
        tree.claim(key("src"), NodeKind::Directory, NodeOrigin::Heading);
        let node = tree.get(&key("src")).unwrap();
        assert_eq!(node.kind, NodeKind::Directory);
        assert_eq!(node.origin, NodeOrigin::AsciiTree);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn contradicting_claims_mark_conflict() {
        let mut tree = Tree::new();
        tree.claim(key("data"), NodeKind::File, NodeOrigin::AsciiTree);
        tree.claim(key("data"), NodeKind::Directory, NodeOrigin::Heading);
        assert!(tree.get(&key("data")).unwrap().is_conflicted());
    }

    #[test]
    fn ensure_parents_infers_directories() {
        let mut tree = Tree::new();
        let leaf = key("a/b/c.txt");
        tree.claim(leaf.clone(), NodeKind::File, NodeOrigin::Heading);
        tree.ensure_parents(&leaf, NodeOrigin::Inferred);
        assert_eq!(tree.get(&key("a")).unwrap().kind, NodeKind::Directory);
        assert_eq!(tree.get(&key("a/b")).unwrap().kind, NodeKind::Directory);
        assert!(tree.has_children(&key("a")));
        assert!(!tree.has_children(&leaf));
    }

    #[test]
    fn remove_subtree_drops_descendants_only() {
        let mut tree = Tree::new();
        for p in ["a", "a/b", "a/b/c.txt", "ab.txt"] {
            tree.claim(key(p), NodeKind::Unknown, NodeOrigin::AsciiTree);
        }
        tree.remove_subtree(&key("a/b"));
        assert!(tree.contains(&key("a")));
        assert!(!tree.contains(&key("a/b")));
        assert!(!tree.contains(&key("a/b/c.txt")));
        assert!(tree.contains(&key("ab.txt")));
    }
}
