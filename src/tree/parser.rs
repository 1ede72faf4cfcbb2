//! ASCII tree parser
//!
//! Turns the structure block's box-drawing diagram into declared nodes.
//! Depth comes from visual indentation in four-column steps, so both glyph
//! prefixes (`├── `, `│   └── `) and plain-space indentation parse the same
//! way. The parser never fails on malformed indentation; it clamps and
//! records an issue instead.

use crate::error::Error;
use crate::tree::Tree;
use crate::types::{NodeKind, NodeOrigin, PathKey};

/// Parser output: the declared tree plus non-fatal diagnostics.
#[derive(Debug, Clone, Default)]
pub struct ParsedTree {
    pub tree: Tree,
    pub issues: Vec<String>,
}

const GLYPHS: [char; 5] = ['│', '├', '└', '─', ' '];

/// Split a line into its visual indent width and the node name.
fn split_indent(line: &str) -> (usize, &str) {
    let mut width = 0usize;
    let mut name_start = 0usize;
    for (idx, ch) in line.char_indices() {
        if GLYPHS.contains(&ch) {
            width += 1;
            name_start = idx + ch.len_utf8();
        } else {
            break;
        }
    }
    (width, line[name_start..].trim())
}

/// Strip an inline comment from a node name. Comments start at the first
/// ` #`, ` //`, or ` -- ` after the name.
fn strip_comment(name: &str) -> &str {
    let mut cut = name.len();
    for marker in [" #", " //", " -- "] {
        if let Some(idx) = name.find(marker) {
            cut = cut.min(idx);
        }
    }
    name[..cut].trim_end()
}

/// Parse the structure block body into a [`Tree`].
///
/// Every line declares one node. A trailing `/` claims a directory; a name
/// containing `/` declares its intermediate segments as directories. Lines
/// holding only glyphs or comments are skipped, and lines naming an unsafe
/// path are skipped with an issue. Errors only when nothing usable remains.
pub fn parse_tree(text: &str) -> Result<ParsedTree, Error> {
    let mut parsed = ParsedTree::default();
    // stack of (depth, path); every node is a candidate parent
    let mut stack: Vec<(usize, PathKey)> = Vec::new();
    let mut prev_depth: Option<usize> = None;

    for (lineno, raw) in text.split('\n').enumerate() {
        let (width, rest) = split_indent(raw);
        let name = strip_comment(rest);
        if name.is_empty() {
            continue;
        }

        let mut depth = (width + 1) / 4;
        match prev_depth {
            None => {
                if depth > 0 {
                    parsed
                        .issues
                        .push(format!("line {}: first entry indented, treated as root", lineno + 1));
                    depth = 0;
                }
            }
            Some(prev) => {
                if depth > prev + 1 {
                    parsed.issues.push(format!(
                        "line {}: indent jumps {} levels, clamped to one",
                        lineno + 1,
                        depth - prev
                    ));
                    depth = prev + 1;
                }
            }
        }

        while stack.last().is_some_and(|(d, _)| *d >= depth) {
            stack.pop();
        }

        let is_dir = name.ends_with('/');
        let cleaned = name.trim_end_matches('/');
        if cleaned.is_empty() {
            continue;
        }

        let joined = match stack.last() {
            Some((_, parent)) => parent.join(cleaned),
            None => PathKey::new(cleaned),
        };
        let path = match joined {
            Ok(path) => path,
            Err(_) => {
                parsed.issues.push(format!(
                    "line {}: unsafe path '{}' skipped",
                    lineno + 1,
                    cleaned
                ));
                continue;
            }
        };

        // a multi-segment name declares its intermediate directories too
        if path.depth() > stack.last().map_or(0, |(_, p)| p.depth()) + 1 {
            parsed.tree.ensure_parents(&path, NodeOrigin::AsciiTree);
        }

        let kind = if is_dir { NodeKind::Directory } else { NodeKind::File };
        parsed.tree.claim(path.clone(), kind, NodeOrigin::AsciiTree);

        stack.push((depth, path));
        prev_depth = Some(depth);
    }

    if parsed.tree.is_empty() {
        return Err(Error::Structural(
            "structure block declares no usable entries".to_string(),
        ));
    }

    // slash-less names that turned out to hold children are directories
    let reclassify: Vec<PathKey> = parsed
        .tree
        .iter()
        .filter(|n| n.kind == NodeKind::File && parsed.tree.has_children(&n.path))
        .map(|n| n.path.clone())
        .collect();
    for path in reclassify {
        if path.extension().is_some() {
            parsed.issues.push(format!(
                "'{}' looks like a file but has children, treating as directory",
                path
            ));
        }
        if let Some(node) = parsed.tree.get_mut(&path) {
            node.kind = NodeKind::Directory;
        }
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> PathKey {
        PathKey::new(s).unwrap()
    }

    #[test]
    fn glyph_tree_parses_to_nested_paths() {
        let text = "src/\n├── lib.rs\n├── tree/\n│   ├── mod.rs\n│   └── parser.rs\n└── main.rs\n";
        let parsed = parse_tree(text).unwrap();
        assert!(parsed.issues.is_empty());
        assert_eq!(parsed.tree.get(&key("src")).unwrap().kind, NodeKind::Directory);
        assert_eq!(parsed.tree.get(&key("src/lib.rs")).unwrap().kind, NodeKind::File);
        assert_eq!(parsed.tree.get(&key("src/tree")).unwrap().kind, NodeKind::Directory);
        assert_eq!(
            parsed.tree.get(&key("src/tree/parser.rs")).unwrap().kind,
            NodeKind::File
        );
        assert_eq!(parsed.tree.get(&key("src/main.rs")).unwrap().kind, NodeKind::File);
    }

    #[test]
    fn plain_space_indent_parses_like_glyphs() {
        let text = "app/\n    core/\n        engine.py\n    cli.py\n";
        let parsed = parse_tree(text).unwrap();
        assert_eq!(
            parsed.tree.get(&key("app/core/engine.py")).unwrap().kind,
            NodeKind::File
        );
        assert_eq!(parsed.tree.get(&key("app/cli.py")).unwrap().kind, NodeKind::File);
    }

    #[test]
    fn inline_comments_are_stripped() {
        let text = "pkg/\n├── a.rs  # entry point\n├── b.rs  // helper\n└── c.rs -- last one\n";
        let parsed = parse_tree(text).unwrap();
        assert!(parsed.tree.contains(&key("pkg/a.rs")));
        assert!(parsed.tree.contains(&key("pkg/b.rs")));
        assert!(parsed.tree.contains(&key("pkg/c.rs")));
        assert_eq!(parsed.tree.len(), 4);
    }

    #[test]
    fn slashless_parent_reclassified_as_directory() {
        let text = "root\n└── child.txt\n";
        let parsed = parse_tree(text).unwrap();
        assert_eq!(parsed.tree.get(&key("root")).unwrap().kind, NodeKind::Directory);
        assert!(parsed.issues.is_empty());
    }

    #[test]
    fn extensioned_parent_with_children_raises_issue() {
        let text = "data.json\n└── nested.txt\n";
        let parsed = parse_tree(text).unwrap();
        assert_eq!(
            parsed.tree.get(&key("data.json")).unwrap().kind,
            NodeKind::Directory
        );
        assert_eq!(parsed.issues.len(), 1);
        assert!(parsed.issues[0].contains("data.json"));
    }

    #[test]
    fn indent_jump_is_clamped_with_issue() {
        let text = "top/\n        deep.txt\n";
        let parsed = parse_tree(text).unwrap();
        assert!(parsed.tree.contains(&key("top/deep.txt")));
        assert_eq!(parsed.issues.len(), 1);
        assert!(parsed.issues[0].contains("clamped"));
    }

    #[test]
    fn multiple_roots_are_allowed() {
        let text = "README.md\nsrc/\n└── lib.rs\n";
        let parsed = parse_tree(text).unwrap();
        assert!(parsed.tree.contains(&key("README.md")));
        assert!(parsed.tree.contains(&key("src/lib.rs")));
        assert_eq!(parsed.tree.get(&key("README.md")).unwrap().kind, NodeKind::File);
    }

    #[test]
    fn multi_segment_name_declares_parents() {
        let text = "proj/\n└── docs/guide.md\n";
        let parsed = parse_tree(text).unwrap();
        assert_eq!(parsed.tree.get(&key("proj/docs")).unwrap().kind, NodeKind::Directory);
        assert_eq!(
            parsed.tree.get(&key("proj/docs/guide.md")).unwrap().kind,
            NodeKind::File
        );
    }

    #[test]
    fn glyph_only_lines_are_skipped() {
        let text = "a/\n│\n└── b.txt\n";
        let parsed = parse_tree(text).unwrap();
        assert_eq!(parsed.tree.len(), 2);
    }

    #[test]
    fn invalid_path_line_is_skipped_with_issue() {
        let text = "ok/\n└── ../escape.txt\n└── fine.txt\n";
        let parsed = parse_tree(text).unwrap();
        assert!(parsed.tree.contains(&key("ok/fine.txt")));
        assert!(!parsed.tree.iter().any(|n| n.path.as_str().contains("escape")));
        assert_eq!(parsed.issues.len(), 1);
        assert!(parsed.issues[0].contains("unsafe path"));
    }

    #[test]
    fn tree_with_no_usable_entries_fails() {
        assert!(parse_tree("│\n└── ../out\n").is_err());
    }
}
