//! Block Mapper
//!
//! Associates fenced blocks with paths. A heading that names a path claims
//! the blocks that follow it; a block with no heading is rescued through a
//! comment-style hint on its first line; anything left is routed to the
//! unassigned list, never dropped. Heading-derived association takes
//! precedence over hint rescue: a hint line inside a heading-claimed block
//! is ordinary content.

use crate::config;
use crate::document::structure::StructureBlock;
use crate::document::{Document, Event};
use crate::fence;
use crate::tree::Tree;
use crate::types::PathKey;

/// How a block found its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSource {
    Heading,
    Hint,
    Unassigned,
}

/// One fenced content block, decoded, in source order.
#[derive(Debug, Clone)]
pub struct ContentBlock {
    /// Associated path, `None` when unassigned.
    pub path_hint: Option<PathKey>,
    /// Block body. Decoded from the document's escaped form.
    pub raw_text: String,
    /// Fence info string (language tag).
    pub fence_language_tag: String,
    /// How the association was made.
    pub source: BlockSource,
}

/// Mapper output: every fence in the document except the structure block.
#[derive(Debug, Clone, Default)]
pub struct BlockMap {
    pub blocks: Vec<ContentBlock>,
    pub issues: Vec<String>,
}

impl BlockMap {
    pub fn unassigned_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.path_hint.is_none()).count()
    }
}

/// Block mapping options.
#[derive(Debug, Clone, Copy)]
pub struct MapperOptions {
    /// Remove a consumed hint line from the rescued block's content.
    pub strip_hints: bool,
}

impl Default for MapperOptions {
    fn default() -> Self {
        MapperOptions { strip_hints: true }
    }
}

/// True if heading text names a path: it normalizes cleanly and carries a
/// separator, an extension, or a well-known extensionless file name. A bare
/// word also counts when the declared tree already lists it.
fn heading_path(text: &str, declared: Option<&Tree>) -> Option<PathKey> {
    let key = PathKey::new(text).ok()?;
    let pathlike = key.depth() > 1
        || key.extension().is_some()
        || key.basename().starts_with('.')
        || config::is_special_file(key.basename())
        || declared.is_some_and(|t| t.contains(&key));
    pathlike.then_some(key)
}

/// Extract a comment-style path hint from the first line of a block body.
/// Returns the hint path and the byte length of the hint line including
/// its newline.
fn inline_hint(body: &str) -> Option<(PathKey, usize)> {
    let first = body.split('\n').next()?;
    let trimmed = first.trim_start();
    let rest = trimmed
        .strip_prefix("//")
        .or_else(|| trimmed.strip_prefix('#'))?;
    let candidate = rest.trim();
    if candidate.is_empty() || candidate.contains(char::is_whitespace) {
        return None;
    }
    let key = PathKey::new(candidate).ok()?;
    if key.depth() < 2 && key.extension().is_none() && !config::is_special_file(key.basename()) {
        return None;
    }
    let consumed = if body.len() > first.len() {
        first.len() + 1
    } else {
        first.len()
    };
    Some((key, consumed))
}

/// Map every fence in a scanned document to a path claim.
///
/// The structure fence (identified by index among fences) is skipped; its
/// content is the tree, not a file body. All bodies pass through
/// [`fence::decode`] because the document stores content escaped.
pub fn map_blocks(
    doc: &Document,
    structure: Option<&StructureBlock>,
    declared: Option<&Tree>,
    opts: MapperOptions,
) -> BlockMap {
    let mut map = BlockMap::default();
    let skip_index = structure.map(|s| s.fence_index);
    let mut current_path: Option<PathKey> = None;
    let mut fence_index = 0usize;

    for event in &doc.events {
        match event {
            Event::Heading(h) => {
                if crate::document::structure::is_structure_heading(&h.text) {
                    current_path = None;
                } else {
                    current_path = heading_path(&h.text, declared);
                }
            }
            Event::Fence(f) => {
                let index = fence_index;
                fence_index += 1;
                if skip_index == Some(index) {
                    continue;
                }

                let decoded = fence::decode(&f.body);

                if let Some(path) = current_path.clone() {
                    map.blocks.push(ContentBlock {
                        path_hint: Some(path),
                        raw_text: decoded,
                        fence_language_tag: f.info.clone(),
                        source: BlockSource::Heading,
                    });
                    continue;
                }

                if let Some((path, consumed)) = inline_hint(&decoded) {
                    let raw_text = if opts.strip_hints {
                        decoded[consumed..].to_string()
                    } else {
                        decoded.clone()
                    };
                    map.issues.push(format!(
                        "rescued block at line {} via inline hint '{}'",
                        f.line, path
                    ));
                    map.blocks.push(ContentBlock {
                        path_hint: Some(path),
                        raw_text,
                        fence_language_tag: f.info.clone(),
                        source: BlockSource::Hint,
                    });
                    continue;
                }

                map.issues.push(format!(
                    "unassigned block at line {} (no heading or hint)",
                    f.line
                ));
                map.blocks.push(ContentBlock {
                    path_hint: None,
                    raw_text: decoded,
                    fence_language_tag: f.info.clone(),
                    source: BlockSource::Unassigned,
                });
            }
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::scan;
    use crate::document::structure::extract_structure_block;

    fn map_doc(text: &str, opts: MapperOptions) -> BlockMap {
        let doc = scan(text);
        let structure = extract_structure_block(&doc).ok();
        map_blocks(&doc, structure.as_ref(), None, opts)
    }

    #[test]
    fn heading_claims_following_block() {
        let map = map_doc(
            "## src/main.rs\n```rust\nfn main() {}\n```\n",
            MapperOptions::default(),
        );
        assert_eq!(map.blocks.len(), 1);
        let b = &map.blocks[0];
        assert_eq!(b.path_hint.as_ref().unwrap().as_str(), "src/main.rs");
        assert_eq!(b.source, BlockSource::Heading);
        assert_eq!(b.raw_text, "fn main() {}\n");
    }

    #[test]
    fn structure_fence_is_skipped() {
        let map = map_doc(
            "## File Structure\n```text\nsrc/\n└── main.rs\n```\n## src/main.rs\n```rust\nx\n```\n",
            MapperOptions::default(),
        );
        assert_eq!(map.blocks.len(), 1);
        assert_eq!(
            map.blocks[0].path_hint.as_ref().unwrap().as_str(),
            "src/main.rs"
        );
    }

    #[test]
    fn hint_rescue_strips_hint_line() {
        let map = map_doc(
            "# Doc\n```python\n# a/b.py\nprint(1)\n```\n",
            MapperOptions::default(),
        );
        assert_eq!(map.blocks.len(), 1);
        let b = &map.blocks[0];
        assert_eq!(b.path_hint.as_ref().unwrap().as_str(), "a/b.py");
        assert_eq!(b.source, BlockSource::Hint);
        assert_eq!(b.raw_text, "print(1)\n");
        assert_eq!(map.issues.len(), 1);
    }

    #[test]
    fn hint_kept_when_stripping_disabled() {
        let map = map_doc(
            "# Doc\n```js\n// lib/util.js\nlet x;\n```\n",
            MapperOptions { strip_hints: false },
        );
        assert_eq!(map.blocks[0].raw_text, "// lib/util.js\nlet x;\n");
        assert_eq!(
            map.blocks[0].path_hint.as_ref().unwrap().as_str(),
            "lib/util.js"
        );
    }

    #[test]
    fn heading_wins_over_inline_hint() {
        let map = map_doc(
            "## src/app.py\n```python\n# other/place.py\ncode\n```\n",
            MapperOptions { strip_hints: false },
        );
        let b = &map.blocks[0];
        assert_eq!(b.path_hint.as_ref().unwrap().as_str(), "src/app.py");
        assert_eq!(b.source, BlockSource::Heading);
        assert_eq!(b.raw_text, "# other/place.py\ncode\n");
    }

    #[test]
    fn unheaded_unhinted_block_goes_unassigned() {
        let map = map_doc("# Doc\n```\njust text\n```\n", MapperOptions::default());
        assert_eq!(map.unassigned_count(), 1);
        assert_eq!(map.blocks[0].raw_text, "just text\n");
        assert_eq!(map.blocks[0].source, BlockSource::Unassigned);
    }

    #[test]
    fn non_path_heading_does_not_claim() {
        let map = map_doc(
            "## Installation\n```sh\nmake install\n```\n",
            MapperOptions::default(),
        );
        assert_eq!(map.unassigned_count(), 1);
    }

    #[test]
    fn bare_heading_claims_when_the_tree_declares_it() {
        use crate::types::{NodeKind, NodeOrigin};
        let mut tree = Tree::new();
        tree.claim(
            PathKey::new("data").unwrap(),
            NodeKind::Directory,
            NodeOrigin::AsciiTree,
        );
        let doc = scan("## data\n```\npayload\n```\n");
        let map = map_blocks(&doc, None, Some(&tree), MapperOptions::default());
        assert_eq!(map.blocks[0].path_hint.as_ref().unwrap().as_str(), "data");
    }

    #[test]
    fn escaped_body_is_decoded() {
        let map = map_doc(
            "## notes.md\n```markdown\n\\```rust\ncode\n\\```\n```\n",
            MapperOptions::default(),
        );
        assert_eq!(map.blocks[0].raw_text, "```rust\ncode\n```\n");
    }

    #[test]
    fn block_counts_sum_to_total_fences() {
        let text = "## a.txt\n```\n1\n```\n```\nno home\n```\n```rust\n// src/lib.rs\n2\n```\n";
        let doc = scan(text);
        let map = map_blocks(&doc, None, None, MapperOptions::default());
        assert_eq!(map.blocks.len(), doc.fence_count());
        let assigned = map.blocks.iter().filter(|b| b.path_hint.is_some()).count();
        assert_eq!(assigned + map.unassigned_count(), doc.fence_count());
    }
}
