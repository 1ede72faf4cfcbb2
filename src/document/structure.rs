//! Structural heading detection
//!
//! Locates the distinguished heading that introduces the ASCII tree and
//! the fenced block holding it. Detection is heading-first with a
//! tree-shaped-fence fallback, so documents with a misnamed heading still
//! convert.

use crate::document::{Document, Event};
use crate::error::Error;

/// The tree block of a document: its text and the index of the fence event
/// that carried it (so the block mapper can skip it).
#[derive(Debug, Clone)]
pub struct StructureBlock {
    pub text: String,
    pub fence_index: usize,
}

/// True if a heading introduces the file structure tree.
pub fn is_structure_heading(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("structure") && lower.len() < 60
}

/// Count of lines that look like ASCII tree rows.
fn tree_indicator_count(text: &str) -> usize {
    text.lines()
        .take(10)
        .filter(|line| {
            let t = line.trim();
            t.contains('│')
                || t.contains('├')
                || t.contains('└')
                || t.contains("──")
                || (t.ends_with('/') && t.len() > 1)
        })
        .count()
}

/// Find the ASCII tree block.
///
/// First the fence immediately following a structure heading (stopping at
/// the next heading of equal or shallower level); failing that, the first
/// fence whose opening lines look tree-shaped. Returns a structural error
/// when neither is present.
pub fn extract_structure_block(doc: &Document) -> Result<StructureBlock, Error> {
    let mut fence_index = 0usize;
    let mut pending_level: Option<u8> = None;

    for event in &doc.events {
        match event {
            Event::Heading(h) => {
                if is_structure_heading(&h.text) {
                    pending_level = Some(h.level);
                } else if let Some(level) = pending_level {
                    if h.level <= level {
                        pending_level = None;
                    }
                }
            }
            Event::Fence(f) => {
                if pending_level.is_some() {
                    return Ok(StructureBlock {
                        text: f.body.clone(),
                        fence_index,
                    });
                }
                fence_index += 1;
            }
        }
    }

    // Fallback: any fence that looks like a tree.
    let mut fence_index = 0usize;
    for event in &doc.events {
        if let Event::Fence(f) = event {
            if tree_indicator_count(&f.body) >= 2 {
                tracing::warn!(
                    line = f.line,
                    "no structure heading found; using tree-shaped fence"
                );
                return Ok(StructureBlock {
                    text: f.body.clone(),
                    fence_index,
                });
            }
            fence_index += 1;
        }
    }

    Err(Error::Structural(
        "could not find a file structure block in the document".to_string(),
    ))
}
