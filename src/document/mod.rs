//! Document scanning
//!
//! A deterministic line-level scanner for the document grammar: ATX
//! headings and fenced code blocks, in source order. This is deliberately
//! not a full Markdown parser; escaped interior fences and byte-exact
//! block bodies rule out a rendering-oriented parser, and the grammar the
//! round-trip relies on is only headings and fences.

pub mod blocks;
pub mod structure;

/// An ATX heading line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Heading level, 1-6.
    pub level: u8,
    /// Heading text, trimmed.
    pub text: String,
    /// 1-based source line.
    pub line: usize,
}

/// A fenced block, body still in escaped form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenceBlock {
    /// Info string after the opening fence (language tag), trimmed.
    pub info: String,
    /// Body between the fence lines. Always ends with a newline when
    /// non-empty, so byte structure survives a round trip.
    pub body: String,
    /// 1-based source line of the opening fence.
    pub line: usize,
}

/// One structural element of the document, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Heading(Heading),
    Fence(FenceBlock),
}

/// Scanned document: ordered events plus scan-level issues.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub events: Vec<Event>,
    pub issues: Vec<String>,
}

impl Document {
    /// Total number of fenced blocks found.
    pub fn fence_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Fence(_)))
            .count()
    }
}

fn backtick_run(s: &str) -> usize {
    s.bytes().take_while(|&b| b == b'`').count()
}

/// Parse a heading line: one to six `#` followed by a space.
fn parse_heading(line: &str, line_no: usize) -> Option<Heading> {
    let hashes = line.bytes().take_while(|&b| b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with(' ') && !rest.is_empty() {
        return None;
    }
    Some(Heading {
        level: hashes as u8,
        text: rest.trim().to_string(),
        line: line_no,
    })
}

/// Scan document text into an ordered event stream.
///
/// Fence openings tolerate leading whitespace; a closing fence is a line
/// whose trimmed content is a backtick run at least as long as the opening
/// run. An unclosed fence is recovered as a block extending to end of
/// input, with an issue recorded.
pub fn scan(text: &str) -> Document {
    let mut doc = Document::default();
    let lines: Vec<&str> = text.split('\n').collect();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim_start();
        let open_run = backtick_run(trimmed);

        if open_run >= 3 {
            let info = trimmed[open_run..].trim().to_string();
            let open_line = i + 1;
            let mut body_lines: Vec<&str> = Vec::new();
            let mut closed = false;
            i += 1;
            while i < lines.len() {
                // Closing fences must sit at column 0: body lines with
                // indented backtick runs are content, not delimiters.
                let candidate = lines[i].trim_end();
                if backtick_run(candidate) >= open_run
                    && !candidate.is_empty()
                    && candidate.bytes().all(|b| b == b'`')
                {
                    closed = true;
                    i += 1;
                    break;
                }
                body_lines.push(lines[i]);
                i += 1;
            }
            if !closed {
                // Trailing empty segment from the final newline is not body.
                if body_lines.last() == Some(&"") {
                    body_lines.pop();
                }
                doc.issues
                    .push(format!("unclosed fence opened at line {}", open_line));
            }
            let mut body = body_lines.join("\n");
            if !body.is_empty() {
                body.push('\n');
            }
            doc.events.push(Event::Fence(FenceBlock {
                info,
                body,
                line: open_line,
            }));
            continue;
        }

        if let Some(heading) = parse_heading(line, i + 1) {
            if !heading.text.is_empty() {
                doc.events.push(Event::Heading(heading));
            }
        }
        i += 1;
    }

    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_headings_and_fences_in_order() {
        let text = "# Title\n\n## src/main.rs\n```rust\nfn main() {}\n```\n";
        let doc = scan(text);
        assert_eq!(doc.events.len(), 3);
        match &doc.events[0] {
            Event::Heading(h) => {
                assert_eq!(h.level, 1);
                assert_eq!(h.text, "Title");
            }
            other => panic!("expected heading, got {:?}", other),
        }
        match &doc.events[2] {
            Event::Fence(f) => {
                assert_eq!(f.info, "rust");
                assert_eq!(f.body, "fn main() {}\n");
            }
            other => panic!("expected fence, got {:?}", other),
        }
    }

    #[test]
    fn fence_body_preserves_blank_lines() {
        let text = "```\na\n\n\nb\n```\n";
        let doc = scan(text);
        match &doc.events[0] {
            Event::Fence(f) => assert_eq!(f.body, "a\n\n\nb\n"),
            other => panic!("expected fence, got {:?}", other),
        }
    }

    #[test]
    fn escaped_fence_lines_stay_inside_body() {
        let text = "```text\n\\```\ninner\n\\```\n```\n";
        let doc = scan(text);
        assert_eq!(doc.fence_count(), 1);
        match &doc.events[0] {
            Event::Fence(f) => assert_eq!(f.body, "\\```\ninner\n\\```\n"),
            other => panic!("expected fence, got {:?}", other),
        }
    }

    #[test]
    fn longer_closing_run_closes_shorter_open() {
        let text = "```\nbody\n````\nafter\n";
        let doc = scan(text);
        assert_eq!(doc.fence_count(), 1);
        assert!(doc.issues.is_empty());
    }

    #[test]
    fn unclosed_fence_recovers_with_issue() {
        let text = "## a.txt\n```\ndangling\n";
        let doc = scan(text);
        assert_eq!(doc.fence_count(), 1);
        assert_eq!(doc.issues.len(), 1);
        match &doc.events[1] {
            Event::Fence(f) => assert_eq!(f.body, "dangling\n"),
            other => panic!("expected fence, got {:?}", other),
        }
    }

    #[test]
    fn hash_without_space_is_not_a_heading() {
        let doc = scan("#!/bin/sh\n#no space\n");
        assert!(doc.events.is_empty());
    }

    #[test]
    fn empty_fence_has_empty_body() {
        let doc = scan("```\n```\n");
        match &doc.events[0] {
            Event::Fence(f) => assert_eq!(f.body, ""),
            other => panic!("expected fence, got {:?}", other),
        }
    }
}
