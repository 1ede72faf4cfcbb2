//! Fence Codec
//!
//! Bijective escaping of nested triple-backtick fences. A content block may
//! itself contain fence delimiters; storing it inside the outer document
//! would corrupt the fence structure unless those lines are escaped. The
//! codec operates on structural position (start of line, contiguous
//! backtick run), not substring search, so `decode(encode(x)) == x` holds
//! for every string.
//!
//! Encoding prepends one backslash to any line that, ignoring an existing
//! run of leading backslashes, begins with three or more backticks.
//! Decoding strips exactly one leading backslash from such lines. Content
//! that already begins with backslash-plus-delimiter is thereby pushed one
//! escape level deeper, which keeps the transform invertible.

/// Minimum backtick run that forms a fence delimiter.
const FENCE_RUN: usize = 3;

fn leading_backslashes(line: &str) -> usize {
    line.bytes().take_while(|&b| b == b'\\').count()
}

fn is_fence_after_escapes(line: &str) -> bool {
    let rest = &line[leading_backslashes(line)..];
    rest.bytes().take_while(|&b| b == b'`').count() >= FENCE_RUN
}

/// Escape fence-like lines so the text can be embedded in a fenced block.
pub fn encode(raw: &str) -> String {
    map_lines(raw, |line| {
        if is_fence_after_escapes(line) {
            let mut out = String::with_capacity(line.len() + 1);
            out.push('\\');
            out.push_str(line);
            out
        } else {
            line.to_string()
        }
    })
}

/// Inverse of [`encode`]: strip exactly one escape level.
pub fn decode(escaped: &str) -> String {
    map_lines(escaped, |line| {
        if leading_backslashes(line) > 0 && is_fence_after_escapes(line) {
            line[1..].to_string()
        } else {
            line.to_string()
        }
    })
}

/// True if the text contains a line the outer document grammar would read
/// as a fence delimiter.
pub fn contains_bare_fence(text: &str) -> bool {
    text.split('\n')
        .any(|line| line.bytes().take_while(|&b| b == b'`').count() >= FENCE_RUN)
}

fn map_lines(text: &str, f: impl Fn(&str) -> String) -> String {
    // split('\n') keeps empty trailing segments, so newline structure is
    // reproduced exactly on join.
    text.split('\n').map(f).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn escapes_fence_lines_only() {
        let raw = "fn main() {}\n```rust\nlet x = 1;\n```";
        let enc = encode(raw);
        assert_eq!(enc, "fn main() {}\n\\```rust\nlet x = 1;\n\\```");
        assert_eq!(decode(&enc), raw);
    }

    #[test]
    fn deeper_escape_level_for_already_escaped_content() {
        let raw = "\\```";
        let enc = encode(raw);
        assert_eq!(enc, "\\\\```");
        assert_eq!(decode(&enc), raw);
    }

    #[test]
    fn backticks_mid_line_untouched() {
        let raw = "use `code` spans and ``double`` ticks";
        assert_eq!(encode(raw), raw);
        assert_eq!(decode(raw), raw);
    }

    #[test]
    fn short_runs_untouched() {
        assert_eq!(encode("``"), "``");
        assert_eq!(encode("`` `"), "`` `");
    }

    #[test]
    fn longer_runs_and_language_tags_escape() {
        let raw = "````\n```python";
        let enc = encode(raw);
        assert_eq!(enc, "\\````\n\\```python");
        assert_eq!(decode(&enc), raw);
    }

    #[test]
    fn encode_output_has_no_bare_fence_line() {
        let raw = "```\ntext\n````tag\n\\```";
        assert!(!contains_bare_fence(&encode(raw)));
    }

    #[test]
    fn preserves_trailing_newlines() {
        let raw = "a\n\n\n";
        assert_eq!(decode(&encode(raw)), raw);
        assert_eq!(encode(""), "");
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(s in any::<String>()) {
            prop_assert_eq!(decode(&encode(&s)), s);
        }

        #[test]
        fn encoded_text_never_contains_bare_fence(s in any::<String>()) {
            prop_assert!(!contains_bare_fence(&encode(&s)));
        }
    }
}
