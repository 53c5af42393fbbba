//! Post-processing: deterministic cleanup of LLM and vision-OCR output.
//!
//! Models sometimes wrap their answer in a code fence despite the prompt,
//! use `\r\n` line endings, or leak zero-width characters. These rules fix
//! that without touching content.
//!
//! The `separate` cleanup role answers with named blocks split by star lines;
//! [`split_separated_blocks`] turns that into `(name, text)` pairs.

use crate::xyz::coords::match_coordinate_rows;
use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to raw model output.
///
/// Rules (applied in order):
/// 1. Strip an outer code fence (any info string)
/// 2. Normalise line endings (CRLF → LF)
/// 3. Trim trailing whitespace per line
/// 4. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, etc.)
pub fn clean_llm_output(input: &str) -> String {
    let s = strip_outer_fence(input);
    let s = normalise_line_endings(&s);
    let s = trim_trailing_whitespace(&s);
    remove_invisible_chars(&s)
}

// ── Rule 1: Strip outer code fence ───────────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z0-9_-]*\r?\n(.*?)\r?\n```\s*$").unwrap());

fn strip_outer_fence(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCE.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Trim trailing whitespace per line ────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Separated blocks ─────────────────────────────────────────────────────────

/// One block of `separate`-role output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedBlock {
    /// The name line, if the model wrote one.
    pub name: Option<String>,
    /// The block's coordinate lines.
    pub text: String,
}

fn is_star_line(line: &str) -> bool {
    let t = line.trim();
    t.len() >= 3 && t.chars().all(|c| c == '*')
}

/// Split `separate`-role output on star lines.
///
/// The first non-empty line of a block is its name unless it already parses
/// as a coordinate row. Blocks with no text are dropped.
pub fn split_separated_blocks(text: &str) -> Vec<NamedBlock> {
    let mut groups: Vec<Vec<&str>> = vec![Vec::new()];
    for line in text.lines() {
        if is_star_line(line) {
            groups.push(Vec::new());
        } else if let Some(current) = groups.last_mut() {
            current.push(line);
        }
    }

    groups.iter().filter_map(|lines| named_block(lines)).collect()
}

fn named_block(lines: &[&str]) -> Option<NamedBlock> {
    let mut rest = lines.iter().skip_while(|l| l.trim().is_empty()).peekable();
    let first: &str = **rest.peek()?;

    let name = if match_coordinate_rows(first).is_empty() {
        let name = first.trim().trim_matches(['#', ':']).trim();
        rest.next();
        Some(name.to_string()).filter(|n| !n.is_empty())
    } else {
        None
    };

    let text = rest.copied().collect::<Vec<_>>().join("\n");
    if text.trim().is_empty() {
        return None;
    }
    Some(NamedBlock { name, text })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fence_with_info_string() {
        assert_eq!(clean_llm_output("```xyz\nC 1.0 2.0 3.0\n```"), "C 1.0 2.0 3.0");
        assert_eq!(clean_llm_output("```\nH 0.0 0.0 0.0\n```\n"), "H 0.0 0.0 0.0");
    }

    #[test]
    fn test_fence_inside_text_is_kept() {
        let input = "intro\n```\nC 1.0 2.0 3.0\n```";
        assert_eq!(clean_llm_output(input), input);
    }

    #[test]
    fn test_crlf_and_trailing_spaces() {
        assert_eq!(clean_llm_output("C 1.0 2.0 3.0  \r\nH 0.0 0.0 0.0\r\n"), "C 1.0 2.0 3.0\nH 0.0 0.0 0.0");
    }

    #[test]
    fn test_invisible_chars_removed() {
        assert_eq!(clean_llm_output("\u{FEFF}C\u{200B} 1.0 2.0 3.0"), "C 1.0 2.0 3.0");
    }

    #[test]
    fn test_split_separated_blocks() {
        let text = "water\n\
                    O 0.0 0.0 0.1173\n\
                    H 0.0 0.7572 -0.4692\n\
                    *******************\n\
                    ammonia:\n\
                    N 0.0 0.0 0.0\n\
                    *******************\n";
        let blocks = split_separated_blocks(text);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name.as_deref(), Some("water"));
        assert_eq!(blocks[0].text, "O 0.0 0.0 0.1173\nH 0.0 0.7572 -0.4692");
        assert_eq!(blocks[1].name.as_deref(), Some("ammonia"));
    }

    #[test]
    fn test_unnamed_block_keeps_first_row() {
        let blocks = split_separated_blocks("C 1.0 2.0 3.0\nH 0.0 0.0 0.0");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, None);
        assert!(blocks[0].text.starts_with("C 1.0"));
    }

    #[test]
    fn test_empty_blocks_dropped() {
        assert!(split_separated_blocks("***\n\n*****\njust a name\n***").is_empty());
    }
}
