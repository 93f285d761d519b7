//! Text normalization for extracted message content.
//!
//! Chat clients decorate message text with rendering noise: icon glyphs from
//! the Unicode private use areas, a trailing clock timestamp on the last
//! line, and blank-line padding between paragraphs. [`normalize`] strips all
//! of that so two extractions of the same logical message compare equal.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Trailing clock timestamp: "3:07", "03:07", "12:45:09".
    static ref TRAILING_CLOCK: Regex = Regex::new(r"\d{1,2}:\d{2}(?::\d{2})?$").unwrap();
}

/// Code points reserved for private use, used by chat clients for injected
/// iconography (read receipts, edited markers, emoji sprites).
fn is_private_use(c: char) -> bool {
    matches!(c,
        '\u{E000}'..='\u{F8FF}'
        | '\u{F0000}'..='\u{FFFFD}'
        | '\u{100000}'..='\u{10FFFD}')
}

/// Canonicalize raw message text.
///
/// - removes private-use-area glyphs;
/// - strips trailing `H:MM` / `H:MM:SS` timestamps from the end of each line
///   (repeatedly, so the result is a fixed point);
/// - trims every line;
/// - collapses runs of 3+ blank lines to exactly one blank line;
/// - trims the whole result.
///
/// Pure and deterministic; `normalize(normalize(x)) == normalize(x)`.
/// Whitespace-only input yields the empty string.
pub fn normalize(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| !is_private_use(*c)).collect();

    let mut lines: Vec<String> = Vec::new();
    for line in cleaned.lines() {
        lines.push(strip_trailing_clock(line.trim()));
    }

    // Collapse runs of 3+ blank lines to a single blank line. Shorter runs
    // are kept as-is; they are legitimate paragraph spacing.
    let mut collapsed: Vec<&str> = Vec::with_capacity(lines.len());
    let mut blank_run = 0usize;
    for line in &lines {
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        match blank_run {
            0 => {}
            1 | 2 => {
                for _ in 0..blank_run {
                    collapsed.push("");
                }
            }
            _ => collapsed.push(""),
        }
        blank_run = 0;
        collapsed.push(line);
    }

    collapsed.join("\n").trim().to_string()
}

/// Strip trailing clock timestamps until the line reaches a fixed point.
/// A single pass is not enough: "sent 10:30 11:45" must not keep "10:30"
/// dangling at the end after the first strip.
fn strip_trailing_clock(line: &str) -> String {
    let mut current = line.to_string();
    loop {
        let stripped = TRAILING_CLOCK.replace(&current, "");
        let trimmed = stripped.trim();
        if trimmed == current {
            return current;
        }
        current = trimmed.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(normalize("hello world"), "hello world");
    }

    #[test]
    fn test_strips_private_use_glyphs() {
        assert_eq!(normalize("hi \u{E00A}\u{E154}"), "hi");
        assert_eq!(normalize("\u{F0001}ok\u{100001}"), "ok");
    }

    #[test]
    fn test_strips_trailing_timestamp() {
        assert_eq!(normalize("hello 12:45"), "hello");
        assert_eq!(normalize("hello 3:07"), "hello");
        assert_eq!(normalize("hello 12:45:09"), "hello");
    }

    #[test]
    fn test_timestamp_mid_line_kept() {
        assert_eq!(normalize("meet at 12:45 tomorrow"), "meet at 12:45 tomorrow");
    }

    #[test]
    fn test_stacked_trailing_timestamps() {
        assert_eq!(normalize("sent 10:30 11:45"), "sent");
    }

    #[test]
    fn test_timestamp_only_line_becomes_empty() {
        assert_eq!(normalize("12:45"), "");
    }

    #[test]
    fn test_collapses_long_blank_runs() {
        assert_eq!(normalize("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(normalize("a\n\n\n\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_short_blank_runs_kept() {
        assert_eq!(normalize("a\n\nb"), "a\n\nb");
        assert_eq!(normalize("a\n\n\nb"), "a\n\n\nb");
    }

    #[test]
    fn test_trims_lines_and_result() {
        assert_eq!(normalize("  hello  \n   world   "), "hello\nworld");
        assert_eq!(normalize("\n\n  hi  \n\n"), "hi");
    }

    #[test]
    fn test_whitespace_only_is_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t\n  "), "");
        assert_eq!(normalize("\u{E00A}\n 4:20\n"), "");
    }

    #[test]
    fn test_telegram_style_bubble() {
        let raw = "\u{E154} Hello there!\n\n\n\n\u{E00A} 14:02";
        assert_eq!(normalize(raw), "Hello there!");
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(raw in "\\PC{0,200}") {
            let once = normalize(&raw);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_idempotent_over_multiline(
            lines in proptest::collection::vec("[a-zA-Z0-9 :\u{E000}-\u{E020}]{0,14}", 0..10)
        ) {
            let raw = lines.join("\n");
            let once = normalize(&raw);
            prop_assert_eq!(normalize(&once), once);
        }

        #[test]
        fn prop_output_has_no_private_use(raw in "\\PC{0,200}") {
            prop_assert!(!normalize(&raw).chars().any(is_private_use));
        }
    }
}
