//! Text normalization for narration.
//!
//! PDF extraction leaves ragged indentation, stray blank lines, and mixed
//! line endings behind. Everything handed to a speech backend goes through
//! here first so utterances are clean and repeat runs are stable.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse runs of spaces and tabs into one space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

/// Text normalizer for extracted document text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    /// Create a new text normalizer.
    pub fn new() -> Self {
        Self
    }

    /// Normalize extracted text for narration.
    ///
    /// - Composes the text to Unicode NFC
    /// - Normalizes line endings to `\n`
    /// - Collapses runs of spaces/tabs within each line
    /// - Trims each line and drops lines that are empty afterwards
    ///
    /// The result is idempotent: normalizing already-normalized text
    /// returns it unchanged. Line order and non-whitespace content are
    /// never altered.
    pub fn normalize(&self, raw: &str) -> String {
        let composed: String = raw.nfc().collect();
        let unified = composed.replace("\r\n", "\n").replace('\r', "\n");

        unified
            .split('\n')
            .map(|line| {
                let collapsed = WHITESPACE_COLLAPSE_REGEX.replace_all(line, " ");
                collapsed.trim().to_string()
            })
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Normalize text and return the individual non-empty lines.
    pub fn normalize_lines(&self, raw: &str) -> Vec<String> {
        let normalized = self.normalize(raw);
        if normalized.is_empty() {
            return Vec::new();
        }
        normalized.lines().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_interior_whitespace() {
        let normalizer = TextNormalizer::new();

        assert_eq!(normalizer.normalize("Hello    world"), "Hello world");
        assert_eq!(normalizer.normalize("one\ttwo\t\tthree"), "one two three");
    }

    #[test]
    fn test_trim_lines() {
        let normalizer = TextNormalizer::new();

        assert_eq!(normalizer.normalize("  Hello  "), "Hello");
        assert_eq!(normalizer.normalize("\t\tHello\t\t"), "Hello");
        assert_eq!(
            normalizer.normalize("  first line  \n   second line "),
            "first line\nsecond line"
        );
    }

    #[test]
    fn test_drop_empty_lines() {
        let normalizer = TextNormalizer::new();

        assert_eq!(normalizer.normalize("Hello\n\n\nWorld"), "Hello\nWorld");
        assert_eq!(normalizer.normalize("a\n   \n\t\nb"), "a\nb");
    }

    #[test]
    fn test_whitespace_only_input_becomes_empty() {
        let normalizer = TextNormalizer::new();

        assert_eq!(normalizer.normalize(""), "");
        assert_eq!(normalizer.normalize("   \n\t\n   "), "");
    }

    #[test]
    fn test_line_endings_unified() {
        let normalizer = TextNormalizer::new();

        assert_eq!(
            normalizer.normalize("Line one\r\nLine two"),
            "Line one\nLine two"
        );
        assert_eq!(
            normalizer.normalize("Line one\rLine two"),
            "Line one\nLine two"
        );
    }

    #[test]
    fn test_idempotent() {
        let normalizer = TextNormalizer::new();

        let inputs = [
            "  Page   one  \r\n\r\n  Page\ttwo  ",
            "already clean\ntext here",
            "",
            "   \n  ",
        ];
        for input in inputs {
            let once = normalizer.normalize(input);
            let twice = normalizer.normalize(&once);
            assert_eq!(once, twice, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_never_increases_line_count() {
        let normalizer = TextNormalizer::new();

        let inputs = ["a\nb\nc", "a\n\n\nb", "\n\n\n", "single", "a\r\nb\r\nc"];
        for input in inputs {
            let before = input.split('\n').count();
            let after = normalizer.normalize(input).split('\n').count();
            assert!(after <= before, "line count grew for {:?}", input);
        }
    }

    #[test]
    fn test_preserves_line_order_and_content() {
        let normalizer = TextNormalizer::new();

        let input = "zebra\napple\nmango";
        assert_eq!(normalizer.normalize(input), "zebra\napple\nmango");
    }

    #[test]
    fn test_nfc_composition() {
        let normalizer = TextNormalizer::new();

        // "e" + combining acute composes to a single code point.
        let decomposed = "caf\u{0065}\u{0301}";
        assert_eq!(normalizer.normalize(decomposed), "caf\u{00e9}");
        // Already-composed input passes through unchanged.
        assert_eq!(normalizer.normalize("caf\u{00e9}"), "caf\u{00e9}");
    }

    #[test]
    fn test_normalize_lines() {
        let normalizer = TextNormalizer::new();

        let lines = normalizer.normalize_lines("Hello   there\n\nsecond  line\n");
        assert_eq!(lines, vec!["Hello there", "second line"]);

        assert!(normalizer.normalize_lines("   \n ").is_empty());
    }
}
