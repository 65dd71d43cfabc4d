//! Word wrapping for callout text.
//!
//! Line width is measured as `chars × CHAR_WIDTH_PX` rather than with
//! glyph metrics. The shipped product wrapped this way, and the callout
//! renders with an 8×8 bitmap font whose advance is exactly
//! [`CHAR_WIDTH_PX`], so the approximation is exact for this renderer.
//! Keep the two in lockstep if either ever changes.

use clip_core::constants::CHAR_WIDTH_PX;

/// Greedy word wrap to a pixel width.
///
/// Existing newlines are hard breaks, which makes wrapping idempotent:
/// re-wrapping the joined output with the same width reproduces the same
/// line boundaries. Words longer than a whole line are hard-split.
#[must_use]
pub fn word_wrap(text: &str, max_width_px: u32) -> Vec<String> {
    let max_chars = (max_width_px / CHAR_WIDTH_PX).max(1) as usize;
    let mut lines = Vec::new();

    for raw_line in text.split('\n') {
        let mut current = String::new();
        for word in raw_line.split_whitespace() {
            for piece in split_long_word(word, max_chars) {
                let needed = if current.is_empty() {
                    piece.chars().count()
                } else {
                    current.chars().count() + 1 + piece.chars().count()
                };
                if needed <= max_chars {
                    if !current.is_empty() {
                        current.push(' ');
                    }
                    current.push_str(piece.as_str());
                } else {
                    lines.push(std::mem::take(&mut current));
                    current.push_str(piece.as_str());
                }
            }
        }
        lines.push(current);
    }

    // A trailing empty line only appears for genuinely empty input lines.
    if lines.len() == 1 && lines[0].is_empty() {
        return Vec::new();
    }
    lines
}

/// Pixel width of the widest wrapped line.
#[must_use]
pub fn block_width_px(lines: &[String]) -> u32 {
    let chars = lines
        .iter()
        .map(|line| line.chars().count())
        .max()
        .unwrap_or(0);
    chars as u32 * CHAR_WIDTH_PX
}

fn split_long_word(word: &str, max_chars: usize) -> Vec<String> {
    let count = word.chars().count();
    if count <= max_chars {
        return vec![word.to_owned()];
    }
    let chars: Vec<char> = word.chars().collect();
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // 200 px / 8 px per char = 25 chars per line
    const ANNOTATION_WIDTH: u32 = 200;

    #[test]
    fn short_text_is_one_line() {
        assert_eq!(word_wrap("hello world", ANNOTATION_WIDTH), vec!["hello world"]);
    }

    #[test]
    fn wraps_at_word_boundaries() {
        let lines = word_wrap("Broken layout here on the checkout page", ANNOTATION_WIDTH);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.chars().count() <= 25, "line too long: {line:?}");
        }
        // No word is split across lines
        let rejoined = lines.join(" ");
        assert_eq!(rejoined, "Broken layout here on the checkout page");
    }

    #[test]
    fn empty_text_has_no_lines() {
        assert!(word_wrap("", ANNOTATION_WIDTH).is_empty());
    }

    #[test]
    fn existing_newlines_are_hard_breaks() {
        let lines = word_wrap("one\ntwo", ANNOTATION_WIDTH);
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn long_word_is_hard_split() {
        let word = "a".repeat(60);
        let lines = word_wrap(&word, ANNOTATION_WIDTH);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 25);
        assert_eq!(lines[2].len(), 10);
    }

    #[test]
    fn wrap_is_idempotent_on_simple_text() {
        let first = word_wrap("the quick brown fox jumps over the lazy dog", ANNOTATION_WIDTH);
        let second = word_wrap(&first.join("\n"), ANNOTATION_WIDTH);
        assert_eq!(first, second);
    }

    #[test]
    fn block_width_tracks_longest_line() {
        let lines = vec!["abc".to_owned(), "abcdef".to_owned()];
        assert_eq!(block_width_px(&lines), 48);
        assert_eq!(block_width_px(&[]), 0);
    }

    proptest! {
        #[test]
        fn wrap_idempotent(text in "[ a-zA-Z0-9]{0,200}") {
            let first = word_wrap(&text, ANNOTATION_WIDTH);
            let second = word_wrap(&first.join("\n"), ANNOTATION_WIDTH);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn wrapped_lines_fit(text in "[ a-zA-Z0-9]{0,200}", width in 40u32..400) {
            let max_chars = (width / 8).max(1) as usize;
            for line in word_wrap(&text, width) {
                prop_assert!(line.chars().count() <= max_chars);
            }
        }
    }
}
