// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout reconstruction — rebuilds reading-order lines from word tokens.

use pagelift_core::{TextLine, WordToken};

/// Group tokens into visual lines.
///
/// Tokens below `threshold` confidence are discarded first (structural rows
/// carry `-1` and never survive). A new line starts whenever `line_index`
/// differs from the previous retained token. Each line is ordered by `left`;
/// lines without any text are dropped.
pub fn group_lines(tokens: &[WordToken], threshold: u32) -> Vec<TextLine> {
    let threshold = threshold as f32;
    let mut lines: Vec<TextLine> = Vec::new();
    let mut current_index: Option<u32> = None;

    for token in tokens.iter().filter(|token| token.confidence >= threshold) {
        if current_index != Some(token.line_index) {
            lines.push(TextLine::default());
            current_index = Some(token.line_index);
        }
        if let Some(line) = lines.last_mut() {
            line.words.push(token.clone());
        }
    }

    for line in &mut lines {
        line.words.sort_by_key(|word| word.left);
    }
    lines.retain(|line| !line.is_empty());
    lines
}

/// Rebuild page text from tokens: one output line per visual line.
pub fn reconstruct(tokens: &[WordToken], threshold: u32) -> String {
    lines_to_text(&group_lines(tokens, threshold))
}

pub fn lines_to_text(lines: &[TextLine]) -> String {
    lines
        .iter()
        .map(TextLine::text)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, confidence: f32, line: u32, left: u32) -> WordToken {
        WordToken {
            text: text.into(),
            confidence,
            left,
            top: line * 40,
            width: 50,
            height: 30,
            line_index: line,
            block_index: 1,
            paragraph_index: 1,
            level: WordToken::WORD_LEVEL,
        }
    }

    #[test]
    fn words_are_ordered_left_to_right() {
        let tokens = vec![
            word("world", 90.0, 1, 200),
            word("Hello", 90.0, 1, 10),
            word("again", 85.0, 2, 10),
        ];
        assert_eq!(reconstruct(&tokens, 60), "Hello world\nagain");
    }

    #[test]
    fn low_confidence_words_are_dropped() {
        let tokens = vec![
            word("keep", 61.0, 1, 0),
            word("noise", 59.9, 1, 80),
            word("edge", 60.0, 1, 160),
        ];
        assert_eq!(reconstruct(&tokens, 60), "keep edge");
    }

    #[test]
    fn lines_left_empty_by_filtering_vanish() {
        let tokens = vec![
            word("top", 90.0, 1, 0),
            word("smudge", 10.0, 2, 0),
            word("bottom", 90.0, 3, 0),
        ];
        let lines = group_lines(&tokens, 60);
        assert_eq!(lines.len(), 2);
        assert_eq!(reconstruct(&tokens, 60), "top\nbottom");
    }

    #[test]
    fn structural_rows_never_survive() {
        let mut structural = word("", -1.0, 1, 0);
        structural.level = 4;
        let tokens = vec![structural, word("text", 70.0, 1, 5)];
        assert_eq!(reconstruct(&tokens, 0), "text");
    }

    #[test]
    fn blank_words_are_skipped_when_joining() {
        let tokens = vec![word("a", 90.0, 1, 0), word("  ", 90.0, 1, 10), word("b", 90.0, 1, 20)];
        assert_eq!(reconstruct(&tokens, 0), "a b");
    }

    #[test]
    fn returning_line_index_starts_a_new_line() {
        // Grouping follows token order, not global line identity.
        let tokens = vec![word("one", 90.0, 1, 0), word("two", 90.0, 2, 0), word("three", 90.0, 1, 50)];
        assert_eq!(group_lines(&tokens, 0).len(), 3);
    }

    #[test]
    fn empty_input_is_empty_text() {
        assert_eq!(reconstruct(&[], 60), "");
    }
}
