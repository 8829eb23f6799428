// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document-level quality metrics.

use pagelift_core::{DocumentStatistics, RecognitionResult, round2};

/// Summarise a list of page results.
///
/// Averages are unweighted across pages and rounded to 2 decimals. A page can
/// be both low-confidence and an error page; the two lists are independent.
pub fn summarize(results: &[RecognitionResult], threshold: u32) -> DocumentStatistics {
    if results.is_empty() {
        return DocumentStatistics::default();
    }

    let total_pages = results.len();
    let confidence_sum: f64 = results.iter().map(|result| result.confidence).sum();
    let error_pages: Vec<u32> = results
        .iter()
        .filter(|result| result.is_error())
        .map(|result| result.page_number)
        .collect();
    let succeeded = total_pages - error_pages.len();

    DocumentStatistics {
        total_pages,
        total_characters: results.iter().map(|result| result.char_count).sum(),
        total_words: results.iter().map(|result| result.word_count).sum(),
        average_confidence: round2(confidence_sum / total_pages as f64),
        low_confidence_pages: results
            .iter()
            .filter(|result| result.is_low_confidence(threshold))
            .map(|result| result.page_number)
            .collect(),
        error_pages,
        success_rate: round2(succeeded as f64 / total_pages as f64 * 100.0),
    }
}
