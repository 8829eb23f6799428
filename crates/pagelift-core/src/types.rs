// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Pagelift OCR pipeline.

use serde::{Deserialize, Serialize};

/// Recognition outcome for a single page.
///
/// Exactly one of these exists per requested page. A page whose recognition
/// failed still gets a result: zeroed counts, confidence 0, and `error` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    /// 1-based position of the page within the processed batch.
    pub page_number: u32,
    /// Whitespace-normalised text.
    pub text: String,
    /// Text exactly as the engine returned it.
    pub raw_text: String,
    /// Average token confidence, 0-100.
    pub confidence: f64,
    /// Effective language tag used (may be a fallback of the requested one).
    pub language: String,
    pub word_count: usize,
    pub char_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecognitionResult {
    /// Build the placeholder result for a page whose recognition failed.
    pub fn failed(page_number: u32, language: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            page_number,
            text: String::new(),
            raw_text: String::new(),
            confidence: 0.0,
            language: language.into(),
            word_count: 0,
            char_count: 0,
            error: Some(error.into()),
        }
    }

    /// Whether recognition failed for this page.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Whether the page falls below the given confidence threshold.
    pub fn is_low_confidence(&self, threshold: u32) -> bool {
        self.confidence < f64::from(threshold)
    }
}

/// One row of positional recognition output.
///
/// Mirrors Tesseract's TSV layout: rows at levels 1-4 (page, block, paragraph,
/// line) carry no text and confidence `-1`; level 5 rows are words.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordToken {
    pub text: String,
    /// 0-100 for recognised words, `-1` for structural rows.
    pub confidence: f32,
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    pub line_index: u32,
    pub block_index: u32,
    #[serde(default)]
    pub paragraph_index: u32,
    #[serde(default = "word_level")]
    pub level: u8,
}

fn word_level() -> u8 {
    WordToken::WORD_LEVEL
}

impl WordToken {
    /// Tesseract TSV level for word rows.
    pub const WORD_LEVEL: u8 = 5;

    /// Confidence value the engine uses for "no result".
    pub const NO_CONFIDENCE: f32 = -1.0;

    /// Whether this row carries a real confidence value.
    pub fn has_confidence(&self) -> bool {
        self.confidence > Self::NO_CONFIDENCE
    }
}

/// Words belonging to one visual line, in left-to-right order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub words: Vec<WordToken>,
}

impl TextLine {
    /// Join the non-blank words with single spaces.
    pub fn text(&self) -> String {
        self.words
            .iter()
            .map(|word| word.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|word| word.text.trim().is_empty())
    }
}

/// Document-level quality metrics, derived from a list of page results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentStatistics {
    pub total_pages: usize,
    pub total_characters: usize,
    pub total_words: usize,
    pub average_confidence: f64,
    /// Pages whose confidence is below the threshold (errors included).
    pub low_confidence_pages: Vec<u32>,
    /// Pages whose recognition failed.
    pub error_pages: Vec<u32>,
    /// Percentage of pages without error, 0-100.
    pub success_rate: f64,
}

/// Round to two decimal places, the precision used for every reported metric.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
