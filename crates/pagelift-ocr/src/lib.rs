// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagelift-ocr — Text recognition for the Pagelift OCR pipeline.
//
// Wraps an external recognition engine behind `RecognitionEngine`, resolves
// language fallbacks, recognises pages concurrently with per-page failure
// isolation, rebuilds line layout from word data, and turns results into
// text, summary reports, and JSON.

pub mod batch;
pub mod engine;
pub mod format;
pub mod language;
pub mod layout;
pub mod recognizer;
pub mod report;
pub mod stats;

#[cfg(test)]
pub(crate) mod mock;

pub use batch::{BatchRecognizer, ProgressFn};
pub use engine::{RecognitionEngine, RecognitionMode, TesseractCli, TokenPage};
pub use format::{FormatOptions, TextMetadata, format_results, write_text};
pub use language::{LanguageChoice, resolve_language};
pub use layout::{group_lines, reconstruct};
pub use recognizer::{LayoutPage, Recognizer, clean_text};
pub use report::{SummaryReport, export_json};
pub use stats::summarize;
