// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Processing summary report and structured JSON export.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Local};
use pagelift_core::error::Result;
use pagelift_core::{AppConfig, DocumentStatistics, RecognitionResult};
use tracing::{info, instrument};

use crate::stats::summarize;

/// Per-page outcome as shown in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    Normal,
    LowConfidence,
    Error,
}

impl PageStatus {
    /// Classify a page. An error outranks low confidence.
    pub fn of(result: &RecognitionResult, threshold: u32) -> Self {
        if result.is_error() {
            Self::Error
        } else if result.is_low_confidence(threshold) {
            Self::LowConfidence
        } else {
            Self::Normal
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::LowConfidence => "low confidence",
            Self::Error => "error",
        }
    }
}

/// Human-readable summary of one processing run.
pub struct SummaryReport<'a> {
    results: &'a [RecognitionResult],
    statistics: DocumentStatistics,
    config: &'a AppConfig,
    elapsed: Duration,
    generated_at: DateTime<Local>,
}

impl<'a> SummaryReport<'a> {
    pub fn new(results: &'a [RecognitionResult], config: &'a AppConfig, elapsed: Duration) -> Self {
        Self {
            results,
            statistics: summarize(results, config.ocr.confidence_threshold),
            config,
            elapsed,
            generated_at: Local::now(),
        }
    }

    /// Fix the timestamp shown in the report.
    pub fn generated_at(mut self, at: DateTime<Local>) -> Self {
        self.generated_at = at;
        self
    }

    pub fn statistics(&self) -> &DocumentStatistics {
        &self.statistics
    }

    pub fn render(&self) -> String {
        self.to_string()
    }

    /// Render and write the report, creating parent directories.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.render())?;
        info!("Summary report written");
        Ok(())
    }
}

impl fmt::Display for SummaryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = &self.statistics;
        let threshold = self.config.ocr.confidence_threshold;
        let low_pages = if stats.low_confidence_pages.is_empty() {
            "none".to_string()
        } else {
            join_pages(&stats.low_confidence_pages)
        };

        writeln!(f, "Pagelift OCR summary report")?;
        writeln!(f, "{}", "=".repeat(50))?;
        writeln!(f)?;
        writeln!(f, "Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "Processing time: {:.2} s", self.elapsed.as_secs_f64())?;
        writeln!(f)?;

        writeln!(f, "Document statistics:")?;
        writeln!(f, "- Pages: {}", stats.total_pages)?;
        writeln!(f, "- Characters: {}", stats.total_characters)?;
        writeln!(f, "- Words: {}", stats.total_words)?;
        writeln!(f, "- Average confidence: {:.2}%", stats.average_confidence)?;
        writeln!(f, "- Success rate: {:.2}%", stats.success_rate)?;
        writeln!(f)?;

        writeln!(f, "Quality assessment:")?;
        writeln!(f, "- Confidence threshold: {threshold}%")?;
        writeln!(f, "- Low-confidence pages: {}", stats.low_confidence_pages.len())?;
        writeln!(f, "- Low-confidence page numbers: {low_pages}")?;
        if !stats.error_pages.is_empty() {
            writeln!(f, "- Failed pages: {}", join_pages(&stats.error_pages))?;
        }
        writeln!(f)?;

        writeln!(f, "Configuration:")?;
        writeln!(f, "- Language: {}", self.config.ocr.language)?;
        writeln!(f, "- DPI: {}", self.config.ocr.dpi)?;
        writeln!(
            f,
            "- Preserve formatting: {}",
            if self.config.output.preserve_formatting { "yes" } else { "no" }
        )?;
        writeln!(f, "- Workers: {}", self.config.processing.max_workers)?;
        writeln!(f)?;

        writeln!(f, "Pages:")?;
        writeln!(f, "{}", "-".repeat(30))?;
        for result in self.results {
            writeln!(
                f,
                "Page {}: {} characters, {} words, confidence {:.1}% ({})",
                result.page_number,
                result.char_count,
                result.word_count,
                result.confidence,
                PageStatus::of(result, threshold).label()
            )?;
        }
        Ok(())
    }
}

fn join_pages(pages: &[u32]) -> String {
    pages
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Write every page result as pretty-printed JSON.
#[instrument(skip_all, fields(path = %path.as_ref().display(), pages = results.len()))]
pub fn export_json(results: &[RecognitionResult], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(path, json)?;
    info!("Structured results exported");
    Ok(())
}
