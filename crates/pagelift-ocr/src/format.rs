// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text formatter — assembles per-page results into the final document text.
//
// With formatting preserved, consecutive lines are merged into paragraphs and
// heading-like lines stand alone. Multi-page documents get page markers;
// low-confidence and unreadable pages are annotated inline.

use std::path::Path;

use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use pagelift_core::error::Result;
use pagelift_core::{AppConfig, RecognitionResult};
use regex::Regex;
use tracing::{info, instrument};

use crate::recognizer::clean_text;

/// Placeholder for a page with no recognised text.
pub const UNRECOGNIZED_PAGE: &str = "[No text could be recognized on this page]\n";

/// Lines shorter than this (in characters) that are fully upper-case count
/// as headings.
const SHORT_HEADING_CHARS: usize = 50;

/// Longest file name produced by [`safe_file_name`], in characters.
const MAX_FILE_NAME_CHARS: usize = 200;

/// Chapter/section markers and numbered headings, e.g. `第三章`, `Chapter 4`,
/// `2.`, `一、`, `（二）`.
static HEADING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)
        ^(?:
            # Chinese chapter / section: 第三章, 第12节
            第[一二三四五六七八九十百千0-9]+[章节]
            |
            # Latin chapter / section / part markers, alone or followed by a
            # capitalised title on the same short line: Chapter IV Results
            (?i:chapter|section|part)\s+(?i:[0-9]+|[ivxlc]+)\b
            (?:\s*[.:\-]?\s*\p{Lu}[^.]{0,40})?$
            |
            # Arabic numbering: 1. 12.
            [0-9]+\.
            |
            # Chinese numbering: 一、
            [一二三四五六七八九十]、
            |
            # Parenthesised numbering: (1) （二）
            [(（][一二三四五六七八九十0-9]+[)）]
        )
        ",
    )
    .expect("static regex")
});

/// How results are rendered to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Merge lines into paragraphs and keep headings separate. When off,
    /// every page is collapsed to a single whitespace-normalised block.
    pub preserve_formatting: bool,
    /// Emit `--- Page N ---` markers for documents with more than one page.
    pub page_markers: bool,
    /// Pages below this confidence get an inline note.
    pub confidence_threshold: u32,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            preserve_formatting: true,
            page_markers: true,
            confidence_threshold: 60,
        }
    }
}

impl FormatOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            preserve_formatting: config.output.preserve_formatting,
            page_markers: true,
            confidence_threshold: config.ocr.confidence_threshold,
        }
    }
}

/// Whether `line` looks like a heading.
pub fn is_heading(line: &str) -> bool {
    let line = line.trim();
    if HEADING_REGEX.is_match(line) {
        return true;
    }
    line.chars().count() < SHORT_HEADING_CHARS
        && line.chars().any(char::is_uppercase)
        && !line.chars().any(char::is_lowercase)
}

/// Format the text of a single page.
pub fn format_page_text(text: &str, preserve_formatting: bool) -> String {
    let text = text.trim();
    if !preserve_formatting {
        return clean_text(text);
    }

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        if is_heading(line) {
            if !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
            paragraphs.push(line.to_string());
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    paragraphs.join("\n\n")
}

/// Assemble all page results into one document.
pub fn format_results(results: &[RecognitionResult], options: &FormatOptions) -> String {
    if results.is_empty() {
        return String::new();
    }

    let markers = options.page_markers && results.len() > 1;
    let mut parts: Vec<String> = Vec::with_capacity(results.len() * 2);

    for result in results {
        if markers {
            parts.push(format!("\n--- Page {} ---\n", result.page_number));
        }

        if result.text.trim().is_empty() {
            parts.push(UNRECOGNIZED_PAGE.to_string());
            continue;
        }

        parts.push(format_page_text(&result.text, options.preserve_formatting));
        if result.is_low_confidence(options.confidence_threshold) {
            parts.push(format!(
                "\n[Note: low recognition confidence on this page ({:.1}%)]\n",
                result.confidence
            ));
        }
    }

    parts.join("\n")
}

// ---------------------------------------------------------------------------
// Output files
// ---------------------------------------------------------------------------

/// Descriptive header written above the extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMetadata {
    pub source: Option<String>,
    pub language: String,
    pub dpi: u32,
}

impl TextMetadata {
    pub fn from_config(source: Option<String>, config: &AppConfig) -> Self {
        Self {
            source,
            language: config.ocr.language.clone(),
            dpi: config.ocr.dpi,
        }
    }

    /// Render the header block for a given generation time.
    pub fn render(&self, generated_at: DateTime<Local>) -> String {
        let mut header = String::from("Pagelift OCR text extraction\n");
        header.push_str(&format!(
            "Generated: {}\n",
            generated_at.format("%Y-%m-%d %H:%M:%S")
        ));
        header.push_str(&format!("Tool version: Pagelift v{}\n", env!("CARGO_PKG_VERSION")));
        if let Some(source) = &self.source {
            header.push_str(&format!("Source: {source}\n"));
        }
        header.push_str(&format!("Recognition language: {}\n", self.language));
        header.push_str(&format!("Recognition DPI: {}", self.dpi));
        header
    }
}

/// Write `text` as UTF-8, optionally preceded by a metadata header and a
/// separator rule. Parent directories are created as needed.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn write_text(
    path: impl AsRef<Path>,
    text: &str,
    metadata: Option<&TextMetadata>,
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let content = match metadata {
        Some(metadata) => format!(
            "{}\n\n{}\n\n{}",
            metadata.render(Local::now()),
            "-".repeat(50),
            text
        ),
        None => text.to_string(),
    };

    std::fs::write(path, content)?;
    info!("Text written");
    Ok(())
}

/// Replace characters that are unsafe in file names and cap the length.
pub fn safe_file_name(name: &str) -> String {
    name.chars()
        .map(|ch| match ch {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .take(MAX_FILE_NAME_CHARS)
        .collect()
}
