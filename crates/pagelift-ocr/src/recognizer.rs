// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-page recognition.
//
// `Recognizer` resolves the effective language, runs the engine for text and
// for word data, and condenses both into a `RecognitionResult`.

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use image::DynamicImage;
use pagelift_core::error::{PageliftError, Result};
use pagelift_core::{RecognitionResult, TextLine, WordToken, round2};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::engine::{RecognitionEngine, RecognitionMode};
use crate::language::{DEFAULT_LANGUAGE, LanguageChoice, LanguageSource, resolve_language};
use crate::layout::{group_lines, lines_to_text};

/// Pages averaging below this confidence are logged as warnings.
pub const LOW_CONFIDENCE_WARNING: f64 = 50.0;

/// Layout-preserving recognition output for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutPage {
    pub page_number: u32,
    /// Reconstructed text, one line per visual line.
    pub text: String,
    /// Engine text for the same pass.
    pub raw_text: String,
    /// Lines that survived confidence filtering.
    pub lines: Vec<TextLine>,
    pub language: String,
    /// Average confidence over all tokens, before filtering.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LayoutPage {
    pub fn failed(page_number: u32, language: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            page_number,
            text: String::new(),
            raw_text: String::new(),
            lines: Vec::new(),
            language: language.into(),
            confidence: 0.0,
            error: Some(error.into()),
        }
    }

    /// Flatten into a per-page result. Line breaks in `text` are kept so the
    /// formatter can still see line structure.
    pub fn to_result(&self) -> RecognitionResult {
        RecognitionResult {
            page_number: self.page_number,
            text: self.text.clone(),
            raw_text: self.raw_text.clone(),
            confidence: self.confidence,
            language: self.language.clone(),
            word_count: self.text.split_whitespace().count(),
            char_count: self.text.chars().count(),
            error: self.error.clone(),
        }
    }
}

/// Collapse every whitespace run to one space and trim. Idempotent.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Mean confidence of tokens that carry one (`> -1`, zeros included),
/// rounded to 2 decimals. No such tokens gives 0.
pub fn average_confidence(tokens: &[WordToken]) -> f64 {
    let (sum, count) = tokens
        .iter()
        .filter(|token| token.has_confidence())
        .fold((0.0f64, 0usize), |(sum, count), token| {
            (sum + f64::from(token.confidence), count + 1)
        });
    if count == 0 {
        0.0
    } else {
        round2(sum / count as f64)
    }
}

/// Recognises single pages through a shared [`RecognitionEngine`].
pub struct Recognizer {
    engine: Arc<dyn RecognitionEngine>,
    mode: RecognitionMode,
    /// Installed languages, queried on first use. `None` if the query failed.
    available: OnceLock<Option<BTreeSet<String>>>,
}

impl Recognizer {
    pub fn new(engine: Arc<dyn RecognitionEngine>) -> Self {
        Self {
            engine,
            mode: RecognitionMode::default(),
            available: OnceLock::new(),
        }
    }

    pub fn with_mode(mut self, mode: RecognitionMode) -> Self {
        self.mode = mode;
        self
    }

    fn available_languages(&self) -> Option<&BTreeSet<String>> {
        self.available
            .get_or_init(|| match self.engine.available_languages() {
                Ok(languages) => Some(languages),
                Err(err) => {
                    warn!(%err, "could not list installed languages, using requests as given");
                    None
                }
            })
            .as_ref()
    }

    /// Resolve `requested` against the installed language packs.
    pub fn choose_language(&self, requested: &str) -> LanguageChoice {
        let Some(available) = self.available_languages() else {
            let tag = requested.trim();
            return LanguageChoice {
                tag: if tag.is_empty() { DEFAULT_LANGUAGE } else { tag }.to_string(),
                source: LanguageSource::Requested,
                missing: Vec::new(),
            };
        };

        let choice = resolve_language(requested, available);
        if choice.is_fallback() {
            warn!(
                requested,
                effective = %choice.tag,
                missing = ?choice.missing,
                "language pack unavailable, falling back"
            );
        }
        choice
    }

    /// Recognise one page.
    ///
    /// The engine is called twice (plain text, then word data) with the same
    /// effective language and mode. Any engine failure is reported as
    /// [`PageliftError::Recognition`].
    #[instrument(skip(self, image), fields(page = page_number, width = image.width(), height = image.height()))]
    pub fn recognize(
        &self,
        page_number: u32,
        image: &DynamicImage,
        language: &str,
    ) -> Result<RecognitionResult> {
        let choice = self.choose_language(language);
        let mode = self.mode.for_language(&choice.tag);

        let raw_text = self
            .engine
            .extract_text(image, &choice.tag, &mode)
            .map_err(as_recognition_error)?;
        let tokens = self
            .engine
            .extract_tokens(image, &choice.tag, &mode)
            .map_err(as_recognition_error)?;

        let confidence = average_confidence(&tokens.tokens);
        if confidence < LOW_CONFIDENCE_WARNING {
            warn!(confidence, language = %choice.tag, "low recognition confidence");
            debug!(preview = %raw_text.chars().take(100).collect::<String>(), "raw text");
        }

        let text = clean_text(&raw_text);
        debug!(confidence, chars = text.chars().count(), "page recognised");

        Ok(RecognitionResult {
            page_number,
            word_count: text.split_whitespace().count(),
            char_count: text.chars().count(),
            text,
            raw_text,
            confidence,
            language: choice.tag,
            error: None,
        })
    }

    /// Recognise one page keeping its line layout.
    ///
    /// Words below `threshold` confidence are dropped before lines are
    /// rebuilt; the reported confidence still covers every token.
    #[instrument(skip(self, image), fields(page = page_number))]
    pub fn recognize_layout(
        &self,
        page_number: u32,
        image: &DynamicImage,
        language: &str,
        threshold: u32,
    ) -> Result<LayoutPage> {
        let choice = self.choose_language(language);
        let mode = self.mode.for_language(&choice.tag);

        let page = self
            .engine
            .extract_tokens(image, &choice.tag, &mode)
            .map_err(as_recognition_error)?;

        let lines = group_lines(&page.tokens, threshold);
        debug!(lines = lines.len(), "layout rebuilt");

        Ok(LayoutPage {
            page_number,
            text: lines_to_text(&lines),
            raw_text: page.text,
            lines,
            language: choice.tag,
            confidence: average_confidence(&page.tokens),
            error: None,
        })
    }
}

fn as_recognition_error(err: PageliftError) -> PageliftError {
    match err {
        PageliftError::Recognition(_) => err,
        other => PageliftError::Recognition(other.to_string()),
    }
}
