// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted in-memory recognition engine for tests. Pages are identified by
// image width, so `page_image(7)` is answered by the script for page 7.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use image::{DynamicImage, GrayImage};
use pagelift_core::WordToken;
use pagelift_core::error::{PageliftError, Result};

use crate::engine::{RecognitionEngine, RecognitionMode, TokenPage};

/// A blank image whose width identifies the scripted page.
pub(crate) fn page_image(id: u32) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::new(id, 1))
}

#[derive(Debug, Clone)]
pub(crate) enum Script {
    Text { raw: String, tokens: Vec<WordToken> },
    Fail(String),
    Panic,
}

/// One word token per whitespace-separated word of `raw`, all on line 1,
/// preceded by a structural line row with confidence -1.
pub(crate) fn text_page(raw: &str, confidences: &[f32]) -> Script {
    let mut tokens = vec![token("", WordToken::NO_CONFIDENCE, 1, 0, 4)];
    for (i, (word, confidence)) in raw.split_whitespace().zip(confidences).enumerate() {
        tokens.push(token(word, *confidence, 1, i as u32 * 100, WordToken::WORD_LEVEL));
    }
    Script::Text {
        raw: raw.to_string(),
        tokens,
    }
}

pub(crate) fn token(text: &str, confidence: f32, line: u32, left: u32, level: u8) -> WordToken {
    WordToken {
        text: text.to_string(),
        confidence,
        left,
        top: line * 40,
        width: 80,
        height: 30,
        line_index: line,
        block_index: 1,
        paragraph_index: 1,
        level,
    }
}

pub(crate) struct ScriptedEngine {
    languages: BTreeSet<String>,
    /// When set, listing languages fails.
    unlisted: bool,
    scripts: HashMap<u32, (Script, Duration)>,
    calls: Mutex<Vec<(String, RecognitionMode)>>,
    language_queries: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedEngine {
    pub(crate) fn new(languages: &[&str]) -> Self {
        Self {
            languages: languages.iter().map(|lang| lang.to_string()).collect(),
            unlisted: false,
            scripts: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            language_queries: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Make `available_languages` fail, as a broken tessdata setup would.
    pub(crate) fn unlisted(mut self) -> Self {
        self.unlisted = true;
        self
    }

    pub(crate) fn page(self, id: u32, script: Script) -> Self {
        self.delayed(id, script, Duration::ZERO)
    }

    pub(crate) fn delayed(mut self, id: u32, script: Script, delay: Duration) -> Self {
        self.scripts.insert(id, (script, delay));
        self
    }

    pub(crate) fn calls(&self) -> Vec<(String, RecognitionMode)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn language_queries(&self) -> usize {
        self.language_queries.load(Ordering::SeqCst)
    }

    pub(crate) fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn run(&self, image: &DynamicImage, language: &str, mode: &RecognitionMode) -> Result<(String, Vec<WordToken>)> {
        self.calls
            .lock()
            .unwrap()
            .push((language.to_string(), mode.clone()));

        let Some((script, delay)) = self.scripts.get(&image.width()) else {
            return Err(PageliftError::Recognition(format!(
                "no script for page {}",
                image.width()
            )));
        };

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(*delay);
        self.active.fetch_sub(1, Ordering::SeqCst);

        match script {
            Script::Text { raw, tokens } => Ok((raw.clone(), tokens.clone())),
            Script::Fail(message) => Err(PageliftError::Recognition(message.clone())),
            Script::Panic => panic!("scripted engine panic on page {}", image.width()),
        }
    }
}

impl RecognitionEngine for ScriptedEngine {
    fn available_languages(&self) -> Result<BTreeSet<String>> {
        self.language_queries.fetch_add(1, Ordering::SeqCst);
        if self.unlisted {
            return Err(PageliftError::Recognition("cannot list languages".into()));
        }
        Ok(self.languages.clone())
    }

    fn extract_text(&self, image: &DynamicImage, language: &str, mode: &RecognitionMode) -> Result<String> {
        self.run(image, language, mode).map(|(raw, _)| raw)
    }

    fn extract_tokens(
        &self,
        image: &DynamicImage,
        language: &str,
        mode: &RecognitionMode,
    ) -> Result<TokenPage> {
        self.run(image, language, mode)
            .map(|(_, tokens)| TokenPage::from_tokens(tokens))
    }

    fn check(&self) -> Result<()> {
        Ok(())
    }
}
