// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition engine seam.
//
// `RecognitionEngine` abstracts the external OCR program. `TesseractCli`
// implements it by writing each page to a scratch PNG and invoking the
// `tesseract` command line, once for plain text and once for TSV word data.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output};

use image::{DynamicImage, ImageFormat};
use pagelift_core::WordToken;
use pagelift_core::config::OcrSettings;
use pagelift_core::error::{PageliftError, Result};
use tracing::{debug, info, instrument};

/// Tesseract LSTM + legacy engine selection.
pub const DEFAULT_ENGINE_MODE: u8 = 3;
/// "Assume a single uniform block of text."
pub const DEFAULT_PAGE_SEGMENTATION: u8 = 6;

/// Language code prefixes for scripts where a character whitelist would
/// discard almost every glyph.
const CJK_PREFIXES: [&str; 3] = ["chi", "jpn", "kor"];

/// Engine parameters shared by every call for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionMode {
    pub engine_mode: u8,
    pub page_segmentation: u8,
    pub char_whitelist: Option<String>,
}

impl Default for RecognitionMode {
    fn default() -> Self {
        Self {
            engine_mode: DEFAULT_ENGINE_MODE,
            page_segmentation: DEFAULT_PAGE_SEGMENTATION,
            char_whitelist: None,
        }
    }
}

impl RecognitionMode {
    pub fn with_whitelist(mut self, whitelist: Option<String>) -> Self {
        self.char_whitelist = whitelist.filter(|chars| !chars.is_empty());
        self
    }

    /// The mode to use for `language`: identical, except that the whitelist
    /// is dropped for CJK languages.
    pub fn for_language(&self, language: &str) -> Self {
        let mut mode = self.clone();
        if is_cjk(language) {
            mode.char_whitelist = None;
        }
        mode
    }

    /// Command-line arguments for this mode.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--oem".to_string(),
            self.engine_mode.to_string(),
            "--psm".to_string(),
            self.page_segmentation.to_string(),
        ];
        if let Some(whitelist) = &self.char_whitelist {
            args.push("-c".to_string());
            args.push(format!("tessedit_char_whitelist={whitelist}"));
        }
        args
    }
}

/// Whether any component of a `+`-joined language tag is a CJK language.
pub fn is_cjk(language: &str) -> bool {
    language
        .split('+')
        .map(|part| part.trim().to_ascii_lowercase())
        .any(|part| CJK_PREFIXES.iter().any(|prefix| part.starts_with(prefix)))
}

/// Positional recognition output for one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenPage {
    /// Every TSV row, structural rows included.
    pub tokens: Vec<WordToken>,
    /// Word rows joined into lines.
    pub text: String,
}

impl TokenPage {
    pub fn from_tokens(tokens: Vec<WordToken>) -> Self {
        let text = tokens_to_text(&tokens);
        Self { tokens, text }
    }
}

/// An external text recogniser.
///
/// Implementations are shared across worker threads and must not keep
/// per-call state.
pub trait RecognitionEngine: Send + Sync {
    /// Language packs the engine can load.
    fn available_languages(&self) -> Result<BTreeSet<String>>;

    /// Recognise `image` and return plain text.
    fn extract_text(&self, image: &DynamicImage, language: &str, mode: &RecognitionMode)
    -> Result<String>;

    /// Recognise `image` and return word-level positional data.
    fn extract_tokens(
        &self,
        image: &DynamicImage,
        language: &str,
        mode: &RecognitionMode,
    ) -> Result<TokenPage>;

    /// Verify the engine can run at all. Fails with
    /// [`PageliftError::Dependency`] when it is not installed.
    fn check(&self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Tesseract command line
// ---------------------------------------------------------------------------

/// [`RecognitionEngine`] that shells out to the `tesseract` binary.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    binary: PathBuf,
    tessdata: Option<PathBuf>,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            tessdata: None,
        }
    }
}

impl TesseractCli {
    /// Use the `tesseract` found on `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            tessdata: None,
        }
    }

    /// Point the engine at a specific `tessdata` directory.
    pub fn with_tessdata(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tessdata = Some(dir.into());
        self
    }

    /// Engine on `PATH`, using the configured language pack directory if any.
    pub fn from_settings(settings: &OcrSettings) -> Self {
        match &settings.tessdata_dir {
            Some(dir) => Self::new().with_tessdata(dir),
            None => Self::new(),
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.binary);
        if let Some(dir) = &self.tessdata {
            command.env("TESSDATA_PREFIX", dir);
        }
        command
    }

    fn spawn(&self, command: &mut Command) -> Result<Output> {
        command.output().map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                PageliftError::Dependency(format!("tesseract ({}): {}", self.binary.display(), err))
            }
            _ => PageliftError::Recognition(format!("failed to run tesseract: {err}")),
        })
    }

    /// Run one recognition pass over `image`, returning stdout.
    fn recognize(
        &self,
        image: &DynamicImage,
        language: &str,
        mode: &RecognitionMode,
        output_config: Option<&str>,
    ) -> Result<String> {
        let mut scratch = tempfile::Builder::new()
            .prefix("pagelift-")
            .suffix(".png")
            .tempfile()?;
        image
            .write_to(&mut scratch, ImageFormat::Png)
            .map_err(|err| PageliftError::Image(format!("failed to encode page: {err}")))?;
        scratch.flush()?;

        let mut command = self.command();
        command
            .arg(scratch.path())
            .arg("stdout")
            .arg("-l")
            .arg(language)
            .args(mode.args());
        if let Some(config) = output_config {
            command.arg(config);
        }

        let output = self.spawn(&mut command)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PageliftError::Recognition(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl RecognitionEngine for TesseractCli {
    #[instrument(skip(self))]
    fn available_languages(&self) -> Result<BTreeSet<String>> {
        let output = self.spawn(self.command().arg("--list-langs"))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PageliftError::Recognition(format!(
                "tesseract --list-langs failed: {}",
                stderr.trim()
            )));
        }
        // Tesseract 3.x prints the list on stderr.
        let listing = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).into_owned()
        } else {
            String::from_utf8_lossy(&output.stdout).into_owned()
        };
        let languages = parse_language_list(&listing);
        info!(count = languages.len(), "Available recognition languages");
        Ok(languages)
    }

    fn extract_text(
        &self,
        image: &DynamicImage,
        language: &str,
        mode: &RecognitionMode,
    ) -> Result<String> {
        self.recognize(image, language, mode, None)
    }

    fn extract_tokens(
        &self,
        image: &DynamicImage,
        language: &str,
        mode: &RecognitionMode,
    ) -> Result<TokenPage> {
        let tsv = self.recognize(image, language, mode, Some("tsv"))?;
        let tokens = parse_tsv(&tsv);
        debug!(rows = tokens.len(), "TSV parsed");
        Ok(TokenPage::from_tokens(tokens))
    }

    fn check(&self) -> Result<()> {
        let output = self.spawn(self.command().arg("--version"))?;
        if !output.status.success() {
            return Err(PageliftError::Dependency(format!(
                "tesseract ({}) is installed but `--version` failed",
                self.binary.display()
            )));
        }
        let banner = String::from_utf8_lossy(&output.stdout);
        info!(version = banner.lines().next().unwrap_or("unknown"), "Tesseract available");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Output parsing
// ---------------------------------------------------------------------------

/// Parse `tesseract --list-langs` output. The first line is a header.
pub fn parse_language_list(listing: &str) -> BTreeSet<String> {
    listing
        .lines()
        .skip_while(|line| !line.trim_end().ends_with(':'))
        .skip(1)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse Tesseract TSV output into tokens.
///
/// Every data row becomes a token. `line_index` is a page-wide line ordinal
/// that changes exactly when the (page, block, paragraph, line) position
/// changes, so two lines from different paragraphs never share an index.
/// Rows with fewer than 11 columns are skipped.
pub fn parse_tsv(tsv: &str) -> Vec<WordToken> {
    let mut tokens = Vec::new();
    let mut last_key: Option<(u32, u32, u32, u32)> = None;
    let mut ordinal = 0u32;

    for row in tsv.lines() {
        if row.starts_with("level") {
            continue;
        }
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 11 {
            continue;
        }
        let num = |idx: usize| cols[idx].trim().parse::<u32>().unwrap_or(0);

        let key = (num(1), num(2), num(3), num(4));
        if last_key != Some(key) {
            ordinal += 1;
            last_key = Some(key);
        }

        tokens.push(WordToken {
            text: cols.get(11).map(|text| text.trim()).unwrap_or_default().to_string(),
            confidence: cols[10].trim().parse().unwrap_or(WordToken::NO_CONFIDENCE),
            left: num(6),
            top: num(7),
            width: num(8),
            height: num(9),
            line_index: ordinal,
            block_index: key.1,
            paragraph_index: key.2,
            level: cols[0].trim().parse().unwrap_or(0),
        });
    }
    tokens
}

/// Join word rows into text, one output line per `line_index`.
fn tokens_to_text(tokens: &[WordToken]) -> String {
    let mut lines: Vec<Vec<&str>> = Vec::new();
    let mut current: Option<u32> = None;
    for token in tokens {
        let text = token.text.trim();
        if token.level != WordToken::WORD_LEVEL || text.is_empty() {
            continue;
        }
        if current != Some(token.line_index) {
            lines.push(Vec::new());
            current = Some(token.line_index);
        }
        if let Some(line) = lines.last_mut() {
            line.push(text);
        }
    }
    lines
        .iter()
        .map(|words| words.join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}
