// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.
//
// Settings are grouped into three sections mirroring the JSON file layout:
//
// ```json
// {
//   "ocr":        { "language": "chi_sim+eng", "dpi": 300, "confidence_threshold": 60 },
//   "output":     { "preserve_formatting": true, "output_directory": "./output" },
//   "processing": { "max_workers": 4 }
// }
// ```
//
// Every field has a default, so a partial file only overrides what it names.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PageliftError, Result};

/// Default config file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "pagelift.json";

/// Top-level persistent settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ocr: OcrSettings,
    pub output: OutputSettings,
    pub processing: ProcessingSettings,
}

/// Recognition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// `+`-joined Tesseract language codes.
    pub language: String,
    /// Rasterization resolution.
    pub dpi: u32,
    /// Pages (and layout tokens) below this confidence are flagged/dropped.
    pub confidence_threshold: u32,
    /// Optional `tessedit_char_whitelist`. Ignored for CJK languages.
    pub char_whitelist: Option<String>,
    /// Language pack directory exported to tesseract as `TESSDATA_PREFIX`.
    /// Unset leaves the engine's own lookup in place.
    pub tessdata_dir: Option<PathBuf>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            language: "chi_sim+eng".to_string(),
            dpi: 300,
            confidence_threshold: 60,
            char_whitelist: None,
            tessdata_dir: None,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Merge lines into paragraphs and keep headings separate.
    pub preserve_formatting: bool,
    /// Directory for generated text, reports, and page images.
    pub output_directory: PathBuf,
    /// Write a `_report.txt` next to the text output.
    pub write_report: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            preserve_formatting: true,
            output_directory: PathBuf::from("./output"),
            write_report: true,
        }
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingSettings {
    /// Upper bound on concurrently recognised pages.
    pub max_workers: usize,
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self { max_workers: 4 }
    }
}

impl AppConfig {
    /// Parse a JSON document, filling unspecified fields with defaults.
    pub fn from_json_str(data: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(data)
            .map_err(|err| PageliftError::Config(format!("invalid config JSON: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load settings from `path`.
    ///
    /// A missing file yields the defaults silently; an unreadable or malformed
    /// file yields the defaults with a warning. Loading never aborts a run.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Self::default();
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "config file unreadable, using defaults");
                return Self::default();
            }
        };

        match Self::from_json_str(&data) {
            Ok(config) => {
                debug!(path = %path.display(), "config loaded");
                config
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "config file rejected, using defaults");
                Self::default()
            }
        }
    }

    /// Write the settings as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.ocr.language.trim().is_empty() {
            return Err(PageliftError::Config("ocr.language must not be empty".into()));
        }
        if self.ocr.dpi == 0 {
            return Err(PageliftError::Config("ocr.dpi must be positive".into()));
        }
        if self.ocr.confidence_threshold > 100 {
            return Err(PageliftError::Config(format!(
                "ocr.confidence_threshold must be within 0-100, got {}",
                self.ocr.confidence_threshold
            )));
        }
        if self.processing.max_workers == 0 {
            return Err(PageliftError::Config(
                "processing.max_workers must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
