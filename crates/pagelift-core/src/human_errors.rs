// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the command line.
//
// Every technical error is mapped to a plain message with a concrete next
// step. Missing external tools get per-platform install instructions.

use crate::error::PageliftError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Retrying the same command may succeed.
    Transient,
    /// The user must change the input or the command line.
    ActionRequired,
    /// The input cannot be processed as-is.
    Permanent,
    /// An external program has to be installed first.
    InstallRequired,
}

/// A human-readable error with plain message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// One-line summary.
    pub message: String,
    /// What the user should try next.
    pub suggestion: String,
    pub severity: Severity,
}

impl std::fmt::Display for HumanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}\n{}", self.message, self.suggestion)
    }
}

const TESSERACT_INSTALL: &str = "Install Tesseract OCR and its language packs:\n  \
    macOS:   brew install tesseract tesseract-lang\n  \
    Ubuntu:  sudo apt-get install tesseract-ocr tesseract-ocr-chi-sim\n  \
    Windows: https://github.com/UB-Mannheim/tesseract/wiki\n\
    Make sure the `tesseract` command is on your PATH.";

const POPPLER_INSTALL: &str = "Install the Poppler utilities:\n  \
    macOS:   brew install poppler\n  \
    Ubuntu:  sudo apt-get install poppler-utils\n  \
    Windows: install Poppler and add its bin directory to PATH";

/// Convert a `PageliftError` into a `HumanError`.
pub fn humanize_error(err: &PageliftError) -> HumanError {
    match err {
        PageliftError::Validation(detail) => HumanError {
            message: "Some of the input could not be understood.".into(),
            suggestion: format!("Check the command line and try again. ({detail})"),
            severity: Severity::ActionRequired,
        },

        PageliftError::Config(detail) => HumanError {
            message: "The configuration file has an invalid setting.".into(),
            suggestion: format!("Fix or remove the setting, then run again. ({detail})"),
            severity: Severity::ActionRequired,
        },

        PageliftError::Pdf(_) => HumanError {
            message: "This PDF file could not be read.".into(),
            suggestion: "The file may be damaged or not a PDF. Try opening it in a PDF viewer first.".into(),
            severity: Severity::Permanent,
        },

        PageliftError::EncryptedPdf(_) => HumanError {
            message: "This PDF is password protected.".into(),
            suggestion: "Remove the password (for example by printing it to a new PDF), then run again.".into(),
            severity: Severity::ActionRequired,
        },

        PageliftError::Image(_) => HumanError {
            message: "A rendered page image could not be processed.".into(),
            suggestion: "Try a different DPI setting with --dpi.".into(),
            severity: Severity::Permanent,
        },

        PageliftError::Recognition(_) => HumanError {
            message: "Text recognition failed.".into(),
            suggestion: "Check that the requested language packs are installed (--list-languages) and try a higher DPI.".into(),
            severity: Severity::Transient,
        },

        PageliftError::Dependency(detail) => humanize_dependency(detail),

        PageliftError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "The file couldn't be found.".into(),
                suggestion: "Check the path and try again.".into(),
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Permission denied while reading or writing a file.".into(),
                suggestion: "Check the file permissions or choose a different output directory.".into(),
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "There was a problem reading or writing a file.".into(),
                suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                severity: Severity::Transient,
            },
        },

        PageliftError::Serialization(_) => HumanError {
            message: "Results could not be serialised.".into(),
            suggestion: "Try again. If this keeps happening, please report it.".into(),
            severity: Severity::Transient,
        },
    }
}

fn humanize_dependency(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("tesseract") {
        HumanError {
            message: "Tesseract OCR is not installed or not on PATH.".into(),
            suggestion: TESSERACT_INSTALL.into(),
            severity: Severity::InstallRequired,
        }
    } else if lower.contains("pdftoppm") || lower.contains("poppler") {
        HumanError {
            message: "The Poppler PDF tools are not installed or not on PATH.".into(),
            suggestion: POPPLER_INSTALL.into(),
            severity: Severity::InstallRequired,
        }
    } else {
        HumanError {
            message: "A required external program is missing.".into(),
            suggestion: format!("Install it and make sure it is on PATH. ({detail})"),
            severity: Severity::InstallRequired,
        }
    }
}
