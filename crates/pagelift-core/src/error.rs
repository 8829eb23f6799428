// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagelift.

use thiserror::Error;

/// Top-level error type for all Pagelift operations.
#[derive(Debug, Error)]
pub enum PageliftError {
    // -- Input errors --
    /// Malformed user input (e.g. a page selector like "abc"). Always
    /// recoverable: callers fall back to a sensible default.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Config(String),

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    Pdf(String),

    #[error("PDF is encrypted and requires a password: {0}")]
    EncryptedPdf(String),

    #[error("image processing failed: {0}")]
    Image(String),

    // -- Recognition errors --
    /// The recognition engine failed for a single page. The batch layer turns
    /// this into a per-page error result.
    #[error("recognition failed: {0}")]
    Recognition(String),

    /// An external tool (tesseract, pdftoppm) is not installed or cannot be
    /// executed. Fatal at startup.
    #[error("missing dependency: {0}")]
    Dependency(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PageliftError>;
