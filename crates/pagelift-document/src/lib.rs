// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagelift-document — Document handling for the Pagelift OCR pipeline.
//
// Provides PDF inspection (page count, password detection), page
// rasterization through an external renderer, and page image preprocessing
// (grayscale, upscaling) ahead of recognition.

pub mod image;
pub mod pdf;

// Re-export the primary structs so callers can use `pagelift_document::PdfReader` etc.
pub use image::processor::{ImageProcessor, save_pages};
pub use pdf::reader::PdfReader;
pub use pdf::render::{PopplerRasterizer, Rasterizer};
