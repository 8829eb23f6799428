// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — prepares rasterized pages for text recognition
// (grayscale, upscaling of small pages) and exports page images as PNG.
// Operates on in-memory images using the `image` crate.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use pagelift_core::error::PageliftError;
use tracing::{debug, info, instrument, warn};

/// Pages smaller than this on either side are upscaled before recognition.
pub const MIN_OCR_DIMENSION: u32 = 1000;

/// Image processing pipeline operating on a single page image.
///
/// Each transformation consumes `self` and returns a new `ImageProcessor`,
/// enabling method chaining.
///
/// ```ignore
/// let page = ImageProcessor::from_dynamic(rendered)
///     .optimize_for_ocr()
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Convert the image to single-channel 8-bit grayscale.
    pub fn grayscale(self) -> Self {
        Self {
            image: DynamicImage::ImageLuma8(self.image.to_luma8()),
        }
    }

    /// Scale both sides by `factor` with Lanczos3 filtering.
    ///
    /// Factors that would produce a zero-sized image leave it unchanged.
    pub fn scale(self, factor: f64) -> Self {
        let new_w = (f64::from(self.image.width()) * factor).round() as u32;
        let new_h = (f64::from(self.image.height()) * factor).round() as u32;
        if new_w == 0 || new_h == 0 {
            return self;
        }
        let resized = self.image.resize_exact(new_w, new_h, FilterType::Lanczos3);
        debug!(new_w, new_h, "Scale complete");
        Self { image: resized }
    }

    /// Prepare a rendered page for recognition.
    ///
    /// Converts to grayscale and, when either side is below
    /// [`MIN_OCR_DIMENSION`], upscales uniformly by
    /// `max(MIN / width, MIN / height)` so the smaller side reaches the floor.
    /// Never fails; a zero-sized image is returned unchanged.
    #[instrument(skip(self), fields(width = self.image.width(), height = self.image.height()))]
    pub fn optimize_for_ocr(self) -> Self {
        let (width, height) = (self.image.width(), self.image.height());
        if width == 0 || height == 0 {
            debug!("Degenerate page image, skipping preprocessing");
            return self;
        }

        let gray = self.grayscale();
        if width >= MIN_OCR_DIMENSION && height >= MIN_OCR_DIMENSION {
            return gray;
        }

        let floor = f64::from(MIN_OCR_DIMENSION);
        let factor = (floor / f64::from(width)).max(floor / f64::from(height));
        info!(factor, "Upscaling small page for recognition");
        gray.scale(factor)
    }
}

/// Save page images into `dir` as `<prefix>_0001.png`, `<prefix>_0002.png`, ...
///
/// A page that cannot be written is logged and skipped; the paths of the
/// pages that were written are returned in page order.
#[instrument(skip_all, fields(dir = %dir.as_ref().display(), count = images.len(), prefix = %prefix))]
pub fn save_pages(
    images: &[DynamicImage],
    dir: impl AsRef<Path>,
    prefix: &str,
) -> Result<Vec<PathBuf>, PageliftError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let mut saved = Vec::with_capacity(images.len());
    for (index, image) in images.iter().enumerate() {
        let path = dir.join(format!("{}_{:04}.png", prefix, index + 1));
        match image.save_with_format(&path, ImageFormat::Png) {
            Ok(()) => saved.push(path),
            Err(err) => warn!(page = index + 1, %err, "failed to save page image"),
        }
    }

    info!(saved = saved.len(), "Page images saved");
    Ok(saved)
}
