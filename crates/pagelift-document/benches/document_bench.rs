// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the pagelift-document crate. Measures page
// preprocessing on a small synthetic scan, which is the upscale path every
// low-resolution page takes before recognition.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgb, RgbImage};

use pagelift_document::ImageProcessor;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Preprocess a 400x300 RGB page: grayscale plus upscale to the 1000px floor.
fn bench_optimize_for_ocr(c: &mut Criterion) {
    let (width, height) = (400u32, 300u32);
    let mut img = RgbImage::from_pixel(width, height, Rgb([245, 245, 240]));
    // Dark horizontal bars standing in for lines of text.
    for y in (20..280).step_by(24) {
        for x in 30..370 {
            for dy in 0..6 {
                img.put_pixel(x, y + dy, Rgb([20, 20, 20]));
            }
        }
    }
    let dynamic = DynamicImage::ImageRgb8(img);

    c.bench_function("optimize_for_ocr (400x300)", |b| {
        b.iter(|| {
            let processed = ImageProcessor::from_dynamic(black_box(dynamic.clone()))
                .optimize_for_ocr();
            black_box(processed.into_dynamic());
        });
    });
}

criterion_group!(benches, bench_optimize_for_ocr);
criterion_main!(benches);
