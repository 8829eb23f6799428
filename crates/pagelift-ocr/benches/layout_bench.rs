// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the pagelift-ocr crate. Measures layout
// reconstruction on a synthetic dense page, the per-page cost of the
// layout-preserving export path.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use pagelift_core::WordToken;
use pagelift_ocr::reconstruct;

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// 60 lines of 12 words each, emitted right-to-left within every line so the
/// per-line sort does real work, with every fifth word below threshold.
fn synthetic_page() -> Vec<WordToken> {
    let mut tokens = Vec::with_capacity(60 * 13);
    for line in 1..=60u32 {
        tokens.push(WordToken {
            text: String::new(),
            confidence: WordToken::NO_CONFIDENCE,
            left: 40,
            top: line * 30,
            width: 1100,
            height: 24,
            line_index: line,
            block_index: 1,
            paragraph_index: 1,
            level: 4,
        });
        for word in (0..12u32).rev() {
            tokens.push(WordToken {
                text: format!("word{word}"),
                confidence: if word % 5 == 0 { 35.0 } else { 91.0 },
                left: 40 + word * 90,
                top: line * 30,
                width: 80,
                height: 24,
                line_index: line,
                block_index: 1,
                paragraph_index: 1,
                level: WordToken::WORD_LEVEL,
            });
        }
    }
    tokens
}

fn bench_reconstruct(c: &mut Criterion) {
    let tokens = synthetic_page();

    c.bench_function("reconstruct (60 lines x 12 words)", |b| {
        b.iter(|| black_box(reconstruct(black_box(&tokens), 60)));
    });
}

criterion_group!(benches, bench_reconstruct);
criterion_main!(benches);
