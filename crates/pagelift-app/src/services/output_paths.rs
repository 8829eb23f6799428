// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output file naming, derived from the input document and output directory.

use std::path::{Path, PathBuf};

use pagelift_ocr::format::safe_file_name;

/// Sub-directory of the output directory that receives saved page images.
const IMAGES_SUBDIR: &str = "images";

/// File-system-safe stem of the input document (`scan` for `scan.pdf`).
pub fn document_stem(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| "document".to_string());
    safe_file_name(&stem)
}

/// Default text output: `<output_dir>/<stem>_ocr.txt`.
pub fn text_path(input: &Path, output_dir: &Path) -> PathBuf {
    output_dir.join(format!("{}_ocr.txt", document_stem(input)))
}

/// Summary report beside the text output: `<base>_report.txt`.
pub fn report_path(text_path: &Path) -> PathBuf {
    sibling(text_path, "_report.txt")
}

/// JSON export beside the text output: `<base>.json`.
pub fn json_path(text_path: &Path) -> PathBuf {
    sibling(text_path, ".json")
}

/// Default page image directory: `<output_dir>/images`.
pub fn images_dir(output_dir: &Path) -> PathBuf {
    output_dir.join(IMAGES_SUBDIR)
}

/// Page image file prefix: `<stem>_page`.
pub fn image_prefix(input: &Path) -> String {
    format!("{}_page", document_stem(input))
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let base = path.with_extension("");
    let mut name = base.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    base.with_file_name(name)
}
