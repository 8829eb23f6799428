// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterization — renders PDF pages to bitmaps through an external
// renderer. The default implementation drives Poppler's `pdftoppm` and falls
// back to `pdfinfo` for page counting when lopdf cannot parse the file.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use image::DynamicImage;
use pagelift_core::PageRange;
use pagelift_core::error::{PageliftError, Result};
use tracing::{debug, info, instrument, warn};

use super::reader::PdfReader;

/// File name prefix for pages written by the renderer.
const PAGE_PREFIX: &str = "page";

/// Turns PDF pages into bitmaps.
pub trait Rasterizer: Send + Sync {
    /// Number of pages in the document.
    fn page_count(&self, path: &Path) -> Result<u32>;

    /// Render the selected pages (all when `range` is `None`) at `dpi`, in
    /// ascending page order.
    fn render_pages(&self, path: &Path, dpi: u32, range: Option<PageRange>)
    -> Result<Vec<DynamicImage>>;

    /// Verify the renderer can run. Fails with [`PageliftError::Dependency`]
    /// when its tooling is missing.
    fn check(&self) -> Result<()> {
        Ok(())
    }
}

/// [`Rasterizer`] backed by the Poppler command-line tools.
#[derive(Debug, Clone)]
pub struct PopplerRasterizer {
    pdftoppm: PathBuf,
    pdfinfo: PathBuf,
}

impl Default for PopplerRasterizer {
    fn default() -> Self {
        Self {
            pdftoppm: PathBuf::from("pdftoppm"),
            pdfinfo: PathBuf::from("pdfinfo"),
        }
    }
}

impl PopplerRasterizer {
    /// Use the `pdftoppm` and `pdfinfo` found on `PATH`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use explicit tool locations (e.g. a bundled Poppler).
    pub fn with_binaries(pdftoppm: impl Into<PathBuf>, pdfinfo: impl Into<PathBuf>) -> Self {
        Self {
            pdftoppm: pdftoppm.into(),
            pdfinfo: pdfinfo.into(),
        }
    }

    fn page_count_from_pdfinfo(&self, path: &Path) -> Result<u32> {
        let output = run_tool(&self.pdfinfo, Command::new(&self.pdfinfo).arg(path))?;
        if !output.status.success() {
            return Err(classify_render_failure(path, &output));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_pdfinfo_pages(&stdout).ok_or_else(|| {
            PageliftError::Pdf(format!("pdfinfo reported no page count for {}", path.display()))
        })
    }
}

impl Rasterizer for PopplerRasterizer {
    fn check(&self) -> Result<()> {
        // `pdftoppm -v` prints its version to stderr and exits 0 (older
        // releases exit 99); being able to spawn it is what matters.
        run_tool(&self.pdftoppm, Command::new(&self.pdftoppm).arg("-v"))?;
        debug!(tool = %self.pdftoppm.display(), "pdftoppm available");
        Ok(())
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    fn page_count(&self, path: &Path) -> Result<u32> {
        match PdfReader::open(path) {
            Ok(reader) => Ok(reader.page_count()),
            Err(PageliftError::Pdf(detail)) => {
                warn!(%detail, "lopdf could not parse document, asking pdfinfo");
                self.page_count_from_pdfinfo(path)
            }
            Err(err) => Err(err),
        }
    }

    #[instrument(skip_all, fields(path = %path.display(), dpi = dpi, range = ?range))]
    fn render_pages(
        &self,
        path: &Path,
        dpi: u32,
        range: Option<PageRange>,
    ) -> Result<Vec<DynamicImage>> {
        let scratch = tempfile::tempdir()?;
        let prefix = scratch.path().join(PAGE_PREFIX);

        let mut command = Command::new(&self.pdftoppm);
        command.arg("-r").arg(dpi.to_string()).arg("-png");
        if let Some(range) = range {
            command
                .arg("-f")
                .arg(range.start().to_string())
                .arg("-l")
                .arg(range.end().to_string());
        }
        command.arg(path).arg(&prefix);

        info!("Rendering PDF pages");
        let output = run_tool(&self.pdftoppm, &mut command)?;
        if !output.status.success() {
            return Err(classify_render_failure(path, &output));
        }

        let files = collect_rendered_pages(scratch.path())?;
        if files.is_empty() {
            return Err(PageliftError::Pdf(format!(
                "renderer produced no pages for {}",
                path.display()
            )));
        }

        let mut pages = Vec::with_capacity(files.len());
        for file in &files {
            let page = image::open(file).map_err(|err| {
                PageliftError::Image(format!(
                    "failed to decode rendered page {}: {}",
                    file.display(),
                    err
                ))
            })?;
            pages.push(page);
        }

        info!(pages = pages.len(), "PDF rendering complete");
        Ok(pages)
    }
}

/// Spawn an external tool, mapping "not installed" to a dependency error.
fn run_tool(tool: &Path, command: &mut Command) -> Result<Output> {
    command.output().map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
            PageliftError::Dependency(format!("{} (poppler): {}", tool.display(), err))
        }
        _ => PageliftError::Io(err),
    })
}

/// Classify a non-zero exit from a Poppler tool.
fn classify_render_failure(path: &Path, output: &Output) -> PageliftError {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lower = stderr.to_ascii_lowercase();
    if lower.contains("password") || lower.contains("encrypt") {
        PageliftError::EncryptedPdf(path.display().to_string())
    } else {
        PageliftError::Pdf(format!(
            "failed to render {}: {}",
            path.display(),
            stderr.trim()
        ))
    }
}

/// Extract the page count from `pdfinfo` output (`Pages:          12`).
fn parse_pdfinfo_pages(stdout: &str) -> Option<u32> {
    stdout.lines().find_map(|line| {
        let value = line.strip_prefix("Pages:")?;
        value.trim().parse().ok()
    })
}

/// List rendered page images in `dir`, ordered by page number.
///
/// `pdftoppm` names files `<prefix>-<n>.png`; `n` is zero-padded to the width
/// of the last page, so sorting on the parsed number is used rather than
/// relying on name order.
fn collect_rendered_pages(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut numbered = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("png") {
            continue;
        }
        let Some(number) = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.strip_prefix(PAGE_PREFIX))
            .and_then(|rest| rest.trim_start_matches('-').parse::<u32>().ok())
        else {
            continue;
        };
        numbered.push((number, path));
    }
    numbered.sort_by_key(|(number, _)| *number);
    Ok(numbered.into_iter().map(|(_, path)| path).collect())
}
