// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end document run: page selection, rasterization, preprocessing,
// concurrent recognition, then text, report and JSON output.
//
// Rendering and preprocessing are CPU-bound or process-bound, so they run on
// the blocking pool; recognition goes through `BatchRecognizer`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::DynamicImage;
use pagelift_core::error::{PageliftError, Result};
use pagelift_core::range::resolve_or_all;
use pagelift_core::{AppConfig, DocumentStatistics, PageRange, RecognitionResult};
use pagelift_document::{ImageProcessor, Rasterizer, save_pages};
use pagelift_ocr::language::DEFAULT_LANGUAGE;
use pagelift_ocr::{
    BatchRecognizer, FormatOptions, LayoutPage, ProgressFn, RecognitionEngine, RecognitionMode,
    Recognizer, SummaryReport, TextMetadata, export_json, format_results, summarize, write_text,
};
use tracing::{info, instrument, warn};

use super::output_paths;

/// What to do with one input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub input: PathBuf,
    /// Text output path; derived from the input name when `None`.
    pub output: Option<PathBuf>,
    /// Raw page selector such as `"2-5"`.
    pub pages: Option<String>,
    /// Rebuild lines from word positions instead of using plain text.
    pub layout: bool,
    pub save_images: bool,
    pub images_dir: Option<PathBuf>,
    pub export_json: bool,
}

/// Where the run wrote its files and how it went.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub text_path: PathBuf,
    pub report_path: Option<PathBuf>,
    pub json_path: Option<PathBuf>,
    pub saved_images: Vec<PathBuf>,
    pub statistics: DocumentStatistics,
    pub elapsed: Duration,
}

/// Wires the rasterizer and recognition engine to the output writers.
#[derive(Clone)]
pub struct OcrPipeline {
    config: AppConfig,
    rasterizer: Arc<dyn Rasterizer>,
    engine: Arc<dyn RecognitionEngine>,
    progress: Option<ProgressFn>,
}

impl OcrPipeline {
    pub fn new(
        config: AppConfig,
        rasterizer: Arc<dyn Rasterizer>,
        engine: Arc<dyn RecognitionEngine>,
    ) -> Self {
        Self {
            config,
            rasterizer,
            engine,
            progress: None,
        }
    }

    /// Report `(completed, total)` as pages finish recognition.
    pub fn with_progress(mut self, progress: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    /// Fail early when the renderer or recogniser cannot run.
    ///
    /// A missing default language pack is only a warning; pages still get
    /// recognised with whatever is installed.
    pub fn check_dependencies(&self) -> Result<()> {
        self.engine.check()?;
        self.rasterizer.check()?;
        match self.engine.available_languages() {
            Ok(languages) if !languages.contains(DEFAULT_LANGUAGE) => {
                warn!(
                    installed = ?languages,
                    expected = DEFAULT_LANGUAGE,
                    "default language pack is not installed"
                );
            }
            Ok(_) => {}
            Err(err) => warn!(%err, "could not list installed languages"),
        }
        Ok(())
    }

    pub fn available_languages(&self) -> Result<BTreeSet<String>> {
        self.engine.available_languages()
    }

    /// Process one document and write its outputs.
    ///
    /// Per-page recognition failures end up in the results and the report;
    /// only document-level problems (unreadable PDF, missing tools, write
    /// errors) fail the run.
    #[instrument(skip_all, fields(input = %options.input.display(), layout = options.layout))]
    pub async fn run(&self, options: &RunOptions) -> Result<RunSummary> {
        let started = Instant::now();
        check_input(&options.input)?;

        let output_dir = self.config.output.output_directory.clone();
        let image_target = options.save_images.then(|| {
            let dir = options
                .images_dir
                .clone()
                .unwrap_or_else(|| output_paths::images_dir(&output_dir));
            (dir, output_paths::image_prefix(&options.input))
        });

        let (images, saved_images) = self.prepare_pages(options, image_target).await?;
        let results = self.recognize(images, options.layout).await?;

        let text_path = options
            .output
            .clone()
            .unwrap_or_else(|| output_paths::text_path(&options.input, &output_dir));
        let text = format_results(&results, &FormatOptions::from_config(&self.config));
        let metadata =
            TextMetadata::from_config(Some(options.input.display().to_string()), &self.config);
        write_text(&text_path, &text, Some(&metadata))?;

        let elapsed = started.elapsed();
        let report_path = if self.config.output.write_report {
            let path = output_paths::report_path(&text_path);
            SummaryReport::new(&results, &self.config, elapsed).write(&path)?;
            Some(path)
        } else {
            None
        };

        let json_path = if options.export_json {
            let path = output_paths::json_path(&text_path);
            export_json(&results, &path)?;
            Some(path)
        } else {
            None
        };

        let statistics = summarize(&results, self.config.ocr.confidence_threshold);
        info!(
            pages = statistics.total_pages,
            failed = statistics.error_pages.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Document processed"
        );

        Ok(RunSummary {
            text_path,
            report_path,
            json_path,
            saved_images,
            statistics,
            elapsed,
        })
    }

    /// Render the selected pages, optionally save them, and preprocess them
    /// for recognition.
    async fn prepare_pages(
        &self,
        options: &RunOptions,
        image_target: Option<(PathBuf, String)>,
    ) -> Result<(Vec<DynamicImage>, Vec<PathBuf>)> {
        let rasterizer = Arc::clone(&self.rasterizer);
        let input = options.input.clone();
        let selector = options.pages.clone();
        let dpi = self.config.ocr.dpi;

        tokio::task::spawn_blocking(move || {
            let total = rasterizer.page_count(&input)?;
            let range = resolve_or_all(selector.as_deref(), total);
            info!(total, selected = range_len(range, total), "Rendering pages");

            let rendered = rasterizer.render_pages(&input, dpi, range)?;
            if rendered.is_empty() {
                return Err(PageliftError::Pdf(format!(
                    "no pages could be rendered from {}",
                    input.display()
                )));
            }

            let saved = match image_target {
                Some((dir, prefix)) => save_pages(&rendered, &dir, &prefix)?,
                None => Vec::new(),
            };

            let prepared = rendered
                .into_iter()
                .map(|page| ImageProcessor::from_dynamic(page).optimize_for_ocr().into_dynamic())
                .collect();
            Ok((prepared, saved))
        })
        .await
        .map_err(|err| PageliftError::Pdf(format!("page preparation stopped: {err}")))?
    }

    async fn recognize(&self, images: Vec<DynamicImage>, layout: bool) -> Result<Vec<RecognitionResult>> {
        let ocr = &self.config.ocr;
        let mode = RecognitionMode::default().with_whitelist(ocr.char_whitelist.clone());
        let recognizer = Arc::new(Recognizer::new(Arc::clone(&self.engine)).with_mode(mode));

        let mut batch = BatchRecognizer::new(recognizer, self.config.processing.max_workers);
        if let Some(progress) = self.progress.clone() {
            batch = batch.with_progress(move |done, total| progress(done, total));
        }

        if layout {
            let pages = batch
                .recognize_all_layout(images, &ocr.language, ocr.confidence_threshold)
                .await?;
            Ok(pages.iter().map(LayoutPage::to_result).collect())
        } else {
            batch.recognize_all(images, &ocr.language).await
        }
    }
}

fn check_input(path: &Path) -> Result<()> {
    if !path.is_file() {
        return Err(PageliftError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist or is not a file", path.display()),
        )));
    }
    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(PageliftError::Validation(format!(
            "{} is not a PDF file",
            path.display()
        )));
    }
    Ok(())
}

fn range_len(range: Option<PageRange>, total: u32) -> u32 {
    range.map_or(total, |range| range.page_count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use image::GrayImage;
    use pagelift_core::WordToken;
    use pagelift_ocr::TokenPage;

    /// Renders `pages` blank pages and records the requested range.
    struct FakeRasterizer {
        pages: u32,
        requested: Mutex<Option<Option<PageRange>>>,
    }

    impl FakeRasterizer {
        fn new(pages: u32) -> Self {
            Self {
                pages,
                requested: Mutex::new(None),
            }
        }
    }

    impl Rasterizer for FakeRasterizer {
        fn page_count(&self, _path: &Path) -> Result<u32> {
            Ok(self.pages)
        }

        fn render_pages(
            &self,
            _path: &Path,
            _dpi: u32,
            range: Option<PageRange>,
        ) -> Result<Vec<DynamicImage>> {
            *self.requested.lock().unwrap() = Some(range);
            let count = range_len(range, self.pages);
            Ok((0..count)
                .map(|_| DynamicImage::ImageLuma8(GrayImage::new(40, 40)))
                .collect())
        }
    }

    /// Answers every page with the same two words, or fails every page.
    struct FakeEngine {
        fail: bool,
    }

    fn word(text: &str, confidence: f32, left: u32) -> WordToken {
        WordToken {
            text: text.into(),
            confidence,
            left,
            top: 10,
            width: 60,
            height: 20,
            line_index: 1,
            block_index: 1,
            paragraph_index: 1,
            level: WordToken::WORD_LEVEL,
        }
    }

    impl RecognitionEngine for FakeEngine {
        fn available_languages(&self) -> Result<BTreeSet<String>> {
            Ok(["eng".to_string()].into_iter().collect())
        }

        fn extract_text(&self, _image: &DynamicImage, _language: &str, _mode: &RecognitionMode) -> Result<String> {
            if self.fail {
                return Err(PageliftError::Recognition("engine exploded".into()));
            }
            Ok("Hello world".into())
        }

        fn extract_tokens(
            &self,
            _image: &DynamicImage,
            _language: &str,
            _mode: &RecognitionMode,
        ) -> Result<TokenPage> {
            Ok(TokenPage::from_tokens(vec![word("Hello", 92.0, 0), word("world", 30.0, 80)]))
        }

        fn check(&self) -> Result<()> {
            Ok(())
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        input: PathBuf,
        config: AppConfig,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scan.pdf");
        std::fs::write(&input, b"%PDF-1.4 placeholder").unwrap();
        let mut config = AppConfig::default();
        config.ocr.language = "eng".into();
        config.output.output_directory = dir.path().join("out");
        config.processing.max_workers = 2;
        Fixture { dir, input, config }
    }

    fn options(input: &Path) -> RunOptions {
        RunOptions {
            input: input.to_path_buf(),
            output: None,
            pages: None,
            layout: false,
            save_images: false,
            images_dir: None,
            export_json: false,
        }
    }

    fn pipeline(config: AppConfig, rasterizer: Arc<FakeRasterizer>, fail: bool) -> OcrPipeline {
        OcrPipeline::new(config, rasterizer, Arc::new(FakeEngine { fail }))
    }

    #[tokio::test]
    async fn run_writes_text_and_report() {
        let fx = fixture();
        let pipeline = pipeline(fx.config.clone(), Arc::new(FakeRasterizer::new(3)), false);

        let summary = pipeline.run(&options(&fx.input)).await.unwrap();

        assert_eq!(summary.text_path, fx.dir.path().join("out").join("scan_ocr.txt"));
        let text = std::fs::read_to_string(&summary.text_path).unwrap();
        assert!(text.contains("Source: "));
        assert!(text.contains("--- Page 3 ---"));
        assert_eq!(text.matches("Hello world").count(), 3);

        let report = summary.report_path.unwrap();
        assert_eq!(report, fx.dir.path().join("out").join("scan_ocr_report.txt"));
        assert!(std::fs::read_to_string(report).unwrap().contains("- Pages: 3"));
        assert!(summary.json_path.is_none());
        assert_eq!(summary.statistics.total_pages, 3);
        assert_eq!(summary.statistics.success_rate, 100.0);
    }

    #[tokio::test]
    async fn page_selector_limits_rendering() {
        let fx = fixture();
        let rasterizer = Arc::new(FakeRasterizer::new(10));
        let pipeline = pipeline(fx.config.clone(), Arc::clone(&rasterizer), false);

        let mut opts = options(&fx.input);
        opts.pages = Some("8-20".into());
        let summary = pipeline.run(&opts).await.unwrap();

        assert_eq!(*rasterizer.requested.lock().unwrap(), Some(PageRange::new(8, 10)));
        assert_eq!(summary.statistics.total_pages, 3);
    }

    #[tokio::test]
    async fn bad_selector_processes_every_page() {
        let fx = fixture();
        let rasterizer = Arc::new(FakeRasterizer::new(4));
        let pipeline = pipeline(fx.config.clone(), Arc::clone(&rasterizer), false);

        let mut opts = options(&fx.input);
        opts.pages = Some("first".into());
        let summary = pipeline.run(&opts).await.unwrap();

        assert_eq!(*rasterizer.requested.lock().unwrap(), Some(None));
        assert_eq!(summary.statistics.total_pages, 4);
    }

    #[tokio::test]
    async fn failed_pages_are_reported_not_fatal() {
        let fx = fixture();
        let pipeline = pipeline(fx.config.clone(), Arc::new(FakeRasterizer::new(2)), true);

        let mut opts = options(&fx.input);
        opts.export_json = true;
        let summary = pipeline.run(&opts).await.unwrap();

        assert_eq!(summary.statistics.error_pages, vec![1, 2]);
        assert_eq!(summary.statistics.success_rate, 0.0);
        let json = std::fs::read_to_string(summary.json_path.unwrap()).unwrap();
        let results: Vec<RecognitionResult> = serde_json::from_str(&json).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(RecognitionResult::is_error));
        assert!(results[0].error.as_deref().unwrap().contains("engine exploded"));
    }

    #[tokio::test]
    async fn layout_mode_drops_low_confidence_words() {
        let fx = fixture();
        let mut config = fx.config.clone();
        config.output.write_report = false;
        let pipeline = pipeline(config, Arc::new(FakeRasterizer::new(1)), false);

        let mut opts = options(&fx.input);
        opts.layout = true;
        opts.output = Some(fx.dir.path().join("custom.txt"));
        let summary = pipeline.run(&opts).await.unwrap();

        assert!(summary.report_path.is_none());
        let text = std::fs::read_to_string(fx.dir.path().join("custom.txt")).unwrap();
        assert!(text.ends_with("Hello"));
    }

    #[tokio::test]
    async fn saved_images_use_document_prefix() {
        let fx = fixture();
        let pipeline = pipeline(fx.config.clone(), Arc::new(FakeRasterizer::new(2)), false);

        let mut opts = options(&fx.input);
        opts.save_images = true;
        let summary = pipeline.run(&opts).await.unwrap();

        let images_dir = fx.dir.path().join("out").join("images");
        assert_eq!(
            summary.saved_images,
            vec![images_dir.join("scan_page_0001.png"), images_dir.join("scan_page_0002.png")]
        );
    }

    #[tokio::test]
    async fn progress_reaches_total() {
        let fx = fixture();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let pipeline = pipeline(fx.config.clone(), Arc::new(FakeRasterizer::new(3)), false)
            .with_progress(move |done, total| sink.lock().unwrap().push((done, total)));

        pipeline.run(&options(&fx.input)).await.unwrap();
        assert_eq!(seen.lock().unwrap().last(), Some(&(3, 3)));
    }

    #[tokio::test]
    async fn missing_or_non_pdf_input_is_rejected() {
        let fx = fixture();
        let pipeline = pipeline(fx.config.clone(), Arc::new(FakeRasterizer::new(1)), false);

        let missing = pipeline.run(&options(&fx.dir.path().join("nope.pdf"))).await;
        assert!(matches!(missing, Err(PageliftError::Io(_))));

        let text_file = fx.dir.path().join("notes.txt");
        std::fs::write(&text_file, "x").unwrap();
        let wrong_type = pipeline.run(&options(&text_file)).await;
        assert!(matches!(wrong_type, Err(PageliftError::Validation(_))));
    }
}
