// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line arguments and how they override the loaded configuration.

use std::path::PathBuf;

use clap::Parser;
use pagelift_core::AppConfig;
use pagelift_core::config::DEFAULT_CONFIG_FILE;
use pagelift_core::error::Result;

use crate::services::pipeline::RunOptions;

#[derive(Parser, Debug)]
#[command(
    name = "pagelift",
    version,
    about = "Turn scanned, image-only PDFs into editable text"
)]
pub struct Cli {
    /// PDF file to process.
    #[arg(required_unless_present = "list_languages")]
    pub input: Option<PathBuf>,

    /// Text output path. Defaults to `<output dir>/<name>_ocr.txt`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Recognition language, e.g. `eng` or `chi_sim+eng`.
    #[arg(short, long)]
    pub language: Option<String>,

    /// Rasterization resolution.
    #[arg(short, long)]
    pub dpi: Option<u32>,

    /// Confidence threshold (0-100) for flagging pages and dropping layout words.
    #[arg(short, long)]
    pub confidence: Option<u32>,

    /// Pages to process: `3`, `2-5`. All pages when omitted.
    #[arg(short, long)]
    pub pages: Option<String>,

    /// Tesseract language pack directory (sets `TESSDATA_PREFIX`).
    #[arg(long)]
    pub tessdata_dir: Option<PathBuf>,

    /// Concurrent recognition workers.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Collapse each page to one block instead of rebuilding paragraphs.
    #[arg(long, default_value_t = false)]
    pub no_format: bool,

    /// Rebuild lines from word positions and drop low-confidence words.
    #[arg(long, default_value_t = false)]
    pub layout: bool,

    /// Keep the rendered page images.
    #[arg(long, default_value_t = false)]
    pub save_images: bool,

    /// Where to put saved page images. Defaults to `<output dir>/images`.
    #[arg(long)]
    pub images_dir: Option<PathBuf>,

    /// Also write per-page results as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Configuration file.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Print the installed recognition languages and exit.
    #[arg(long, default_value_t = false)]
    pub list_languages: bool,

    /// Debug logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    /// Apply command-line overrides on top of `config` and validate the result.
    pub fn apply_overrides(&self, mut config: AppConfig) -> Result<AppConfig> {
        if let Some(language) = &self.language {
            config.ocr.language = language.clone();
        }
        if let Some(dpi) = self.dpi {
            config.ocr.dpi = dpi;
        }
        if let Some(confidence) = self.confidence {
            config.ocr.confidence_threshold = confidence;
        }
        if let Some(dir) = &self.tessdata_dir {
            config.ocr.tessdata_dir = Some(dir.clone());
        }
        if let Some(workers) = self.workers {
            config.processing.max_workers = workers;
        }
        if self.no_format {
            config.output.preserve_formatting = false;
        }
        config.validate()?;
        Ok(config)
    }

    /// Per-run options for the pipeline. `None` when no input was given.
    pub fn run_options(&self) -> Option<RunOptions> {
        let input = self.input.clone()?;
        Some(RunOptions {
            input,
            output: self.output.clone(),
            pages: self.pages.clone(),
            layout: self.layout,
            save_images: self.save_images || self.images_dir.is_some(),
            images_dir: self.images_dir.clone(),
            export_json: self.json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagelift_core::PageliftError;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pagelift").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_config() {
        let cli = parse(&[
            "scan.pdf",
            "-l",
            "eng",
            "-d",
            "200",
            "-c",
            "75",
            "-w",
            "2",
            "--no-format",
            "--tessdata-dir",
            "/opt/tessdata",
        ]);
        let config = cli.apply_overrides(AppConfig::default()).unwrap();
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.ocr.dpi, 200);
        assert_eq!(config.ocr.confidence_threshold, 75);
        assert_eq!(config.processing.max_workers, 2);
        assert!(!config.output.preserve_formatting);
        assert_eq!(config.ocr.tessdata_dir, Some(PathBuf::from("/opt/tessdata")));
    }

    #[test]
    fn absent_flags_keep_config_values() {
        let cli = parse(&["scan.pdf"]);
        let mut base = AppConfig::default();
        base.ocr.dpi = 150;
        let config = cli.apply_overrides(base.clone()).unwrap();
        assert_eq!(config, base);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn out_of_range_confidence_is_rejected() {
        let cli = parse(&["scan.pdf", "-c", "150"]);
        assert!(matches!(
            cli.apply_overrides(AppConfig::default()),
            Err(PageliftError::Config(_))
        ));
    }

    #[test]
    fn input_is_required_unless_listing_languages() {
        assert!(Cli::try_parse_from(["pagelift"]).is_err());
        let cli = parse(&["--list-languages"]);
        assert!(cli.list_languages);
        assert!(cli.run_options().is_none());
    }

    #[test]
    fn images_dir_implies_saving_images() {
        let cli = parse(&["scan.pdf", "--images-dir", "pages", "-p", "2-4", "--json", "--layout"]);
        let options = cli.run_options().unwrap();
        assert!(options.save_images);
        assert_eq!(options.images_dir, Some(PathBuf::from("pages")));
        assert_eq!(options.pages.as_deref(), Some("2-4"));
        assert!(options.export_json);
        assert!(options.layout);
    }
}
