// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagelift — OCR for scanned PDFs
//
// Entry point. Initialises logging, loads configuration, verifies the
// external tools, and runs the document pipeline.

mod cli;
mod services;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use pagelift_core::AppConfig;
use pagelift_core::error::{PageliftError, Result};
use pagelift_core::human_errors::humanize_error;
use pagelift_document::PopplerRasterizer;
use pagelift_ocr::TesseractCli;

use cli::Cli;
use services::pipeline::{OcrPipeline, RunSummary};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Pagelift starting");

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "run failed");
            eprintln!("\n{}", humanize_error(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.apply_overrides(AppConfig::load(&cli.config))?;
    let engine = TesseractCli::from_settings(&config.ocr);
    let pipeline = OcrPipeline::new(config, Arc::new(PopplerRasterizer::new()), Arc::new(engine));

    if cli.list_languages {
        let languages = pipeline.available_languages()?;
        println!("Installed recognition languages ({}):", languages.len());
        for language in &languages {
            println!("  {language}");
        }
        return Ok(());
    }

    let options = cli
        .run_options()
        .ok_or_else(|| PageliftError::Validation("no input file given".into()))?;

    pipeline.check_dependencies()?;
    let pipeline = pipeline.with_progress(|done, total| {
        eprint!("\rRecognizing pages: {done}/{total}");
        if done == total {
            eprintln!();
        }
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let summary = runtime.block_on(pipeline.run(&options))?;

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let stats = &summary.statistics;
    println!();
    println!("Processing complete");
    println!("  Time:               {:.1} s", summary.elapsed.as_secs_f64());
    println!("  Pages:              {}", stats.total_pages);
    println!("  Characters:         {}", stats.total_characters);
    println!("  Words:              {}", stats.total_words);
    println!("  Average confidence: {:.1}%", stats.average_confidence);
    println!("  Success rate:       {:.1}%", stats.success_rate);
    if !stats.low_confidence_pages.is_empty() {
        println!("  Low confidence:     pages {}", join(&stats.low_confidence_pages));
    }
    if !stats.error_pages.is_empty() {
        println!("  Failed:             pages {}", join(&stats.error_pages));
    }
    println!("  Text:               {}", summary.text_path.display());
    if let Some(path) = &summary.report_path {
        println!("  Report:             {}", path.display());
    }
    if let Some(path) = &summary.json_path {
        println!("  JSON:               {}", path.display());
    }
    if let Some(first) = summary.saved_images.first() {
        let dir = first.parent().unwrap_or(first);
        println!(
            "  Page images:        {} in {}",
            summary.saved_images.len(),
            dir.display()
        );
    }
}

fn join(pages: &[u32]) -> String {
    pages
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
