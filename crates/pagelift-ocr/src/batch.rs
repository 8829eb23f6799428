// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch orchestration — recognises every page of a document concurrently.
//
// Pages are submitted in order to a pool bounded by a semaphore. Each page
// runs on the blocking thread pool (the engine is a synchronous process
// call) and reports back `(index, outcome)`, so results land in their page
// slot regardless of completion order. A failing or panicking page yields an
// error result for that page only.

use std::sync::Arc;

use image::DynamicImage;
use pagelift_core::RecognitionResult;
use pagelift_core::error::{PageliftError, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, instrument};

use crate::recognizer::{LayoutPage, Recognizer};

/// Progress callback: `(completed, total)`. `completed` increases by one per
/// finished page.
pub type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Runs a [`Recognizer`] over many pages with bounded concurrency.
pub struct BatchRecognizer {
    recognizer: Arc<Recognizer>,
    max_workers: usize,
    progress: Option<ProgressFn>,
}

impl BatchRecognizer {
    /// `max_workers` below 1 is treated as 1.
    pub fn new(recognizer: Arc<Recognizer>, max_workers: usize) -> Self {
        Self {
            recognizer,
            max_workers: max_workers.max(1),
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(progress));
        self
    }

    /// Recognise `images` as pages `1..=n`.
    ///
    /// Always returns exactly one result per image, in input order.
    #[instrument(skip_all, fields(pages = images.len(), language = %language))]
    pub async fn recognize_all(
        &self,
        images: Vec<DynamicImage>,
        language: &str,
    ) -> Result<Vec<RecognitionResult>> {
        // Resolve once so fallbacks are logged once per batch, not per page.
        let effective = self.recognizer.choose_language(language).tag;
        let recognizer = Arc::clone(&self.recognizer);
        let work_language = effective.clone();

        let results = self
            .run_pages(
                images,
                move |page, image| recognizer.recognize(page, image, &work_language),
                move |page, err| RecognitionResult::failed(page, effective.clone(), err),
            )
            .await;

        let failed = results.iter().filter(|result| result.is_error()).count();
        info!(pages = results.len(), failed, "Batch recognition complete");
        Ok(results)
    }

    /// Layout-preserving variant of [`BatchRecognizer::recognize_all`].
    #[instrument(skip_all, fields(pages = images.len(), language = %language, threshold = threshold))]
    pub async fn recognize_all_layout(
        &self,
        images: Vec<DynamicImage>,
        language: &str,
        threshold: u32,
    ) -> Result<Vec<LayoutPage>> {
        let effective = self.recognizer.choose_language(language).tag;
        let recognizer = Arc::clone(&self.recognizer);
        let work_language = effective.clone();

        let pages = self
            .run_pages(
                images,
                move |page, image| recognizer.recognize_layout(page, image, &work_language, threshold),
                move |page, err| LayoutPage::failed(page, effective.clone(), err),
            )
            .await;

        let failed = pages.iter().filter(|page| page.error.is_some()).count();
        info!(pages = pages.len(), failed, "Batch layout recognition complete");
        Ok(pages)
    }

    /// Run `work` for every image on a bounded pool, collecting results in
    /// input order. `on_error` builds the placeholder for a failed page.
    async fn run_pages<T, W, E>(&self, images: Vec<DynamicImage>, work: W, on_error: E) -> Vec<T>
    where
        T: Send + 'static,
        W: Fn(u32, &DynamicImage) -> Result<T> + Send + Sync + 'static,
        E: Fn(u32, String) -> T,
    {
        let total = images.len();
        if total == 0 {
            return Vec::new();
        }

        let workers = self.max_workers.min(total);
        info!(total, workers, "Starting batch");

        let semaphore = Arc::new(Semaphore::new(workers));
        let work = Arc::new(work);
        let mut tasks = JoinSet::new();

        for (index, image) in images.into_iter().enumerate() {
            let page = index as u32 + 1;
            let semaphore = Arc::clone(&semaphore);
            let work = Arc::clone(&work);

            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(err) => {
                        return (index, Err(PageliftError::Recognition(format!("worker pool closed: {err}"))));
                    }
                };
                let outcome = tokio::task::spawn_blocking(move || work(page, &image))
                    .await
                    .unwrap_or_else(|join_err| {
                        Err(PageliftError::Recognition(format!("worker panicked: {join_err}")))
                    });
                (index, outcome)
            });
        }

        let mut slots: Vec<Option<T>> = (0..total).map(|_| None).collect();
        let mut completed = 0usize;

        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = match joined {
                Ok(pair) => pair,
                Err(join_err) => {
                    // The index is lost with the task; its slot is filled below.
                    error!(%join_err, "page task aborted");
                    continue;
                }
            };
            let page = index as u32 + 1;
            slots[index] = Some(match outcome {
                Ok(value) => value,
                Err(err) => {
                    error!(page, %err, "page recognition failed");
                    on_error(page, err.to_string())
                }
            });

            completed += 1;
            if let Some(progress) = &self.progress {
                progress(completed, total);
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| on_error(index as u32 + 1, "page task did not complete".to_string()))
            })
            .collect()
    }
}
