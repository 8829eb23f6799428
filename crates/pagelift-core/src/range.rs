// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page selection — turns a user selector such as "3" or "2-7" into an
// inclusive, 1-based page range clamped to the document.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{PageliftError, Result};

/// Inclusive, 1-based page range. Always satisfies `1 <= start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    start: u32,
    end: u32,
}

impl PageRange {
    /// Build a range, returning `None` unless `1 <= start <= end`.
    pub fn new(start: u32, end: u32) -> Option<Self> {
        (start >= 1 && start <= end).then_some(Self { start, end })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Number of pages covered.
    pub fn page_count(&self) -> u32 {
        self.end - self.start + 1
    }

    /// Page numbers in ascending order.
    pub fn pages(&self) -> std::ops::RangeInclusive<u32> {
        self.start..=self.end
    }
}

impl std::fmt::Display for PageRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Resolve a page selector against a document of `total_pages` pages.
///
/// - `None`, empty, or blank input selects all pages (`Ok(None)`).
/// - `"a-b"` clamps both ends into `[1, total_pages]`. A reversed selector
///   such as `"5-3"` is read as `3-5`.
/// - `"n"` clamps into `[1, total_pages]` and selects that single page.
/// - Non-numeric input fails with [`PageliftError::Validation`].
///
/// An empty document has nothing to select, so it always resolves to `None`.
pub fn resolve(range_spec: Option<&str>, total_pages: u32) -> Result<Option<PageRange>> {
    let Some(spec) = range_spec.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let (start, end) = match spec.split_once('-') {
        Some((start, end)) => (parse_page(start, spec)?, parse_page(end, spec)?),
        None => {
            let page = parse_page(spec, spec)?;
            (page, page)
        }
    };

    if total_pages == 0 {
        return Ok(None);
    }

    let clamp = |page: i64| page.clamp(1, i64::from(total_pages)) as u32;
    let (start, end) = (clamp(start), clamp(end));
    let (start, end) = if start <= end { (start, end) } else { (end, start) };

    Ok(PageRange::new(start, end))
}

/// Like [`resolve`], but an invalid selector logs a warning and selects all
/// pages instead of failing.
pub fn resolve_or_all(range_spec: Option<&str>, total_pages: u32) -> Option<PageRange> {
    match resolve(range_spec, total_pages) {
        Ok(range) => range,
        Err(err) => {
            warn!(%err, "ignoring page selector, processing all pages");
            None
        }
    }
}

fn parse_page(part: &str, spec: &str) -> Result<i64> {
    part.trim().parse::<i64>().map_err(|_| {
        PageliftError::Validation(format!(
            "invalid page range '{spec}': expected a page number or 'start-end'"
        ))
    })
}
