// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Language fallback.
//
// A request such as `chi_sim+eng` is tried as a whole, then narrowed to the
// installed subset, then replaced by English. Resolution never fails.

use std::collections::BTreeSet;

/// Language used when nothing requested is installed.
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Which step of the fallback chain produced the effective language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageSource {
    /// Every requested component is available.
    Requested,
    /// Only some components are available; the rest were dropped.
    Subset,
    /// Nothing requested is available.
    Default,
}

/// Outcome of [`resolve_language`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageChoice {
    /// Effective `+`-joined tag to pass to the engine.
    pub tag: String,
    pub source: LanguageSource,
    /// Requested components that are not installed.
    pub missing: Vec<String>,
}

impl LanguageChoice {
    pub fn is_fallback(&self) -> bool {
        self.source != LanguageSource::Requested
    }
}

/// Pick the effective language for `requested` given the installed packs.
///
/// Components keep their requested order. A blank request resolves to
/// [`DEFAULT_LANGUAGE`].
pub fn resolve_language(requested: &str, available: &BTreeSet<String>) -> LanguageChoice {
    let parts: Vec<&str> = requested
        .split('+')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

    let (present, missing): (Vec<&str>, Vec<&str>) =
        parts.into_iter().partition(|part| available.contains(*part));
    let missing: Vec<String> = missing.into_iter().map(str::to_string).collect();

    if !present.is_empty() && missing.is_empty() {
        return LanguageChoice {
            tag: present.join("+"),
            source: LanguageSource::Requested,
            missing,
        };
    }
    if !present.is_empty() {
        return LanguageChoice {
            tag: present.join("+"),
            source: LanguageSource::Subset,
            missing,
        };
    }
    LanguageChoice {
        tag: DEFAULT_LANGUAGE.to_string(),
        source: LanguageSource::Default,
        missing,
    }
}
