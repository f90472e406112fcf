//! Post-processing verification checks.
//!
//! Reloads a saved output and reports, for every search/replace pair, where
//! the search text survived and where the replacement shows up.

use std::path::Path;

use pdforge_core::{Document, Result, SearchReplacePair};
use serde::{Deserialize, Serialize};

/// Findings for one search/replace pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairCheck {
    pub search: String,
    pub replacement: String,
    /// Pages where the search text is still visible.
    pub pages_with_search: Vec<usize>,
    pub pages_with_replacement: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyReport {
    /// False when any search text survived.
    pub ok: bool,
    pub warnings: Vec<String>,
    pub checks: Vec<PairCheck>,
}

fn count(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        0
    } else {
        haystack.matches(needle).count()
    }
}

/// Occurrences of `search` in `text` that are not part of a `replacement`.
fn surviving(text: &str, search: &str, replacement: &str) -> usize {
    let inside_replacement = count(text, replacement) * count(replacement, search);
    count(text, search).saturating_sub(inside_replacement)
}

/// Check an already loaded document.
pub fn verify_document<D: Document + ?Sized>(
    doc: &D,
    pairs: &[SearchReplacePair],
    case_sensitive: bool,
) -> Result<VerifyReport> {
    let fold = |s: &str| {
        if case_sensitive {
            s.to_string()
        } else {
            s.to_lowercase()
        }
    };

    let mut texts = Vec::with_capacity(doc.page_count());
    for page in 0..doc.page_count() {
        texts.push(fold(&doc.structured_text(page)?.plain_text()));
    }

    let mut report = VerifyReport {
        ok: true,
        ..Default::default()
    };
    for pair in pairs.iter().filter(|p| !p.search.is_empty()) {
        let (search, replacement) = (fold(&pair.search), fold(&pair.replacement));
        let mut check = PairCheck {
            search: pair.search.clone(),
            replacement: pair.replacement.clone(),
            ..Default::default()
        };
        for (page, text) in texts.iter().enumerate() {
            if surviving(text, &search, &replacement) > 0 {
                check.pages_with_search.push(page);
            }
            if count(text, &replacement) > 0 {
                check.pages_with_replacement.push(page);
            }
        }

        if !check.pages_with_search.is_empty() {
            report.ok = false;
            report.warnings.push(format!(
                "\"{}\" still present on page(s) {:?}",
                pair.search, check.pages_with_search
            ));
        }
        if !pair.replacement.is_empty() && check.pages_with_replacement.is_empty() {
            report.warnings.push(format!("replacement \"{}\" not found in output", pair.replacement));
        }
        report.checks.push(check);
    }

    for warning in &report.warnings {
        log::warn!("[Verify] {}", warning);
    }
    log::info!(
        "[Verify] {} pair(s) over {} page(s): {}",
        report.checks.len(),
        texts.len(),
        if report.ok { "ok" } else { "search text survived" }
    );
    Ok(report)
}

/// Load `path` with backend `D` and check it.
pub fn verify_output<D: Document>(
    path: &Path,
    pairs: &[SearchReplacePair],
    case_sensitive: bool,
) -> Result<VerifyReport> {
    let doc = D::load(path)?;
    verify_document(&doc, pairs, case_sensitive)
}
