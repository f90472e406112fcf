//! Page-by-page search and replace.
//!
//! For each page: locate every pair's rectangles, join them with the spans
//! they came from, clear all regions in one batched removal, then redraw each
//! replacement. The document is saved once, after the last page.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::collect::{OccurrenceCollector, SpanAttrs};
use crate::config::EditorConfig;
use crate::document::{Document, StructuredText};
use crate::locate::RectLocator;
use crate::redact::RedactionBatcher;
use crate::reinsert::AutoFitReinserter;
use crate::task::{build_tasks, ReplacementTask};
use crate::{CoreError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchReplacePair {
    pub search: String,
    pub replacement: String,
}

impl SearchReplacePair {
    pub fn new(search: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            replacement: replacement.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceResult {
    pub total_replacements: usize,
    /// Zero-based, ascending
    pub pages_affected: Vec<usize>,
    pub output: PathBuf,
}

/// Per-page phase a replacement run was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Collecting,
    Redacting,
    Reinserting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Collecting => "collecting",
            Stage::Redacting => "redacting",
            Stage::Reinserting => "reinserting",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct TextReplacer {
    defaults: SpanAttrs,
    locator: RectLocator,
    collector: OccurrenceCollector,
    batcher: RedactionBatcher,
    reinserter: AutoFitReinserter,
}

impl Default for TextReplacer {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl TextReplacer {
    pub fn new(config: &EditorConfig) -> Self {
        let defaults = config.default_attrs();
        Self {
            collector: OccurrenceCollector::new(defaults.clone()),
            defaults,
            locator: RectLocator::new(),
            batcher: RedactionBatcher::new(),
            reinserter: AutoFitReinserter::default(),
        }
    }

    /// Replace every pair on every page of `doc` and save it to `output`.
    ///
    /// Any collaborator failure aborts the run before anything is saved.
    /// An empty `pairs` list is a successful run with zero replacements.
    pub fn replace_text<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        pairs: &[SearchReplacePair],
        output: &Path,
        case_sensitive: bool,
    ) -> Result<ReplaceResult> {
        let mut total_replacements = 0;
        let mut pages_affected = Vec::new();

        for page in 0..doc.page_count() {
            let tasks = self
                .page_tasks(doc, page, pairs, case_sensitive)
                .map_err(|e| failed(page, Stage::Collecting, e))?;
            if tasks.is_empty() {
                continue;
            }

            self.batcher
                .apply(doc, page, &tasks)
                .map_err(|e| failed(page, Stage::Redacting, e))?;
            for task in &tasks {
                self.reinserter
                    .reinsert(doc, page, task)
                    .map_err(|e| failed(page, Stage::Reinserting, e))?;
            }

            log::debug!("[Replace] page {}: {} replacement(s)", page, tasks.len());
            total_replacements += tasks.len();
            pages_affected.push(page);
        }

        doc.save(output).map_err(|e| CoreError::Save {
            path: output.to_path_buf(),
            source: Box::new(e),
        })?;

        log::info!(
            "[Replace] {} replacement(s) on {} page(s), saved to {}",
            total_replacements,
            pages_affected.len(),
            output.display()
        );

        Ok(ReplaceResult {
            total_replacements,
            pages_affected,
            output: output.to_path_buf(),
        })
    }

    /// Tasks for one page, pairs in input order and rectangles in locator order.
    fn page_tasks<D: Document + ?Sized>(
        &self,
        doc: &D,
        page: usize,
        pairs: &[SearchReplacePair],
        case_sensitive: bool,
    ) -> Result<Vec<ReplacementTask>> {
        let mut structured: Option<StructuredText> = None;
        let mut tasks = Vec::new();

        for pair in pairs {
            let rects = self.locator.locate(doc, page, &pair.search)?;
            if rects.is_empty() {
                continue;
            }
            if structured.is_none() {
                structured = Some(doc.structured_text(page)?);
            }
            let occurrences = match &structured {
                Some(text) => self.collector.collect(text, &pair.search, case_sensitive),
                None => Vec::new(),
            };
            tasks.extend(build_tasks(&pair.replacement, &rects, &occurrences, &self.defaults));
        }
        Ok(tasks)
    }
}

fn failed(page: usize, stage: Stage, source: CoreError) -> CoreError {
    log::error!("[Replace] page {} failed while {}: {}", page, stage, source);
    CoreError::Replace {
        page,
        stage,
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Point, Rect, SpanColor, TextSpan};
    use crate::font::SubstituteFont;
    use crate::testing::{Call, FakeDocument, FakePage};

    fn span(text: &str, font: &str, size: f32, x: f32, y: f32) -> TextSpan {
        TextSpan {
            text: text.to_string(),
            font: Some(font.to_string()),
            size: Some(size),
            color: Some(SpanColor::Packed(0x000080)),
            bbox: Rect::new(x, y - size, x + 200.0, y + 2.0),
            origin: Some(Point::new(x, y)),
        }
    }

    fn out() -> PathBuf {
        PathBuf::from("/tmp/out.pdf")
    }

    fn saved(doc: &FakeDocument) -> usize {
        doc.calls().iter().filter(|c| matches!(c, Call::Save { .. })).count()
    }

    #[test]
    fn test_replace_counts_every_rectangle() {
        let mut doc = FakeDocument::new(vec![
            FakePage::new()
                .with_hits(
                    "PDForge",
                    vec![Rect::new(50.0, 88.0, 100.0, 102.0), Rect::new(50.0, 188.0, 100.0, 202.0)],
                )
                .with_span(span("Made with PDForge", "Helvetica", 12.0, 50.0, 100.0))
                .with_span(span("PDForge rocks", "Helvetica", 12.0, 50.0, 200.0)),
            FakePage::new(),
            FakePage::new().with_hits("PDForge", vec![Rect::new(10.0, 10.0, 60.0, 22.0)]),
        ]);
        let pairs = [SearchReplacePair::new("PDForge", "TestApp")];
        let result = TextReplacer::default()
            .replace_text(&mut doc, &pairs, &out(), false)
            .unwrap();

        assert_eq!(result.total_replacements, 3);
        assert_eq!(result.pages_affected, vec![0, 2]);
        assert_eq!(result.output, out());
        assert_eq!(doc.apply_count(0), 1);
        assert_eq!(doc.apply_count(1), 0);
        assert_eq!(doc.apply_count(2), 1);
        assert_eq!(doc.insertions().len(), 3);
        assert_eq!(saved(&doc), 1);
    }

    #[test]
    fn test_no_match_leaves_page_untouched() {
        let mut doc = FakeDocument::new(vec![FakePage::new()
            .with_span(span("hello", "Helvetica", 12.0, 0.0, 20.0))]);
        let pairs = [SearchReplacePair::new("xyz_not_present", "abc")];
        let result = TextReplacer::default()
            .replace_text(&mut doc, &pairs, &out(), false)
            .unwrap();

        assert_eq!(result.total_replacements, 0);
        assert!(result.pages_affected.is_empty());
        assert_eq!(doc.apply_count(0), 0);
        assert!(doc.insertions().is_empty());
        assert!(!doc.calls().iter().any(|c| matches!(c, Call::StructuredText { .. })));
        assert_eq!(saved(&doc), 1);
    }

    #[test]
    fn test_overlapping_pairs_share_one_removal() {
        let mut doc = FakeDocument::new(vec![FakePage::new()
            .with_hits("PDForge", vec![Rect::new(50.0, 88.0, 100.0, 102.0)])
            .with_hits("Forge", vec![Rect::new(70.0, 88.0, 100.0, 102.0)])
            .with_span(span("PDForge", "Helvetica", 12.0, 50.0, 100.0))]);
        let pairs = [
            SearchReplacePair::new("PDForge", "TestApp"),
            SearchReplacePair::new("Forge", "Smith"),
        ];
        let result = TextReplacer::default()
            .replace_text(&mut doc, &pairs, &out(), true)
            .unwrap();

        assert_eq!(result.total_replacements, 2);
        assert_eq!(doc.apply_count(0), 1);

        // all marks precede the single apply, which precedes every insertion
        let calls = doc.calls();
        let apply_at = calls.iter().position(|c| matches!(c, Call::Apply { .. })).unwrap();
        let marks: Vec<usize> = calls
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, Call::Mark { .. }))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(marks.len(), 2);
        assert!(marks.iter().all(|&i| i < apply_at));
        assert!(calls
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c, Call::Insert { .. }))
            .all(|(i, _)| i > apply_at));
    }

    #[test]
    fn test_insertion_order_follows_pairs_then_locator() {
        let mut doc = FakeDocument::new(vec![FakePage::new()
            .with_hits("b", vec![Rect::new(0.0, 40.0, 60.0, 52.0), Rect::new(0.0, 10.0, 60.0, 22.0)])
            .with_hits("a", vec![Rect::new(0.0, 70.0, 60.0, 82.0)])]);
        let pairs = [SearchReplacePair::new("b", "B"), SearchReplacePair::new("a", "A")];
        TextReplacer::default()
            .replace_text(&mut doc, &pairs, &out(), true)
            .unwrap();

        let origins: Vec<(String, Point)> = doc
            .insertions()
            .into_iter()
            .map(|(_, ins)| (ins.text, ins.origin))
            .collect();
        assert_eq!(
            origins,
            vec![
                ("B".to_string(), Point::new(0.0, 52.0)),
                ("B".to_string(), Point::new(0.0, 22.0)),
                ("A".to_string(), Point::new(0.0, 82.0)),
            ]
        );
    }

    #[test]
    fn test_replacement_keeps_span_typography() {
        let mut doc = FakeDocument::new(vec![FakePage::new()
            .with_hits("Old", vec![Rect::new(50.0, 88.0, 100.0, 102.0)])
            .with_span(span("Old title", "ABCDEF+Georgia-Bold", 12.0, 50.0, 100.0))]);
        let pairs = [SearchReplacePair::new("Old", "New")];
        TextReplacer::default()
            .replace_text(&mut doc, &pairs, &out(), true)
            .unwrap();

        let (page, ins) = doc.insertions().remove(0);
        assert_eq!(page, 0);
        assert_eq!(ins.size, 12.0);
        assert_eq!(ins.font, SubstituteFont::TimesRoman);
        assert_eq!(ins.origin, Point::new(50.0, 100.0));
        assert_eq!(ins.color, [0.0, 0.0, 128.0 / 255.0]);
    }

    #[test]
    fn test_overflowing_replacement_is_shrunk() {
        // "a much longer name": 18 chars * 12pt * 0.5 = 108pt into a 54pt box
        let mut doc = FakeDocument::new(vec![FakePage::new()
            .with_hits("short", vec![Rect::new(0.0, 0.0, 54.0, 14.0)])
            .with_span(span("short", "Helvetica", 12.0, 0.0, 12.0))]);
        let pairs = [SearchReplacePair::new("short", "a much longer name")];
        TextReplacer::default()
            .replace_text(&mut doc, &pairs, &out(), true)
            .unwrap();

        let (_, ins) = doc.insertions().remove(0);
        assert_eq!(ins.size, 12.0 * (54.0 / 108.0));
    }

    #[test]
    fn test_missing_spans_fall_back_to_config_defaults() {
        let config = EditorConfig {
            default_font_size: 9.0,
            default_color: 0xFF0000,
            ..EditorConfig::default()
        };
        let mut doc = FakeDocument::new(vec![FakePage::new()
            .with_hits("x", vec![Rect::new(10.0, 10.0, 60.0, 22.0)])]);
        TextReplacer::new(&config)
            .replace_text(&mut doc, &[SearchReplacePair::new("x", "y")], &out(), true)
            .unwrap();

        let (_, ins) = doc.insertions().remove(0);
        assert_eq!(ins.size, 9.0);
        assert_eq!(ins.font, SubstituteFont::Helvetica);
        assert_eq!(ins.color, [1.0, 0.0, 0.0]);
        assert_eq!(ins.origin, Point::new(10.0, 22.0));
    }

    #[test]
    fn test_empty_pairs_still_save() {
        let mut doc = FakeDocument::new(vec![FakePage::new(), FakePage::new()]);
        let result = TextReplacer::default()
            .replace_text(&mut doc, &[], &out(), false)
            .unwrap();
        assert_eq!(result.total_replacements, 0);
        assert!(result.pages_affected.is_empty());
        assert_eq!(doc.calls(), vec![Call::Save { path: out() }]);
    }

    #[test]
    fn test_collaborator_failure_aborts_without_saving() {
        let mut doc = FakeDocument::new(vec![FakePage::new()
            .with_hits("x", vec![Rect::new(10.0, 10.0, 60.0, 22.0)])])
        .failing("insert");
        let err = TextReplacer::default()
            .replace_text(&mut doc, &[SearchReplacePair::new("x", "y")], &out(), true)
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::Replace {
                page: 0,
                stage: Stage::Reinserting,
                ..
            }
        ));
        assert!(err.to_string().contains("while reinserting"));
        assert_eq!(saved(&doc), 0);
    }

    #[test]
    fn test_search_failure_reports_collecting_stage() {
        let mut doc = FakeDocument::new(vec![FakePage::new()]).failing("search");
        let err = TextReplacer::default()
            .replace_text(&mut doc, &[SearchReplacePair::new("x", "y")], &out(), true)
            .unwrap_err();
        assert!(matches!(err, CoreError::Replace { stage: Stage::Collecting, .. }));
    }

    #[test]
    fn test_save_failure_is_reported() {
        let mut doc = FakeDocument::new(vec![FakePage::new()]).failing("save");
        let err = TextReplacer::default()
            .replace_text(&mut doc, &[], &out(), false)
            .unwrap_err();
        assert!(matches!(err, CoreError::Save { ref path, .. } if path == &out()));
    }
}
