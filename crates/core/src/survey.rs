//! Document-wide font usage.

use serde::Serialize;

use crate::document::Document;
use crate::font::{FontInfo, FontMatcher};
use crate::Result;

const UNNAMED_FONT: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FontUsage {
    pub info: FontInfo,
    /// Number of non-blank spans set in this font
    pub occurrences: usize,
    pub pages: Vec<usize>,
    /// One entry per span, rounded to 0.1pt
    pub sizes: Vec<f32>,
}

impl FontUsage {
    pub fn avg_size(&self) -> f32 {
        if self.sizes.is_empty() {
            return 0.0;
        }
        self.sizes.iter().sum::<f32>() / self.sizes.len() as f32
    }

    /// `(min, max)`, or `(0.0, 0.0)` with no sizes.
    pub fn size_range(&self) -> (f32, f32) {
        if self.sizes.is_empty() {
            return (0.0, 0.0);
        }
        self.sizes
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &s| (lo.min(s), hi.max(s)))
    }
}

/// Every font used for visible text, most used first.
///
/// Ties keep the order in which fonts were first seen.
pub fn survey_fonts<D: Document + ?Sized>(doc: &D) -> Result<Vec<FontUsage>> {
    let matcher = FontMatcher::new();
    let mut usages: Vec<FontUsage> = Vec::new();

    for page in 0..doc.page_count() {
        let text = doc.structured_text(page)?;
        for span in text.text_spans() {
            if span.text.trim().is_empty() {
                continue;
            }
            let name = span.font.as_deref().unwrap_or(UNNAMED_FONT);
            let size = (span.size.unwrap_or(0.0) * 10.0).round() / 10.0;

            let idx = match usages.iter().position(|u| u.info.raw_name == name) {
                Some(idx) => idx,
                None => {
                    usages.push(FontUsage {
                        info: matcher.match_font(name),
                        occurrences: 0,
                        pages: Vec::new(),
                        sizes: Vec::new(),
                    });
                    usages.len() - 1
                }
            };
            let usage = &mut usages[idx];
            usage.occurrences += 1;
            if usage.pages.last() != Some(&page) {
                usage.pages.push(page);
            }
            usage.sizes.push(size);
        }
    }

    usages.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
    log::info!("[FontSurvey] {} distinct font(s) in use", usages.len());
    Ok(usages)
}

/// The most used font, if the document has any visible text.
pub fn dominant_font<D: Document + ?Sized>(doc: &D) -> Result<Option<FontUsage>> {
    Ok(survey_fonts(doc)?.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Rect, TextSpan};
    use crate::testing::{FakeDocument, FakePage};

    fn span(text: &str, font: Option<&str>, size: f32) -> TextSpan {
        TextSpan {
            text: text.to_string(),
            font: font.map(str::to_string),
            size: Some(size),
            bbox: Rect::new(0.0, 0.0, 10.0, 10.0),
            ..Default::default()
        }
    }

    fn doc() -> FakeDocument {
        FakeDocument::new(vec![
            FakePage::new()
                .with_span(span("Title", Some("ABCDEF+Georgia-Bold"), 18.04))
                .with_span(span("body", Some("Arial"), 10.0))
                .with_span(span("   ", Some("Courier"), 10.0)),
            FakePage::new(),
            FakePage::new()
                .with_span(span("more", Some("Arial"), 10.96))
                .with_span(span("again", Some("Arial"), 12.0))
                .with_span(span("?", None, 8.0)),
        ])
    }

    #[test]
    fn test_survey_groups_and_orders() {
        let usages = survey_fonts(&doc()).unwrap();
        let names: Vec<&str> = usages.iter().map(|u| u.info.raw_name.as_str()).collect();
        assert_eq!(names, vec!["Arial", "ABCDEF+Georgia-Bold", "unknown"]);

        let arial = &usages[0];
        assert_eq!(arial.occurrences, 3);
        assert_eq!(arial.pages, vec![0, 2]);
        assert_eq!(arial.sizes, vec![10.0, 11.0, 12.0]);
        assert_eq!(arial.info.family, "helvetica");

        assert!(usages[1].info.is_bold);
        assert_eq!(usages[1].sizes, vec![18.0]);
    }

    #[test]
    fn test_blank_spans_are_skipped() {
        let usages = survey_fonts(&doc()).unwrap();
        assert!(usages.iter().all(|u| u.info.raw_name != "Courier"));
    }

    #[test]
    fn test_size_statistics() {
        let usages = survey_fonts(&doc()).unwrap();
        assert!((usages[0].avg_size() - 11.0).abs() < 1e-5);
        assert_eq!(usages[0].size_range(), (10.0, 12.0));

        let empty = FontUsage {
            info: FontMatcher::new().match_font(""),
            occurrences: 0,
            pages: Vec::new(),
            sizes: Vec::new(),
        };
        assert_eq!(empty.avg_size(), 0.0);
        assert_eq!(empty.size_range(), (0.0, 0.0));
    }

    #[test]
    fn test_dominant_font() {
        let top = dominant_font(&doc()).unwrap().unwrap();
        assert_eq!(top.info.raw_name, "Arial");

        let blank = FakeDocument::new(vec![FakePage::new()]);
        assert!(dominant_font(&blank).unwrap().is_none());
    }

    #[test]
    fn test_backend_failure_propagates() {
        let failing = FakeDocument::new(vec![FakePage::new()]).failing("structured_text");
        assert!(survey_fonts(&failing).is_err());
    }
}
