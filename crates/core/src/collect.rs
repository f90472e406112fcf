//! Span-level occurrence collection.
//!
//! Walks a page's structured text and reports every span containing the
//! search string, carrying the span's typographic attributes and baseline
//! origin. One occurrence per matching span, regardless of how many times the
//! string appears inside it.

use serde::{Deserialize, Serialize};

use crate::document::{Point, SpanColor, StructuredText, TextSpan};

/// Resolved typographic attributes of a span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanAttrs {
    /// Raw font name as found in the document, possibly empty
    pub font: String,
    pub size: f32,
    pub color: SpanColor,
}

impl SpanAttrs {
    /// Fill every attribute the span lacks from `defaults`.
    pub fn from_span(span: &TextSpan, defaults: &SpanAttrs) -> Self {
        Self {
            font: span.font.clone().unwrap_or_else(|| defaults.font.clone()),
            size: span.size.unwrap_or(defaults.size),
            color: span.color.unwrap_or(defaults.color),
        }
    }
}

/// A span matched as containing a search string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    pub attrs: SpanAttrs,
    /// Baseline origin of the whole span.
    pub origin: Point,
}

#[derive(Debug, Clone)]
pub struct OccurrenceCollector {
    defaults: SpanAttrs,
}

impl OccurrenceCollector {
    pub fn new(defaults: SpanAttrs) -> Self {
        Self { defaults }
    }

    /// Occurrences of `search` in `text`, in block/line/span order.
    ///
    /// Case-insensitive matching lowercases both sides; otherwise the test is
    /// an exact substring check. No match yields an empty list.
    pub fn collect(&self, text: &StructuredText, search: &str, case_sensitive: bool) -> Vec<Occurrence> {
        let needle = if case_sensitive {
            search.to_string()
        } else {
            search.to_lowercase()
        };

        text.text_spans()
            .filter(|span| {
                if case_sensitive {
                    span.text.contains(&needle)
                } else {
                    span.text.to_lowercase().contains(&needle)
                }
            })
            .map(|span| Occurrence {
                attrs: SpanAttrs::from_span(span, &self.defaults),
                origin: span.origin.unwrap_or_else(|| span.bbox.bottom_left()),
            })
            .collect()
    }
}
