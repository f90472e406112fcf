//! Joins located rectangles with collected occurrences.

use serde::{Deserialize, Serialize};

use crate::collect::{Occurrence, SpanAttrs};
use crate::document::{Point, Rect};

/// One pending replacement on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplacementTask {
    pub replacement_text: String,
    pub target_rect: Rect,
    pub attrs: SpanAttrs,
    pub origin: Point,
}

/// Build one task per rectangle for a single search/replace pair.
///
/// Rectangle `i` takes the attributes and origin of occurrence `i`. Past the
/// end of the occurrence list it reuses the first occurrence's attributes and
/// the rectangle's bottom-left corner as origin. With no occurrences at all
/// the `defaults` apply. Rectangles are never dropped.
pub fn build_tasks(
    replacement: &str,
    rects: &[Rect],
    occurrences: &[Occurrence],
    defaults: &SpanAttrs,
) -> Vec<ReplacementTask> {
    if rects.len() != occurrences.len() {
        log::warn!(
            "[Tasks] {} rectangle(s) vs {} matching span(s); extra sites reuse the first span's style",
            rects.len(),
            occurrences.len()
        );
    }
    if occurrences.is_empty() && !rects.is_empty() {
        log::warn!("[Tasks] no span attributes found, using defaults");
    }

    let fallback_attrs = occurrences
        .first()
        .map(|o| o.attrs.clone())
        .unwrap_or_else(|| defaults.clone());

    rects
        .iter()
        .enumerate()
        .map(|(i, rect)| {
            let (attrs, origin) = match occurrences.get(i) {
                Some(occ) => (occ.attrs.clone(), occ.origin),
                None => (fallback_attrs.clone(), rect.bottom_left()),
            };
            ReplacementTask {
                replacement_text: replacement.to_string(),
                target_rect: *rect,
                attrs,
                origin,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SpanColor;

    fn attrs(font: &str, size: f32) -> SpanAttrs {
        SpanAttrs {
            font: font.to_string(),
            size,
            color: SpanColor::Packed(0xff0000),
        }
    }

    fn occurrence(font: &str, size: f32, x: f32, y: f32) -> Occurrence {
        Occurrence {
            attrs: attrs(font, size),
            origin: Point::new(x, y),
        }
    }

    fn defaults() -> SpanAttrs {
        SpanAttrs {
            font: String::new(),
            size: 11.0,
            color: SpanColor::Packed(0),
        }
    }

    #[test]
    fn test_positional_join() {
        let rects = [Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(0.0, 20.0, 10.0, 30.0)];
        let occs = [occurrence("Arial", 10.0, 1.0, 9.0), occurrence("Times", 14.0, 1.0, 29.0)];
        let tasks = build_tasks("new", &rects, &occs, &defaults());
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].attrs.font, "Arial");
        assert_eq!(tasks[1].attrs.font, "Times");
        assert_eq!(tasks[1].origin, Point::new(1.0, 29.0));
        assert_eq!(tasks[1].target_rect, rects[1]);
        assert!(tasks.iter().all(|t| t.replacement_text == "new"));
    }

    #[test]
    fn test_extra_rects_fall_back_to_first_occurrence() {
        let rects = [
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Rect::new(0.0, 20.0, 10.0, 30.0),
            Rect::new(40.0, 50.0, 70.0, 62.0),
        ];
        let occs = [occurrence("Arial", 10.0, 1.0, 9.0), occurrence("Times", 14.0, 1.0, 29.0)];
        let tasks = build_tasks("new", &rects, &occs, &defaults());
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[2].attrs, attrs("Arial", 10.0));
        assert_eq!(tasks[2].origin, Point::new(40.0, 62.0));
    }

    #[test]
    fn test_no_occurrences_uses_defaults() {
        let rects = [Rect::new(5.0, 5.0, 25.0, 17.0)];
        let tasks = build_tasks("new", &rects, &[], &defaults());
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].attrs, defaults());
        assert_eq!(tasks[0].origin, Point::new(5.0, 17.0));
    }

    #[test]
    fn test_surplus_occurrences_are_ignored() {
        let rects = [Rect::new(0.0, 0.0, 10.0, 10.0)];
        let occs = [occurrence("Arial", 10.0, 1.0, 9.0), occurrence("Times", 14.0, 1.0, 29.0)];
        assert_eq!(build_tasks("new", &rects, &occs, &defaults()).len(), 1);
    }

    #[test]
    fn test_no_rects_no_tasks() {
        let occs = [occurrence("Arial", 10.0, 1.0, 9.0)];
        assert!(build_tasks("new", &[], &occs, &defaults()).is_empty());
    }
}
