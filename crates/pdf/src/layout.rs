//! Groups positioned glyphs into lines, spans and blocks, and searches them.

use pdforge_core::{BlockKind, Rect, SpanColor, StructuredText, TextBlock, TextLine, TextSpan};

use crate::content::{Glyph, PageScan, PlacementKind};

/// Horizontal gap, in font sizes, read as a word break.
const SPACE_GAP: f32 = 0.25;
/// Baseline shift, in font sizes, that starts a new line.
const LINE_SHIFT: f32 = 0.3;
/// Baseline distance, in font sizes, that starts a new block.
const BLOCK_GAP: f32 = 2.0;

#[derive(Debug, Clone)]
struct LineChar<'a> {
    text: String,
    bbox: Rect,
    /// `None` for word breaks inferred from glyph spacing.
    glyph: Option<&'a Glyph>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Line<'a> {
    chars: Vec<LineChar<'a>>,
}

impl<'a> Line<'a> {
    fn last_glyph(&self) -> Option<&'a Glyph> {
        self.chars.iter().rev().find_map(|c| c.glyph)
    }

    fn first_glyph(&self) -> Option<&'a Glyph> {
        self.chars.iter().find_map(|c| c.glyph)
    }

    fn bbox(&self) -> Rect {
        union_all(self.chars.iter().map(|c| c.bbox)).unwrap_or_default()
    }

    fn push(&mut self, glyph: &'a Glyph) {
        if let Some(prev) = self.last_glyph() {
            let gap = glyph.bbox.x0 - prev.bbox.x1;
            let breaks = prev.text.ends_with(char::is_whitespace) || glyph.text.starts_with(char::is_whitespace);
            if gap > SPACE_GAP * prev.size.max(glyph.size) && !breaks {
                self.chars.push(LineChar {
                    text: " ".to_string(),
                    bbox: Rect::new(prev.bbox.x1, prev.bbox.y0, glyph.bbox.x0, prev.bbox.y1),
                    glyph: None,
                });
            }
        }
        self.chars.push(LineChar {
            text: glyph.text.clone(),
            bbox: glyph.bbox,
            glyph: Some(glyph),
        });
    }

    fn spans(&self) -> Vec<TextSpan> {
        let mut spans: Vec<TextSpan> = Vec::new();
        let mut current: Option<&Glyph> = None;
        for ch in &self.chars {
            if let Some(glyph) = ch.glyph {
                if current.map_or(true, |cur| !same_style(glyph, cur)) {
                    current = Some(glyph);
                    spans.push(TextSpan {
                        text: String::new(),
                        font: glyph.font.clone(),
                        size: Some(glyph.size),
                        color: Some(SpanColor::Normalized(glyph.color)),
                        bbox: ch.bbox,
                        origin: Some(glyph.origin),
                    });
                }
            }
            if let Some(span) = spans.last_mut() {
                span.text.push_str(&ch.text);
                span.bbox = span.bbox.union(&ch.bbox);
            }
        }
        spans
    }
}

fn same_style(a: &Glyph, b: &Glyph) -> bool {
    a.font == b.font && (a.size * 10.0).round() == (b.size * 10.0).round() && a.color == b.color
}

fn union_all(rects: impl Iterator<Item = Rect>) -> Option<Rect> {
    rects.reduce(|acc, r| acc.union(&r))
}

fn continues_line(prev: &Glyph, next: &Glyph) -> bool {
    let tolerance = (LINE_SHIFT * prev.size.max(next.size)).max(1.0);
    (next.origin.y - prev.origin.y).abs() <= tolerance && next.origin.x >= prev.origin.x - tolerance
}

/// Lines in content order.
pub(crate) fn build_lines(scan: &PageScan) -> Vec<Line<'_>> {
    let mut lines: Vec<Line<'_>> = Vec::new();
    for glyph in scan.shows.iter().flat_map(|s| s.glyphs()) {
        match lines.last_mut() {
            Some(line) if line.last_glyph().map_or(true, |prev| continues_line(prev, glyph)) => {
                line.push(glyph)
            }
            _ => {
                let mut line = Line::default();
                line.push(glyph);
                lines.push(line);
            }
        }
    }
    lines
}

fn starts_block(prev: &Line<'_>, next: &Line<'_>) -> bool {
    match (prev.first_glyph(), next.first_glyph()) {
        (Some(a), Some(b)) => {
            let drop = b.origin.y - a.origin.y;
            drop < 0.0 || drop > BLOCK_GAP * a.size.max(b.size)
        }
        _ => true,
    }
}

/// Structured text of a scanned page: text blocks in content order followed
/// by one empty block per drawn image.
pub(crate) fn structured_text(scan: &PageScan) -> StructuredText {
    let lines = build_lines(scan);
    let mut blocks: Vec<TextBlock> = Vec::new();
    let mut prev: Option<&Line<'_>> = None;

    for line in &lines {
        let text_line = TextLine {
            bbox: line.bbox(),
            spans: line.spans(),
        };
        let new_block = prev.map_or(true, |p| starts_block(p, line));
        match blocks.last_mut() {
            Some(block) if !new_block => {
                block.bbox = block.bbox.union(&text_line.bbox);
                block.lines.push(text_line);
            }
            _ => blocks.push(TextBlock {
                kind: BlockKind::Text,
                bbox: text_line.bbox,
                lines: vec![text_line],
            }),
        }
        prev = Some(line);
    }

    blocks.extend(
        scan.placements
            .iter()
            .filter(|p| p.kind == PlacementKind::Image)
            .map(|p| TextBlock {
                kind: BlockKind::Image,
                bbox: p.bbox,
                lines: Vec::new(),
            }),
    );
    StructuredText { blocks }
}

/// Case-insensitive, non-overlapping matches of `query`, one rectangle per
/// hit. Matches do not cross line boundaries.
pub(crate) fn search(scan: &PageScan, query: &str) -> Vec<Rect> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut hits = Vec::new();
    for line in build_lines(scan) {
        let mut haystack = String::new();
        let mut starts = Vec::with_capacity(line.chars.len());
        for ch in &line.chars {
            starts.push(haystack.len());
            haystack.push_str(&ch.text.to_lowercase());
        }

        for (start, matched) in haystack.match_indices(&needle) {
            let end = start + matched.len();
            let rect = union_all(
                line.chars
                    .iter()
                    .zip(&starts)
                    .filter(|(ch, &pos)| pos >= start && pos < end && !ch.text.is_empty())
                    .map(|(ch, _)| ch.bbox),
            );
            if let Some(rect) = rect {
                hits.push(rect);
            }
        }
    }
    hits
}
