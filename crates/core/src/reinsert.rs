//! Reinsertion of replacement text with overflow shrinking.

use crate::document::{Document, SpanColor, TextInsertion};
use crate::font::FontMatcher;
use crate::task::ReplacementTask;
use crate::Result;

/// Font size that keeps `measured_width` inside `available_width`.
///
/// Shrinks proportionally when the text overflows a box of positive width;
/// never grows the size.
pub fn fit_font_size(size: f32, measured_width: f32, available_width: f32) -> f32 {
    if measured_width > available_width && available_width > 0.0 {
        size * (available_width / measured_width)
    } else {
        size
    }
}

/// Normalized RGB for a span color. Packed values are `0xRRGGBB`.
pub fn resolve_color(color: SpanColor) -> [f32; 3] {
    match color {
        SpanColor::Normalized(rgb) => rgb,
        SpanColor::Packed(v) => [
            ((v >> 16) & 0xFF) as f32 / 255.0,
            ((v >> 8) & 0xFF) as f32 / 255.0,
            (v & 0xFF) as f32 / 255.0,
        ],
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AutoFitReinserter {
    matcher: FontMatcher,
}

impl AutoFitReinserter {
    pub fn new(matcher: FontMatcher) -> Self {
        Self { matcher }
    }

    /// Draw the task's replacement text at its baseline origin.
    ///
    /// Returns the insertion actually issued to the document.
    pub fn reinsert<D: Document + ?Sized>(&self, doc: &mut D, page: usize, task: &ReplacementTask) -> Result<TextInsertion> {
        let font = self.matcher.map_to_substitute(&task.attrs.font);
        let original_size = task.attrs.size;
        let measured = doc.measure_text_width(&task.replacement_text, font, original_size)?;
        let available = task.target_rect.width();
        let size = fit_font_size(original_size, measured, available);

        if size < original_size {
            log::debug!(
                "[Reinsert] {:?} is {:.2}pt wide in a {:.2}pt box, shrinking {:.2} -> {:.2}",
                task.replacement_text,
                measured,
                available,
                original_size,
                size
            );
        }

        let insertion = TextInsertion {
            origin: task.origin,
            text: task.replacement_text.clone(),
            font,
            size,
            color: resolve_color(task.attrs.color),
        };
        doc.insert_text(page, &insertion)?;
        Ok(insertion)
    }
}
