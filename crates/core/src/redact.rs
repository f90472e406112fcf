//! Batched region removal.

use crate::document::{Document, RemovalOptions};
use crate::task::ReplacementTask;
use crate::Result;

/// Marks every task rectangle of a page and clears them in one pass.
///
/// Applying once per page keeps overlapping rectangles from different pairs
/// from interfering with each other: all regions are known before anything
/// is removed.
#[derive(Debug, Clone, Copy)]
pub struct RedactionBatcher {
    options: RemovalOptions,
}

impl Default for RedactionBatcher {
    fn default() -> Self {
        Self {
            options: RemovalOptions::text_only(),
        }
    }
}

impl RedactionBatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` without touching the document when `tasks` is empty.
    pub fn apply<D: Document + ?Sized>(&self, doc: &mut D, page: usize, tasks: &[ReplacementTask]) -> Result<bool> {
        if tasks.is_empty() {
            return Ok(false);
        }
        for task in tasks {
            doc.mark_for_removal(page, task.target_rect)?;
        }
        doc.apply_removal(page, self.options)?;
        log::debug!("[Redact] page {}: cleared {} region(s)", page, tasks.len());
        Ok(true)
    }
}
