//! Visual occurrence lookup.

use crate::document::{Document, Rect};
use crate::{CoreError, Result};

/// Asks the document for every rectangle where a string is drawn.
///
/// The returned list is the authoritative set of replacement sites for a
/// page: one task per rectangle, in the backend's search order.
#[derive(Debug, Clone, Copy, Default)]
pub struct RectLocator;

impl RectLocator {
    pub fn new() -> Self {
        Self
    }

    /// An empty `search` never matches anything and is not forwarded to the backend.
    pub fn locate<D: Document + ?Sized>(&self, doc: &D, page: usize, search: &str) -> Result<Vec<Rect>> {
        if search.is_empty() {
            return Ok(Vec::new());
        }
        let rects = doc.search_text(page, search)?;
        if let Some(bad) = rects.iter().find(|r| !r.is_valid()) {
            return Err(CoreError::InvalidRect(*bad));
        }
        Ok(rects)
    }
}
