//! `lopdf` backend for the replacement engine.
//!
//! [`PdfDocument`] interprets page content streams to find text, rewrites
//! them to clear marked regions and appends new text objects drawn with the
//! standard substitute fonts.

mod cmap;
mod content;
mod error;
mod fonts;
mod insert;
mod layout;
mod metrics;
mod removal;
mod utils;

pub use error::{PdfError, PdfResult};
pub use metrics::substitute_text_width;

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use lopdf::content::Content;
use lopdf::ObjectId;
use pdforge_core::{
    CoreError, Document, Rect, RemovalOptions, StructuredText, SubstituteFont, TextInsertion,
};

use content::{scan_page, PageScan, PageSpace};
use insert::{encode_operations, text_operations, FontRegistry};
use utils::{append_page_content, get_media_box, get_page_content, set_page_content};

type CoreResult<T> = pdforge_core::Result<T>;

/// A PDF file held in memory.
#[derive(Debug)]
pub struct PdfDocument {
    inner: lopdf::Document,
    page_ids: Vec<ObjectId>,
    /// Regions marked per page, waiting for `apply_removal`.
    pending: BTreeMap<usize, Vec<Rect>>,
    /// Pages whose original content is already isolated in `q`/`Q`.
    wrapped: HashSet<usize>,
    fonts: FontRegistry,
}

impl PdfDocument {
    pub fn from_document(inner: lopdf::Document) -> PdfResult<Self> {
        if inner.trailer.get(b"Encrypt").is_ok() {
            return Err(PdfError::Encrypted);
        }
        let page_ids = inner.get_pages().into_values().collect();
        Ok(Self {
            inner,
            page_ids,
            pending: BTreeMap::new(),
            wrapped: HashSet::new(),
            fonts: FontRegistry::default(),
        })
    }

    pub fn open(path: &Path) -> PdfResult<Self> {
        Self::from_document(lopdf::Document::load(path)?)
    }

    pub fn load_mem(bytes: &[u8]) -> PdfResult<Self> {
        Self::from_document(lopdf::Document::load_mem(bytes)?)
    }

    pub fn inner(&self) -> &lopdf::Document {
        &self.inner
    }

    /// Plain text of a page, one line per text line.
    pub fn page_text(&self, page: usize) -> CoreResult<String> {
        Ok(self.structured_text(page)?.plain_text())
    }

    fn page_id(&self, page: usize) -> CoreResult<ObjectId> {
        self.page_ids.get(page).copied().ok_or(CoreError::PageOutOfRange {
            page,
            count: self.page_ids.len(),
        })
    }

    fn space(&self, page_id: ObjectId) -> PageSpace {
        PageSpace::new(get_media_box(&self.inner, page_id))
    }

    fn scan(&self, page: usize) -> CoreResult<PageScan> {
        let page_id = self.page_id(page)?;
        let data = get_page_content(&self.inner, page_id)?;
        let content = Content::decode(&data).map_err(PdfError::from)?;
        let fonts = fonts::load_page_fonts(&self.inner, page_id);
        Ok(scan_page(content.operations, &fonts, self.space(page_id)))
    }

    /// Isolate the page's existing content so its graphics state cannot leak
    /// into text appended after it.
    fn wrap_original(&mut self, page: usize, page_id: ObjectId) -> PdfResult<()> {
        if !self.wrapped.insert(page) {
            return Ok(());
        }
        let original = get_page_content(&self.inner, page_id)?;
        let mut wrapped = Vec::with_capacity(original.len() + 6);
        wrapped.extend_from_slice(b"q\n");
        wrapped.extend(original);
        wrapped.extend_from_slice(b"\nQ\n");
        set_page_content(&mut self.inner, page_id, wrapped)
    }
}

impl Document for PdfDocument {
    fn load(path: &Path) -> CoreResult<Self> {
        log::info!("[PdfDocument] loading {}", path.display());
        Self::open(path).map_err(|e| CoreError::Backend(format!("{}: {}", path.display(), e)))
    }

    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn search_text(&self, page: usize, query: &str) -> CoreResult<Vec<Rect>> {
        let scan = self.scan(page)?;
        Ok(layout::search(&scan, query))
    }

    fn structured_text(&self, page: usize) -> CoreResult<StructuredText> {
        let scan = self.scan(page)?;
        Ok(layout::structured_text(&scan))
    }

    fn mark_for_removal(&mut self, page: usize, rect: Rect) -> CoreResult<()> {
        self.page_id(page)?;
        if !rect.is_valid() {
            return Err(CoreError::InvalidRect(rect));
        }
        self.pending.entry(page).or_default().push(rect);
        Ok(())
    }

    fn apply_removal(&mut self, page: usize, options: RemovalOptions) -> CoreResult<()> {
        let page_id = self.page_id(page)?;
        let Some(rects) = self.pending.remove(&page) else {
            return Ok(());
        };

        let scan = self.scan(page)?;
        let removal = removal::remove_regions(&scan, &rects, options);
        log::debug!(
            "[PdfDocument] page {}: {} region(s) cleared {} glyph(s), {} image(s), {} path(s)",
            page,
            rects.len(),
            removal.glyphs,
            removal.images,
            removal.paths
        );
        if !removal.changed() {
            log::warn!("[PdfDocument] page {}: marked regions covered no content", page);
            return Ok(());
        }

        let data = encode_operations(removal.operations)?;
        set_page_content(&mut self.inner, page_id, data)?;
        Ok(())
    }

    fn measure_text_width(&self, text: &str, font: SubstituteFont, size: f32) -> CoreResult<f32> {
        Ok(substitute_text_width(text, font, size))
    }

    fn insert_text(&mut self, page: usize, insertion: &TextInsertion) -> CoreResult<()> {
        let page_id = self.page_id(page)?;
        self.wrap_original(page, page_id)?;
        let resource = self.fonts.register(&mut self.inner, page_id, insertion.font)?;
        let operations = text_operations(&resource, insertion, self.space(page_id));
        append_page_content(&mut self.inner, page_id, encode_operations(operations)?)?;
        log::debug!(
            "[PdfDocument] page {}: drew {:?} in {} at {:.1}pt",
            page,
            insertion.text,
            insertion.font.base_font(),
            insertion.size
        );
        Ok(())
    }

    fn save(&mut self, output: &Path) -> CoreResult<()> {
        let pruned = self.inner.prune_objects();
        self.inner.compress();
        self.inner.save(output).map_err(PdfError::from)?;
        log::info!(
            "[PdfDocument] saved {} ({} unused object(s) pruned)",
            output.display(),
            pruned.len()
        );
        Ok(())
    }
}
