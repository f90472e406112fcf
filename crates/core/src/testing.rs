//! In-memory `Document` that records every collaborator call.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::document::{
    BlockKind, Document, Rect, RemovalOptions, StructuredText, TextBlock, TextInsertion, TextLine,
    TextSpan,
};
use crate::font::SubstituteFont;
use crate::{CoreError, Result};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Search { page: usize, query: String },
    StructuredText { page: usize },
    Mark { page: usize, rect: Rect },
    Apply { page: usize, options: RemovalOptions },
    Measure { text: String, font: SubstituteFont, size: f32 },
    Insert { page: usize, insertion: TextInsertion },
    Save { path: PathBuf },
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FakePage {
    hits: HashMap<String, Vec<Rect>>,
    text: StructuredText,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hits(mut self, query: &str, rects: Vec<Rect>) -> Self {
        self.hits.insert(query.to_string(), rects);
        self
    }

    /// Append a span to the page's single text block, one line per span.
    pub fn with_span(mut self, span: TextSpan) -> Self {
        if self.text.blocks.is_empty() {
            self.text.blocks.push(TextBlock {
                kind: BlockKind::Text,
                bbox: Rect::default(),
                lines: Vec::new(),
            });
        }
        self.text.blocks[0].lines.push(TextLine {
            bbox: span.bbox,
            spans: vec![span],
        });
        self
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeDocument {
    pages: Vec<FakePage>,
    calls: RefCell<Vec<Call>>,
    /// Rendered width of one character at size 1.
    char_width: f32,
    fail_on: Option<&'static str>,
}

impl FakeDocument {
    pub fn new(pages: Vec<FakePage>) -> Self {
        Self {
            pages,
            calls: RefCell::new(Vec::new()),
            char_width: 0.5,
            fail_on: None,
        }
    }

    pub fn with_char_width(mut self, width: f32) -> Self {
        self.char_width = width;
        self
    }

    /// Make the named operation (`"search"`, `"apply"`, `"insert"`, `"save"`, ...) fail.
    pub fn failing(mut self, op: &'static str) -> Self {
        self.fail_on = Some(op);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn apply_count(&self, page: usize) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::Apply { page: p, .. } if *p == page))
            .count()
    }

    pub fn insertions(&self) -> Vec<(usize, TextInsertion)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Insert { page, insertion } => Some((*page, insertion.clone())),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn check(&self, op: &'static str, page: Option<usize>) -> Result<()> {
        if let Some(page) = page {
            if page >= self.pages.len() {
                return Err(CoreError::PageOutOfRange {
                    page,
                    count: self.pages.len(),
                });
            }
        }
        if self.fail_on == Some(op) {
            return Err(CoreError::Backend(format!("{} failed", op)));
        }
        Ok(())
    }
}

impl Document for FakeDocument {
    fn load(path: &Path) -> Result<Self> {
        Err(CoreError::Backend(format!(
            "fake documents cannot be loaded from {}",
            path.display()
        )))
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn search_text(&self, page: usize, query: &str) -> Result<Vec<Rect>> {
        self.check("search", Some(page))?;
        self.record(Call::Search {
            page,
            query: query.to_string(),
        });
        Ok(self.pages[page].hits.get(query).cloned().unwrap_or_default())
    }

    fn structured_text(&self, page: usize) -> Result<StructuredText> {
        self.check("structured_text", Some(page))?;
        self.record(Call::StructuredText { page });
        Ok(self.pages[page].text.clone())
    }

    fn mark_for_removal(&mut self, page: usize, rect: Rect) -> Result<()> {
        self.check("mark", Some(page))?;
        self.record(Call::Mark { page, rect });
        Ok(())
    }

    fn apply_removal(&mut self, page: usize, options: RemovalOptions) -> Result<()> {
        self.check("apply", Some(page))?;
        self.record(Call::Apply { page, options });
        Ok(())
    }

    fn measure_text_width(&self, text: &str, font: SubstituteFont, size: f32) -> Result<f32> {
        self.check("measure", None)?;
        self.record(Call::Measure {
            text: text.to_string(),
            font,
            size,
        });
        Ok(text.chars().count() as f32 * size * self.char_width)
    }

    fn insert_text(&mut self, page: usize, insertion: &TextInsertion) -> Result<()> {
        self.check("insert", Some(page))?;
        self.record(Call::Insert {
            page,
            insertion: insertion.clone(),
        });
        Ok(())
    }

    fn save(&mut self, output: &Path) -> Result<()> {
        self.check("save", None)?;
        self.record(Call::Save {
            path: output.to_path_buf(),
        });
        Ok(())
    }
}
