//! Document model interface
//!
//! Every PDF backend must implement the `Document` trait so the replacement
//! engine can drive search, redaction, measuring and reinsertion through one
//! uniform seam.

use crate::font::SubstituteFont;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A point in page space (top-left origin, y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in page space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Bottom-left corner, the fallback baseline origin for text drawn in this box.
    pub fn bottom_left(&self) -> Point {
        Point::new(self.x0, self.y1)
    }

    pub fn center(&self) -> Point {
        Point::new((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x0 && p.x <= self.x1 && p.y >= self.y0 && p.y <= self.y1
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Finite coordinates with `x0 <= x1` and `y0 <= y1`.
    pub fn is_valid(&self) -> bool {
        [self.x0, self.y0, self.x1, self.y1].iter().all(|v| v.is_finite())
            && self.x0 <= self.x1
            && self.y0 <= self.y1
    }
}

/// Span color as reported by the text model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanColor {
    /// sRGB packed as `0xRRGGBB`.
    Packed(u32),
    /// Components already normalized to `[0, 1]`.
    Normalized([f32; 3]),
}

impl Default for SpanColor {
    fn default() -> Self {
        SpanColor::Packed(0)
    }
}

/// One run of text sharing font, size and color.
///
/// Every attribute the backend could not determine is `None`; consumers
/// resolve missing values against explicit defaults instead of guessing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub font: Option<String>,
    pub size: Option<f32>,
    pub color: Option<SpanColor>,
    pub bbox: Rect,
    /// Baseline origin of the first glyph.
    pub origin: Option<Point>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub bbox: Rect,
    pub spans: Vec<TextSpan>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    #[default]
    Text,
    Image,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub kind: BlockKind,
    pub bbox: Rect,
    pub lines: Vec<TextLine>,
}

/// Structured text of a single page: blocks, lines, spans.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredText {
    pub blocks: Vec<TextBlock>,
}

impl StructuredText {
    /// All spans of text blocks in reading order.
    pub fn text_spans(&self) -> impl Iterator<Item = &TextSpan> {
        self.blocks
            .iter()
            .filter(|b| b.kind == BlockKind::Text)
            .flat_map(|b| b.lines.iter())
            .flat_map(|l| l.spans.iter())
    }

    /// Plain text of all text blocks, one line per [`TextLine`].
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .filter(|b| b.kind == BlockKind::Text)
            .flat_map(|b| b.lines.iter())
            .map(|l| l.spans.iter().map(|s| s.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Flags passed to `apply_removal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalOptions {
    /// Keep raster images that overlap a marked region.
    pub preserve_images: bool,
    /// Keep vector graphics that overlap a marked region.
    pub preserve_vector_graphics: bool,
}

impl RemovalOptions {
    /// Clear text only; leave images and vector graphics alone.
    pub fn text_only() -> Self {
        Self {
            preserve_images: true,
            preserve_vector_graphics: true,
        }
    }
}

/// A single text draw request for `insert_text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextInsertion {
    pub origin: Point,
    pub text: String,
    pub font: SubstituteFont,
    pub size: f32,
    /// Normalized RGB.
    pub color: [f32; 3],
}

/// Unified document interface
///
/// The replacement engine borrows a `Document` for the duration of one call
/// and never closes or drops it; acquiring and releasing the handle is the
/// caller's job. Implementations are not required to be thread-safe.
pub trait Document {
    /// Load a document
    ///
    /// # Arguments
    /// - `path`: full path to the file on disk
    ///
    /// # Returns
    /// - Ok: the loaded document
    /// - Err: a descriptive error (missing file, corrupt data, ...)
    fn load(path: &Path) -> Result<Self>
    where
        Self: Sized;

    fn page_count(&self) -> usize;

    /// Bounding rectangles of every visual occurrence of `query` on `page`,
    /// in the engine's native search order.
    fn search_text(&self, page: usize, query: &str) -> Result<Vec<Rect>>;

    /// Snapshot of the page's structured text model.
    fn structured_text(&self, page: usize) -> Result<StructuredText>;

    /// Mark a region for removal. Nothing changes until `apply_removal`.
    fn mark_for_removal(&mut self, page: usize, rect: Rect) -> Result<()>;

    /// Clear every region marked on `page` in one pass.
    fn apply_removal(&mut self, page: usize, options: RemovalOptions) -> Result<()>;

    /// Rendered width of `text` in `font` at `size`.
    fn measure_text_width(&self, text: &str, font: SubstituteFont, size: f32) -> Result<f32>;

    fn insert_text(&mut self, page: usize, insertion: &TextInsertion) -> Result<()>;

    /// Persist the document to `output`.
    fn save(&mut self, output: &Path) -> Result<()>;
}
