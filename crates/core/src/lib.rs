//! Typography-preserving search and replace for PDF pages.
//!
//! The engine drives any [`Document`] backend: it locates every visual
//! occurrence of a search string, clears those regions in one batched pass per
//! page and redraws the replacement with the original font size, color and
//! baseline, shrinking text that would overflow its original box.

pub mod collect;
pub mod config;
pub mod document;
pub mod font;
pub mod locate;
pub mod redact;
pub mod reinsert;
pub mod replace;
pub mod survey;
pub mod task;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use collect::{Occurrence, OccurrenceCollector, SpanAttrs};
pub use config::{load_config, output_path_for, save_config, EditorConfig};
pub use document::{
    BlockKind, Document, Point, Rect, RemovalOptions, SpanColor, StructuredText, TextBlock,
    TextInsertion, TextLine, TextSpan,
};
pub use font::{FontInfo, FontMatcher, SubstituteFont};
pub use locate::RectLocator;
pub use redact::RedactionBatcher;
pub use reinsert::{fit_font_size, resolve_color, AutoFitReinserter};
pub use replace::{ReplaceResult, SearchReplacePair, Stage, TextReplacer};
pub use survey::{dominant_font, survey_fonts, FontUsage};
pub use task::{build_tasks, ReplacementTask};
pub use worker::{ReplaceJob, ReplaceWorker, WorkerEvent, WorkerHandle};

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("page {page} out of range (document has {count} pages)")]
    PageOutOfRange { page: usize, count: usize },
    #[error("invalid rectangle: {0:?}")]
    InvalidRect(Rect),
    #[error("document backend error: {0}")]
    Backend(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("replace failed on page {page} while {stage}: {source}")]
    Replace {
        page: usize,
        stage: Stage,
        #[source]
        source: Box<CoreError>,
    },
    #[error("failed to save {}: {source}", .path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: Box<CoreError>,
    },
}
