use pdforge_core::CoreError;

pub type PdfResult<T> = std::result::Result<T, PdfError>;

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("pdf error: {0}")]
    Lopdf(#[from] lopdf::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("page {0} not found")]
    PageNotFound(usize),
    #[error("malformed content: {0}")]
    Content(String),
    #[error("encrypted documents are not supported")]
    Encrypted,
}

impl From<PdfError> for CoreError {
    fn from(err: PdfError) -> Self {
        CoreError::Backend(err.to_string())
    }
}
