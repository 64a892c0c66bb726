#[derive(Debug, thiserror::Error)]
pub enum FitsError {
    #[error("Invalid FITS format: {0}")]
    InvalidFormat(String),

    #[error("Keyword {keyword} not found")]
    KeywordNotFound { keyword: String },

    #[error("Invalid keyword value: {keyword} = {value}")]
    InvalidKeywordValue { keyword: String, value: String },

    #[error("Header parsing error: {0}")]
    HeaderParse(String),

    #[error("Column {name} not found")]
    ColumnNotFound { name: String },

    #[error("Unsupported column format: {0}")]
    UnsupportedFormat(String),

    #[error("Extension {name} not found")]
    ExtensionNotFound { name: String },

    #[error("EOF reached unexpectedly")]
    UnexpectedEof,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FitsError {
    pub(crate) fn keyword_not_found(keyword: &str) -> Self {
        Self::KeywordNotFound {
            keyword: keyword.to_string(),
        }
    }

    /// Maps a short read onto [`FitsError::UnexpectedEof`], keeping other I/O errors.
    pub(crate) fn from_read(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::UnexpectedEof
        } else {
            Self::Io(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, FitsError>;
