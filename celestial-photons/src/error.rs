use celestial_core::AstroError;
use celestial_fits::FitsError;

#[derive(Debug, thiserror::Error)]
pub enum PhotonMapError {
    #[error("Invalid energy binning: {0}")]
    InvalidBinning(String),

    #[error("Invalid pixel: {0}")]
    InvalidPixel(#[from] AstroError),

    #[error("Table {table} already exists in {path}")]
    TableExists { path: String, table: String },

    #[error("FITS error: {0}")]
    Fits(#[from] FitsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PhotonMapError {
    pub(crate) fn invalid_binning(reason: impl Into<String>) -> Self {
        Self::InvalidBinning(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, PhotonMapError>;
