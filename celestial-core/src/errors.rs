//! Error types shared by the sky-map crates.
//!
//! [`AstroError`] covers the numerical failure modes of the low-level building
//! blocks: out-of-range pixel levels and indices, and degenerate vectors.
//!
//! # Error Categories
//!
//! | Kind | Use Case |
//! |------|----------|
//! | [`OutOfRange`](MathErrorKind::OutOfRange) | Pixel level above 29, index past the level's pixel count |
//! | [`NotFinite`](MathErrorKind::NotFinite) | NaN or infinite vector components |
//! | [`DivisionByZero`](MathErrorKind::DivisionByZero) | Zero-length vector normalisation |
//!
//! # Usage
//!
//! ```
//! use celestial_core::{AstroError, MathErrorKind};
//!
//! fn checked_level(level: u8) -> Result<u8, AstroError> {
//!     if level > 29 {
//!         return Err(AstroError::math_error(
//!             "checked_level",
//!             MathErrorKind::OutOfRange,
//!             "level exceeds 29",
//!         ));
//!     }
//!     Ok(level)
//! }
//! ```

use thiserror::Error;

/// Classification of mathematical errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MathErrorKind {
    /// Attempted division by zero or near-zero value.
    DivisionByZero,
    /// Result is NaN or infinity.
    NotFinite,
    /// Value outside valid domain (e.g., pixel level > 29).
    OutOfRange,
}

/// Unified error type for the low-level sky calculations.
#[derive(Error, Debug)]
pub enum AstroError {
    /// Numerical computation failure.
    #[error("Math error in {operation} ({kind:?}): {message}")]
    MathError {
        operation: String,
        kind: MathErrorKind,
        message: String,
    },
}

/// Convenience alias for `Result<T, AstroError>`.
pub type AstroResult<T> = Result<T, AstroError>;

impl AstroError {
    /// Creates a [`MathError`](Self::MathError) with the given kind.
    pub fn math_error(operation: &str, kind: MathErrorKind, reason: &str) -> Self {
        Self::MathError {
            operation: operation.to_string(),
            kind,
            message: reason.to_string(),
        }
    }
}
