//! Low-level building blocks shared by the sky-map crates.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`direction`] | [`SkyDir`], a unit vector on the celestial sphere |
//! | [`math`] | Floating-point modulo into `[0, y)` |
//! | [`constants`] | π multiples and unit conversions |
//! | [`errors`] | [`AstroError`] and [`AstroResult`] |
//!
//! # Re-exports
//!
//! ```
//! use celestial_core::{AstroError, AstroResult, MathErrorKind, SkyDir};
//! ```
//!
//! # Design Notes
//!
//! - **Radians internally**: angular computations use radians; degrees appear
//!   only at the API edges (`from_radec_deg`, `ra`, `dec`, `separation_deg`).

pub mod constants;
pub mod direction;
pub mod errors;
pub mod math;

pub use direction::SkyDir;
pub use errors::{AstroError, AstroResult, MathErrorKind};
