//! Nested HEALPix pixel hierarchy.
//!
//! The sky is cut into 12 equal-area base pixels, and each pixel is cut into
//! 4 equal-area children at the next level, down to level
//! [`MAX_LEVEL`](nested::MAX_LEVEL). Pixels use the nested numbering scheme, so
//! parent/child relations are bit shifts and a pixel's descendants at any
//! deeper level form a contiguous index range.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`pixel`] | [`HealPixel`] identifier: lookup from a direction, centre, area, parent/children, descendant ranges |
//! | [`disc`] | [`Disc`] cone predicates and per-level disc enumeration |
//! | [`nested`] | Raw `(z, φ)` ↔ nested index conversions (Gorski et al. 2005) |
//!
//! # Quick Start
//!
//! ```
//! use celestial_core::SkyDir;
//! use celestial_healpix::{Disc, HealPixel};
//!
//! let crab = SkyDir::from_radec_deg(83.63, 22.01);
//! let pixel = HealPixel::from_dir(&crab, 6);
//! assert!(pixel.dir().separation_deg(&crab) < 1.0);
//!
//! let disc = Disc::from_degrees(crab, 3.0);
//! assert!(disc.pixels_at(6).contains(&pixel));
//! ```

pub mod disc;
pub mod nested;
pub mod pixel;

pub use disc::Disc;
pub use nested::MAX_LEVEL;
pub use pixel::{level_area, HealPixel};
