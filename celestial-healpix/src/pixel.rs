//! Hierarchical pixel identifiers.
//!
//! A [`HealPixel`] names one cell of the nested HEALPix tessellation: a level
//! (resolution, `nside = 2^level`) and an index within that level. Pixels
//! order first by level, then by index, so an ordered container of pixels
//! holds each level as one contiguous run and each pixel's descendants at a
//! given deeper level as one contiguous sub-run:
//!
//! ```
//! use celestial_healpix::HealPixel;
//!
//! let p = HealPixel::new(2, 5).unwrap();
//! let (first, last) = p.descendant_range(4).unwrap();
//! assert_eq!(first.index(), 5 * 16);
//! assert_eq!(last.index(), 6 * 16 - 1);
//! assert!(p.is_ancestor_of(&first));
//! ```

use crate::nested::{self, MAX_LEVEL};
use celestial_core::constants::FOUR_PI;
use celestial_core::{AstroError, AstroResult, MathErrorKind, SkyDir};
use std::fmt;

/// A cell of the nested HEALPix hierarchy.
///
/// Field order matters: the derived ordering compares `level` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HealPixel {
    level: u8,
    index: u64,
}

impl HealPixel {
    /// Creates a pixel, validating the level and the index range for that level.
    pub fn new(level: u8, index: u64) -> AstroResult<Self> {
        if level > MAX_LEVEL {
            return Err(AstroError::math_error(
                "HealPixel::new",
                MathErrorKind::OutOfRange,
                &format!("level {} exceeds maximum {}", level, MAX_LEVEL),
            ));
        }
        let npix = nested::npix(level);
        if index >= npix {
            return Err(AstroError::math_error(
                "HealPixel::new",
                MathErrorKind::OutOfRange,
                &format!("index {} out of range for level {} ({} pixels)", index, level, npix),
            ));
        }
        Ok(Self { level, index })
    }

    /// The pixel at `level` containing `dir`.
    ///
    /// Levels deeper than [`MAX_LEVEL`] are treated as [`MAX_LEVEL`].
    pub fn from_dir(dir: &SkyDir, level: u8) -> Self {
        let level = level.min(MAX_LEVEL);
        Self {
            level,
            index: nested::zphi2pix_nest(level, dir.z(), dir.phi()),
        }
    }

    /// The 12 level-0 pixels.
    pub fn base_pixels() -> impl DoubleEndedIterator<Item = HealPixel> {
        Self::level_pixels(0)
    }

    /// Every pixel at `level`, in index order.
    pub fn level_pixels(level: u8) -> impl DoubleEndedIterator<Item = HealPixel> {
        let level = level.min(MAX_LEVEL);
        (0..nested::npix(level)).map(move |index| HealPixel { level, index })
    }

    #[inline]
    pub fn level(&self) -> u8 {
        self.level
    }

    #[inline]
    pub fn index(&self) -> u64 {
        self.index
    }

    #[inline]
    pub fn nside(&self) -> u64 {
        nested::nside(self.level)
    }

    /// Direction of the pixel centre.
    pub fn dir(&self) -> SkyDir {
        let (z, phi) = nested::pix2zphi_nest(self.level, self.index);
        SkyDir::from_z_phi(z, phi)
    }

    /// Solid angle of the pixel in steradians. All pixels of a level share it.
    pub fn area(&self) -> f64 {
        level_area(self.level)
    }

    /// Conservative angular radius of the pixel, in radians.
    pub fn max_radius(&self) -> f64 {
        nested::max_pixrad(self.level)
    }

    /// The enclosing pixel one level up, `None` at level 0.
    pub fn parent(&self) -> Option<HealPixel> {
        self.level.checked_sub(1).and_then(|l| self.ancestor(l))
    }

    /// The enclosing pixel at `level`; the pixel itself when `level` equals
    /// its own level, `None` when `level` is deeper.
    pub fn ancestor(&self, level: u8) -> Option<HealPixel> {
        if level > self.level {
            return None;
        }
        let shift = 2 * u32::from(self.level - level);
        Some(Self {
            level,
            index: self.index >> shift,
        })
    }

    /// The four pixels one level down, `None` at [`MAX_LEVEL`].
    pub fn children(&self) -> Option<[HealPixel; 4]> {
        if self.level >= MAX_LEVEL {
            return None;
        }
        let level = self.level + 1;
        let first = self.index << 2;
        Some([0, 1, 2, 3].map(|k| HealPixel {
            level,
            index: first + k,
        }))
    }

    /// First and last (inclusive) descendants at `level`.
    ///
    /// Every descendant at that level lies between the two in pixel order.
    /// `None` unless `self.level() < level <= MAX_LEVEL`.
    pub fn descendant_range(&self, level: u8) -> Option<(HealPixel, HealPixel)> {
        if level <= self.level || level > MAX_LEVEL {
            return None;
        }
        let shift = 2 * u32::from(level - self.level);
        let first = self.index << shift;
        let last = ((self.index + 1) << shift) - 1;
        Some((
            HealPixel {
                level,
                index: first,
            },
            HealPixel { level, index: last },
        ))
    }

    /// `true` if `other` is strictly finer and lies inside this pixel.
    pub fn is_ancestor_of(&self, other: &HealPixel) -> bool {
        other.level > self.level && other.ancestor(self.level) == Some(*self)
    }

    /// `true` if `other` is this pixel or one of its descendants.
    pub fn contains(&self, other: &HealPixel) -> bool {
        self == other || self.is_ancestor_of(other)
    }

    /// `true` if `dir` falls inside this pixel.
    pub fn contains_dir(&self, dir: &SkyDir) -> bool {
        HealPixel::from_dir(dir, self.level) == *self
    }
}

/// Solid angle in steradians of one pixel at `level`.
pub fn level_area(level: u8) -> f64 {
    FOUR_PI / nested::npix(level.min(MAX_LEVEL)) as f64
}

impl fmt::Display for HealPixel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}:{}", self.level, self.index)
    }
}
