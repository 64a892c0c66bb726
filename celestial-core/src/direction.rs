//! Directions on the celestial sphere.
//!
//! [`SkyDir`] stores a direction as a unit Cartesian vector. That keeps the
//! operations the sky maps need cheap and free of pole singularities: angular
//! separation is `atan2(|a × b|, a · b)`, and averaging a set of directions is
//! a weighted vector sum followed by a normalisation.
//!
//! Equatorial (RA, Dec) degrees are the usual way in and out:
//!
//! ```
//! use celestial_core::SkyDir;
//!
//! let vela = SkyDir::from_radec_deg(128.8, -45.2);
//! let crab = SkyDir::from_radec_deg(83.63, 22.01);
//!
//! let sep = vela.separation_deg(&crab);
//! assert!(sep > 60.0 && sep < 80.0);
//! assert!((vela.ra() - 128.8).abs() < 1e-9);
//! ```
//!
//! Longitude is measured from +X toward +Y, latitude from the XY plane
//! toward +Z.

use crate::constants::{DEG_TO_RAD, RAD_TO_DEG, TWOPI};
use crate::math::fmodulo;
use crate::{AstroError, AstroResult, MathErrorKind};
use std::fmt;

/// A unit vector pointing at a position on the sky.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkyDir {
    x: f64,
    y: f64,
    z: f64,
}

impl SkyDir {
    /// Direction from right ascension and declination in degrees.
    pub fn from_radec_deg(ra_deg: f64, dec_deg: f64) -> Self {
        Self::from_radians(ra_deg * DEG_TO_RAD, dec_deg * DEG_TO_RAD)
    }

    /// Direction from longitude and latitude in radians.
    pub fn from_radians(lon: f64, lat: f64) -> Self {
        let (sin_lat, cos_lat) = libm::sincos(lat);
        let (sin_lon, cos_lon) = libm::sincos(lon);
        Self {
            x: cos_lat * cos_lon,
            y: cos_lat * sin_lon,
            z: sin_lat,
        }
    }

    /// Direction from HEALPix-style `z = cos(colatitude)` and azimuth `phi`.
    pub fn from_z_phi(z: f64, phi: f64) -> Self {
        let z = z.clamp(-1.0, 1.0);
        let sin_theta = libm::sqrt((1.0 - z) * (1.0 + z));
        let (sin_phi, cos_phi) = libm::sincos(phi);
        Self {
            x: sin_theta * cos_phi,
            y: sin_theta * sin_phi,
            z,
        }
    }

    /// Direction along an arbitrary (non-zero, finite) Cartesian vector.
    pub fn from_xyz(x: f64, y: f64, z: f64) -> AstroResult<Self> {
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return Err(AstroError::math_error(
                "SkyDir::from_xyz",
                MathErrorKind::NotFinite,
                "vector components must be finite",
            ));
        }
        let norm = libm::sqrt(x * x + y * y + z * z);
        if norm == 0.0 {
            return Err(AstroError::math_error(
                "SkyDir::from_xyz",
                MathErrorKind::DivisionByZero,
                "cannot normalise the zero vector",
            ));
        }
        Ok(Self {
            x: x / norm,
            y: y / norm,
            z: z / norm,
        })
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn z(&self) -> f64 {
        self.z
    }

    /// Azimuth in radians, in `[0, 2π)`.
    pub fn phi(&self) -> f64 {
        if self.x == 0.0 && self.y == 0.0 {
            return 0.0;
        }
        fmodulo(libm::atan2(self.y, self.x), TWOPI)
    }

    /// Right ascension in degrees, in `[0, 360)`.
    pub fn ra(&self) -> f64 {
        let ra = self.phi() * RAD_TO_DEG;
        if ra >= 360.0 {
            0.0
        } else {
            ra
        }
    }

    /// Declination in degrees, in `[-90, 90]`.
    pub fn dec(&self) -> f64 {
        libm::asin(self.z.clamp(-1.0, 1.0)) * RAD_TO_DEG
    }

    #[inline]
    pub fn dot(&self, other: &SkyDir) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Angular separation in radians, accurate at all separations.
    pub fn difference(&self, other: &SkyDir) -> f64 {
        let cx = self.y * other.z - self.z * other.y;
        let cy = self.z * other.x - self.x * other.z;
        let cz = self.x * other.y - self.y * other.x;
        let cross = libm::sqrt(cx * cx + cy * cy + cz * cz);
        libm::atan2(cross, self.dot(other))
    }

    /// Angular separation in degrees.
    pub fn separation_deg(&self, other: &SkyDir) -> f64 {
        self.difference(other) * RAD_TO_DEG
    }
}

impl fmt::Display for SkyDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(RA={:.4}°, Dec={:+.4}°)", self.ra(), self.dec())
    }
}
