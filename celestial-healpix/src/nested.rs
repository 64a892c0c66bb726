//! HEALPix nested-scheme pixel arithmetic.
//!
//! Conversions between positions on the sphere and nested pixel indices,
//! following Gorski et al. (2005). Positions are given as `z = cos(θ)` and
//! azimuth `φ` (radians); the nested index of a pixel at order `k` is
//! `face · nside² + interleave(ix, iy)` with `nside = 2^k`.
//!
//! The nested numbering is what makes the sky maps cheap to aggregate: the
//! four children of pixel `p` are `4p .. 4p + 3`, so every descendant of `p`
//! at depth `d` below it lies in `[p · 4^d, (p + 1) · 4^d)`.

use celestial_core::constants::{HALF_PI, PI, TWOPI};
use celestial_core::math::fmodulo;

/// Deepest supported level (`nside = 2^29`), the limit of 64-bit nested indices.
pub const MAX_LEVEL: u8 = 29;

/// Number of base pixels (level 0).
pub const BASE_PIXELS: u64 = 12;

/// Ring number (in units of nside) of the southernmost corner of each face.
const JRLL: [i64; 12] = [2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4];

/// Longitude (in units of π/4) of the southernmost corner of each face.
const JPLL: [i64; 12] = [1, 3, 5, 7, 0, 2, 4, 6, 1, 3, 5, 7];

/// `nside = 2^level`.
#[inline]
pub fn nside(level: u8) -> u64 {
    1u64 << level
}

/// Number of pixels covering the sphere at `level`: `12 · 4^level`.
#[inline]
pub fn npix(level: u8) -> u64 {
    BASE_PIXELS << (2 * u32::from(level))
}

/// Nested pixel index containing the point `(z, phi)` at `order`.
pub fn zphi2pix_nest(order: u8, z: f64, phi: f64) -> u64 {
    let nside = nside(order);
    let (face, ix, iy) = compute_face_and_position(phi, z, nside, order);
    face * nside * nside + xy2pix_nest(ix, iy, order)
}

/// Centre `(z, phi)` of a nested pixel at `order`.
pub fn pix2zphi_nest(order: u8, ipix: u64) -> (f64, f64) {
    let nside = nside(order);
    let npface = nside * nside;
    let face = (ipix >> (2 * u32::from(order))) as usize;
    let (ix, iy) = pix2xy_nest(ipix & (npface - 1), order);

    let ns = nside as i64;
    let nl4 = 4 * ns;
    let fact2 = 1.0 / (3.0 * npface as f64);
    let jr = JRLL[face] * ns - ix as i64 - iy as i64 - 1;

    let (nr, z, kshift) = if jr < ns {
        let nr = jr;
        (nr, 1.0 - (nr * nr) as f64 * fact2, 0)
    } else if jr > 3 * ns {
        let nr = nl4 - jr;
        (nr, (nr * nr) as f64 * fact2 - 1.0, 0)
    } else {
        let fact1 = 2.0 / (3.0 * nside as f64);
        (ns, (2 * ns - jr) as f64 * fact1, (jr - ns) & 1)
    };

    let mut jp = (JPLL[face] * nr + ix as i64 - iy as i64 + 1 + kshift) / 2;
    if jp > nl4 {
        jp -= nl4;
    }
    if jp < 1 {
        jp += nl4;
    }
    let phi = (jp as f64 - (kshift + 1) as f64 * 0.5) * (HALF_PI / nr as f64);
    (z, phi)
}

/// Determine which of the 12 base faces contains the point,
/// and the (ix, iy) position within that face.
fn compute_face_and_position(phi: f64, z: f64, nside: u64, order: u8) -> (u64, u64, u64) {
    let z_abs = libm::fabs(z);
    let tt = phi_to_tt(phi);
    if z_abs <= 2.0 / 3.0 {
        compute_equatorial_face(tt, z, nside, order)
    } else {
        compute_polar_face(tt, z, z_abs, nside)
    }
}

/// Convert phi to tt in `[0, 4)`, one unit per quadrant.
fn phi_to_tt(phi: f64) -> f64 {
    let tt = fmodulo(phi, TWOPI) * 2.0 / PI;
    if tt >= 4.0 {
        0.0
    } else {
        tt
    }
}

/// Face and position for the equatorial belt (|z| <= 2/3).
fn compute_equatorial_face(tt: f64, z: f64, nside: u64, order: u8) -> (u64, u64, u64) {
    let ns = nside as f64;
    let temp1 = ns * (0.5 + tt);
    let temp2 = ns * z * 0.75;
    let jp = (temp1 - temp2) as u64;
    let jm = (temp1 + temp2) as u64;
    let ifp = jp >> order;
    let ifm = jm >> order;
    let face = compute_equatorial_face_number(ifp, ifm);
    let ix = jm & (nside - 1);
    let iy = nside - (jp & (nside - 1)) - 1;
    (face, ix, iy)
}

fn compute_equatorial_face_number(ifp: u64, ifm: u64) -> u64 {
    match (ifp, ifm) {
        (4, 4) => 4,
        _ if ifp == ifm => ifp + 4,
        _ if ifp < ifm => ifp,
        _ => ifm + 8,
    }
}

/// Face and position for the polar caps (|z| > 2/3).
fn compute_polar_face(tt: f64, z: f64, z_abs: f64, nside: u64) -> (u64, u64, u64) {
    let ntt = (libm::floor(tt) as u64).min(3);
    let tp = tt - ntt as f64;
    let tmp = nside as f64 * libm::sqrt(3.0 * (1.0 - z_abs));
    let jp = ((tp * tmp) as u64).min(nside - 1);
    let jm = (((1.0 - tp) * tmp) as u64).min(nside - 1);
    if z > 0.0 {
        (ntt, nside - jm - 1, nside - jp - 1)
    } else {
        (ntt + 8, jp, jm)
    }
}

/// Interleave (ix, iy) into a nested index within a face (Z-order curve).
fn xy2pix_nest(ix: u64, iy: u64, order: u8) -> u64 {
    let mut result: u64 = 0;
    for i in 0..u32::from(order) {
        let bit_x = (ix >> i) & 1;
        let bit_y = (iy >> i) & 1;
        result |= (bit_x << (2 * i)) | (bit_y << (2 * i + 1));
    }
    result
}

/// Inverse of [`xy2pix_nest`].
fn pix2xy_nest(ipf: u64, order: u8) -> (u64, u64) {
    let mut ix = 0u64;
    let mut iy = 0u64;
    for i in 0..u32::from(order) {
        ix |= ((ipf >> (2 * i)) & 1) << i;
        iy |= ((ipf >> (2 * i + 1)) & 1) << i;
    }
    (ix, iy)
}

/// Upper bound, in radians, on the distance from a pixel centre to any point
/// of the pixel at `level`.
///
/// The exact maximum is about `0.84 / nside`; the bound uses 1.5 times the
/// mean pixel size so it stays safe for the elongated polar pixels.
pub fn max_pixrad(level: u8) -> f64 {
    let mean_size = libm::sqrt(PI / 3.0) / nside(level) as f64;
    (1.5 * mean_size).min(PI)
}
