//! Cone (disc) predicates over the pixel hierarchy.
//!
//! A [`Disc`] is a spherical cap around a centre direction. It answers two
//! questions about pixels:
//!
//! - [`Disc::contains_pixel`]: is the pixel centre inside the cap? This is the
//!   membership rule used by every radius query.
//! - [`Disc::may_overlap`]: could any point of the pixel be inside the cap?
//!   Conservative (never `false` for a pixel that overlaps), so a `false` answer
//!   prunes the pixel and its whole subtree.
//!
//! A radius of π or more covers the whole sky and disables pruning.

use crate::nested::{self, MAX_LEVEL};
use crate::pixel::HealPixel;
use celestial_core::constants::{DEG_TO_RAD, PI};
use celestial_core::SkyDir;

/// A spherical cap: all directions within `radius` radians of `centre`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Disc {
    centre: SkyDir,
    radius: f64,
}

impl Disc {
    /// Cap of `radius` radians around `centre`.
    pub fn new(centre: SkyDir, radius: f64) -> Self {
        Self { centre, radius }
    }

    /// Cap of `radius_deg` degrees around `centre`. 180° or more is the whole sky.
    pub fn from_degrees(centre: SkyDir, radius_deg: f64) -> Self {
        Self::new(centre, radius_deg * DEG_TO_RAD)
    }

    pub fn centre(&self) -> &SkyDir {
        &self.centre
    }

    /// Radius in radians.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn is_whole_sky(&self) -> bool {
        self.radius >= PI
    }

    pub fn contains(&self, dir: &SkyDir) -> bool {
        self.is_whole_sky() || self.centre.difference(dir) <= self.radius
    }

    /// `true` if the pixel centre lies inside the cap.
    pub fn contains_pixel(&self, pixel: &HealPixel) -> bool {
        self.contains(&pixel.dir())
    }

    /// `false` only if no point of `pixel` can lie inside the cap.
    pub fn may_overlap(&self, pixel: &HealPixel) -> bool {
        self.is_whole_sky()
            || self.centre.difference(&pixel.dir()) <= self.radius + pixel.max_radius()
    }

    /// Every pixel at `level` whose centre lies inside the cap, in index order.
    ///
    /// Walks down from the 12 base pixels, discarding subtrees the cap cannot
    /// reach, so the cost scales with the cap area rather than the sky.
    pub fn pixels_at(&self, level: u8) -> Vec<HealPixel> {
        let level = level.min(MAX_LEVEL);
        if self.is_whole_sky() {
            return HealPixel::level_pixels(level).collect();
        }
        self.walk(level, |pixel| self.contains_pixel(pixel))
    }

    /// Every pixel at `level` the cap may reach, in index order.
    ///
    /// The union of these pixels covers the cap.
    pub fn overlapping(&self, level: u8) -> Vec<HealPixel> {
        let level = level.min(MAX_LEVEL);
        if self.is_whole_sky() {
            return HealPixel::level_pixels(level).collect();
        }
        self.walk(level, |_| true)
    }

    /// Deepest level whose pixel radius is still at least a quarter of the
    /// cap radius.
    ///
    /// Covering the cap with [`overlapping`](Self::overlapping) at this level
    /// takes a few hundred pixels at most, whatever the radius.
    pub fn search_level(&self) -> u8 {
        if self.is_whole_sky() {
            return 0;
        }
        let quarter = self.radius / 4.0;
        (1..=MAX_LEVEL)
            .take_while(|&level| nested::max_pixrad(level) >= quarter)
            .last()
            .unwrap_or(0)
    }

    fn walk(&self, level: u8, keep: impl Fn(&HealPixel) -> bool) -> Vec<HealPixel> {
        let mut found = Vec::new();
        let mut stack: Vec<HealPixel> = HealPixel::base_pixels().rev().collect();
        while let Some(pixel) = stack.pop() {
            if !self.may_overlap(&pixel) {
                continue;
            }
            if pixel.level() == level {
                if keep(&pixel) {
                    found.push(pixel);
                }
                continue;
            }
            if let Some(children) = pixel.children() {
                stack.extend(children.into_iter().rev());
            }
        }
        found
    }
}
