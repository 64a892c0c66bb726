//! Sparse cell-count store.
//!
//! [`CellCounts`] maps [`HealPixel`] keys to photon counts in a `BTreeMap`.
//! Keys order by level, then index, so the descendants of a pixel at any
//! deeper level sit in one contiguous key range, and subtree sums are a
//! handful of bounded range scans rather than a full walk.

use celestial_healpix::{Disc, HealPixel};
use std::collections::btree_map::{self, BTreeMap};
use std::ops::RangeInclusive;

/// Ceiling on the photon total, so every count fits a signed 64-bit column.
pub const MAX_PHOTONS: u64 = i64::MAX as u64;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellCounts {
    counts: BTreeMap<HealPixel, u64>,
    total_photons: u64,
}

impl CellCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `count` at `pixel`. Returns `true` if the pixel was not present.
    ///
    /// The photon total never exceeds [`MAX_PHOTONS`]; any excess is dropped
    /// from the entry and the total alike, so the total stays the sum of the
    /// entries.
    pub fn add(&mut self, pixel: HealPixel, count: u64) -> bool {
        let count = count.min(MAX_PHOTONS - self.total_photons);
        self.total_photons += count;
        match self.counts.entry(pixel) {
            btree_map::Entry::Occupied(mut entry) => {
                *entry.get_mut() += count;
                false
            }
            btree_map::Entry::Vacant(entry) => {
                entry.insert(count);
                true
            }
        }
    }

    /// Stored count at `pixel`, 0 if absent.
    pub fn get(&self, pixel: &HealPixel) -> u64 {
        self.counts.get(pixel).copied().unwrap_or(0)
    }

    pub fn contains(&self, pixel: &HealPixel) -> bool {
        self.counts.contains_key(pixel)
    }

    /// Sum of every stored count.
    pub fn total_photons(&self) -> u64 {
        self.total_photons
    }

    /// Number of distinct pixels.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Entries in key order: level, then index.
    pub fn iter(&self) -> impl Iterator<Item = (HealPixel, u64)> + '_ {
        self.counts.iter().map(|(p, c)| (*p, *c))
    }

    /// Entries at one level, in index order.
    pub fn level(&self, level: u8) -> impl Iterator<Item = (HealPixel, u64)> + '_ {
        let range = HealPixel::level_pixels(level)
            .next()
            .zip(HealPixel::level_pixels(level).next_back())
            .map(|(first, last)| first..=last);
        range
            .into_iter()
            .flat_map(move |r| self.counts.range(r))
            .map(|(p, c)| (*p, *c))
    }

    /// Deepest level with at least one entry.
    pub fn deepest_level(&self) -> Option<u8> {
        self.counts.last_key_value().map(|(p, _)| p.level())
    }

    /// Present descendants of `pixel` (strictly finer), level by level.
    pub fn descendants(&self, pixel: HealPixel) -> impl Iterator<Item = (HealPixel, u64)> + '_ {
        let deepest = self.deepest_level().unwrap_or(0);
        (pixel.level() + 1..=deepest)
            .filter_map(move |level| descendant_keys(pixel, level))
            .flat_map(move |range| self.counts.range(range))
            .map(|(p, c)| (*p, *c))
    }

    /// Stored entries whose pixel centre lies inside `disc`, in key order.
    ///
    /// Every stored level is read through the key ranges beneath the pixels
    /// covering the disc at its [search level](Disc::search_level), so the
    /// work follows the entries near the disc and a bounded number of range
    /// lookups per level.
    pub fn within<'a>(&'a self, disc: &'a Disc) -> impl Iterator<Item = (HealPixel, u64)> + 'a {
        self.disc_ranges(disc)
            .flat_map(move |range| self.counts.range(range))
            .map(|(p, c)| (*p, *c))
            .filter(move |(p, _)| disc.contains_pixel(p))
    }

    /// Key ranges read by [`within`](Self::within), in key order.
    fn disc_ranges<'a>(
        &'a self,
        disc: &'a Disc,
    ) -> impl Iterator<Item = RangeInclusive<HealPixel>> + 'a {
        let search = disc.search_level();
        let cover = disc.overlapping(search);
        self.stored_levels().flat_map(move |level| {
            let cells = if level < search {
                disc.overlapping(level)
            } else {
                cover.clone()
            };
            cells
                .into_iter()
                .map(move |cell| descendant_keys(cell, level).unwrap_or(cell..=cell))
        })
    }

    fn stored_levels(&self) -> RangeInclusive<u8> {
        match (self.counts.first_key_value(), self.counts.last_key_value()) {
            (Some((first, _)), Some((last, _))) => first.level()..=last.level(),
            _ => 1..=0,
        }
    }
}

fn descendant_keys(pixel: HealPixel, level: u8) -> Option<RangeInclusive<HealPixel>> {
    pixel
        .descendant_range(level)
        .map(|(first, last)| first..=last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use celestial_core::SkyDir;

    fn px(level: u8, index: u64) -> HealPixel {
        HealPixel::new(level, index).unwrap()
    }

    #[test]
    fn test_add_reports_new_keys() {
        let mut store = CellCounts::new();
        assert!(store.add(px(6, 10), 1));
        assert!(!store.add(px(6, 10), 4));
        assert!(store.add(px(7, 40), 2));
        assert_eq!(store.get(&px(6, 10)), 5);
        assert_eq!(store.get(&px(6, 11)), 0);
        assert_eq!(store.total_photons(), 7);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_total_is_capped_with_entries() {
        let mut store = CellCounts::new();
        store.add(px(0, 0), u64::from(u32::MAX));
        store.add(px(0, 0), 10);
        assert_eq!(store.get(&px(0, 0)), u64::from(u32::MAX) + 10);
        assert_eq!(store.total_photons(), u64::from(u32::MAX) + 10);

        store.add(px(1, 7), MAX_PHOTONS);
        store.add(px(0, 0), 5);
        assert!(store.add(px(2, 9), 1));
        assert_eq!(store.total_photons(), MAX_PHOTONS);
        assert_eq!(store.get(&px(2, 9)), 0);
        let summed: u64 = store.iter().map(|(_, c)| c).sum();
        assert_eq!(summed, store.total_photons());
    }

    #[test]
    fn test_level_iteration() {
        let mut store = CellCounts::new();
        store.add(px(5, 3), 1);
        store.add(px(6, 1), 1);
        store.add(px(6, 0), 1);
        store.add(px(7, 0), 1);
        let level6: Vec<_> = store.level(6).map(|(p, _)| p).collect();
        assert_eq!(level6, vec![px(6, 0), px(6, 1)]);
        assert_eq!(store.deepest_level(), Some(7));
    }

    #[test]
    fn test_descendants_are_range_bounded() {
        let mut store = CellCounts::new();
        let parent = px(4, 100);
        store.add(parent, 1);
        store.add(px(5, 400), 2);
        store.add(px(5, 403), 3);
        store.add(px(5, 404), 100); // sibling subtree
        store.add(px(7, 100 * 64 + 63), 4);
        store.add(px(7, 101 * 64), 100);

        let found: Vec<_> = store.descendants(parent).collect();
        assert_eq!(
            found,
            vec![(px(5, 400), 2), (px(5, 403), 3), (px(7, 6463), 4)]
        );
        assert_eq!(store.descendants(px(3, 25)).count(), 3);
        assert_eq!(store.descendants(px(3, 24)).count(), 0);
    }

    #[test]
    fn test_within_matches_scan() {
        let mut store = CellCounts::new();
        for level in 3..7u8 {
            for index in (0..HealPixel::level_pixels(level).count() as u64).step_by(7) {
                store.add(px(level, index), index % 5 + 1);
            }
        }
        let disc = Disc::from_degrees(SkyDir::from_radec_deg(210.0, -35.0), 25.0);

        let walked: Vec<_> = store.within(&disc).collect();
        let scanned: Vec<_> = store
            .iter()
            .filter(|(p, _)| disc.contains_pixel(p))
            .collect();
        assert!(!scanned.is_empty());
        assert_eq!(walked, scanned);
    }

    #[test]
    fn test_within_whole_sky_yields_everything() {
        let mut store = CellCounts::new();
        store.add(px(2, 5), 1);
        store.add(px(9, 77), 3);
        let disc = Disc::from_degrees(SkyDir::from_radec_deg(0.0, 0.0), 180.0);
        assert_eq!(store.within(&disc).count(), 2);
        assert_eq!(CellCounts::new().within(&disc).count(), 0);
    }

    #[test]
    fn test_within_reads_few_ranges_for_large_discs() {
        let mut store = CellCounts::new();
        for level in 6..=13u8 {
            let step = HealPixel::level_pixels(level).count() as u64 / 2_500;
            for index in (0..2_500u64).map(|k| k * step + k % 7) {
                store.add(px(level, index), 1);
            }
        }

        for (ra, dec, radius) in [(30.0, 20.0, 10.0), (200.0, -40.0, 90.0), (75.0, 5.0, 179.0)] {
            let disc = Disc::from_degrees(SkyDir::from_radec_deg(ra, dec), radius);
            let ranges = store.disc_ranges(&disc).count();
            assert!(ranges <= 8 * 300, "{} ranges for radius {}", ranges, radius);

            let walked: Vec<_> = store.within(&disc).collect();
            let scanned: Vec<_> = store
                .iter()
                .filter(|(p, _)| disc.contains_pixel(p))
                .collect();
            assert!(!scanned.is_empty());
            assert_eq!(walked, scanned);
        }
    }
}
