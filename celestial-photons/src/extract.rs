//! Cone extraction around a direction.
//!
//! Two policies over the same [`CellCounts::within`] walk:
//!
//! - [`extract`] reports every entry inside the disc, folding entries finer
//!   than a summary level into their ancestor at that level.
//! - [`extract_level`] reports one level only, optionally filling the pixels
//!   with no entry with explicit zeros.
//!
//! Both return `(pixel, count)` pairs in pixel order, each pixel once, and
//! the sum of the reported counts.

use crate::store::CellCounts;
use celestial_healpix::{Disc, HealPixel};
use std::collections::BTreeMap;

/// Entries whose pixel centre lies in `disc`.
///
/// With `select_level`, only entries at exactly that level are reported.
/// Otherwise entries finer than `summary_level` are summed into their
/// ancestor at `summary_level` and coarser entries are reported as they
/// are. The returned total equals the sum of the counts of every entry in
/// the disc when no level is selected.
pub fn extract(
    counts: &CellCounts,
    disc: &Disc,
    summary_level: u8,
    select_level: Option<u8>,
) -> (Vec<(HealPixel, u64)>, u64) {
    let mut collected: BTreeMap<HealPixel, u64> = BTreeMap::new();
    for (pixel, count) in counts.within(disc) {
        let key = match select_level {
            Some(level) if pixel.level() != level => continue,
            Some(_) => pixel,
            None => pixel.ancestor(summary_level).unwrap_or(pixel),
        };
        *collected.entry(key).or_insert(0) += count;
    }
    finish(collected.into_iter())
}

/// Pixels at `level` whose centre lies in `disc`.
///
/// Without `include_all` only stored pixels are reported; with it every
/// pixel at `level` in the disc is, those without an entry with count 0.
pub fn extract_level(
    counts: &CellCounts,
    disc: &Disc,
    level: u8,
    include_all: bool,
) -> (Vec<(HealPixel, u64)>, u64) {
    if include_all {
        return finish(
            disc.pixels_at(level)
                .into_iter()
                .map(|pixel| (pixel, counts.get(&pixel))),
        );
    }

    finish(
        counts
            .within(disc)
            .filter(|(pixel, _)| pixel.level() == level),
    )
}

fn finish(entries: impl Iterator<Item = (HealPixel, u64)>) -> (Vec<(HealPixel, u64)>, u64) {
    let entries: Vec<_> = entries.collect();
    let total = entries.iter().map(|(_, count)| count).sum();
    (entries, total)
}
