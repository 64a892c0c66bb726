//! The multi-resolution photon map.

use crate::binning::EnergyBinning;
use crate::extract;
use crate::photon::Photon;
use crate::sky::{SkyFunction, SkySpectrum};
use crate::store::CellCounts;
use celestial_core::SkyDir;
use celestial_healpix::{Disc, HealPixel};
use std::fmt;

pub const DEFAULT_NAME: &str = "photonmap";

/// Photon counts binned by direction and energy.
///
/// Each energy band has its own pixel level (see [`EnergyBinning`]); a photon
/// is counted in the pixel containing its direction at its band's level. The
/// map only grows: [`add_photon`](Self::add_photon) and
/// [`add_pixel`](Self::add_pixel) are the only mutators.
///
/// Accumulation needs `&mut self`; once filled, the map can be shared
/// read-only across threads (wrap it in `Arc`).
#[derive(Debug, Clone, PartialEq)]
pub struct PhotonMap {
    binning: EnergyBinning,
    counts: CellCounts,
    name: String,
}

/// Photon and pixel totals of one energy band.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BandSummary {
    pub level: u8,
    /// Left edge of the band, MeV.
    pub emin: f64,
    /// Right edge of the band, `None` for the open-ended top band.
    pub emax: Option<f64>,
    pub photons: u64,
    pub pixels: usize,
}

impl Default for PhotonMap {
    fn default() -> Self {
        Self::new(EnergyBinning::default())
    }
}

impl PhotonMap {
    pub fn new(binning: EnergyBinning) -> Self {
        Self {
            binning,
            counts: CellCounts::new(),
            name: DEFAULT_NAME.to_string(),
        }
    }

    pub fn binning(&self) -> &EnergyBinning {
        &self.binning
    }

    /// The underlying pixel → count store.
    pub fn counts(&self) -> &CellCounts {
        &self.counts
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name<S: Into<String>>(&mut self, name: S) {
        self.name = name.into();
    }

    pub fn min_level(&self) -> u8 {
        self.binning.min_level()
    }

    pub fn levels(&self) -> u8 {
        self.binning.levels()
    }

    /// Left edges of the energy bands, MeV.
    pub fn energy_bins(&self) -> Vec<f64> {
        self.binning.energy_bins()
    }

    /// Pixel a photon would be counted in.
    pub fn pixel(&self, photon: &Photon) -> HealPixel {
        HealPixel::from_dir(photon.dir(), self.binning.bin_level(photon.energy()))
    }

    pub fn add_photon(&mut self, photon: &Photon) {
        let pixel = self.pixel(photon);
        self.counts.add(pixel, 1);
    }

    /// Adds `count` photons at an explicit pixel.
    ///
    /// The photon total is capped at [`MAX_PHOTONS`](crate::store::MAX_PHOTONS).
    pub fn add_pixel(&mut self, pixel: HealPixel, count: u64) {
        self.counts.add(pixel, count);
    }

    /// Photons added so far.
    pub fn total_photons(&self) -> u64 {
        self.counts.total_photons()
    }

    /// Distinct pixels with an entry.
    pub fn pixel_count(&self) -> usize {
        self.counts.len()
    }

    /// Entries in pixel order.
    pub fn iter(&self) -> impl Iterator<Item = (HealPixel, u64)> + '_ {
        self.counts.iter()
    }

    /// Photons per steradian at `dir` in the band holding `energy`.
    pub fn value(&self, dir: &SkyDir, energy: f64) -> f64 {
        self.level_density(dir, self.binning.bin_level(energy))
    }

    /// Density of the band `[a, b)`.
    ///
    /// `a` and `b` are expected to be adjacent band edges; the band is chosen
    /// at their geometric mean and no integration over energy takes place.
    pub fn integral(&self, dir: &SkyDir, a: f64, b: f64) -> f64 {
        self.value(dir, (a * b).sqrt())
    }

    /// Photons per steradian at `dir`, summed over every band.
    pub fn density(&self, dir: &SkyDir) -> f64 {
        (self.binning.min_level()..=self.binning.max_level())
            .map(|level| self.level_density(dir, level))
            .sum()
    }

    fn level_density(&self, dir: &SkyDir, level: u8) -> f64 {
        let pixel = HealPixel::from_dir(dir, level);
        self.counts.get(&pixel) as f64 / pixel.area()
    }

    /// Photons in `pixel`, optionally with everything stored beneath it.
    ///
    /// With `weighted`, each finer entry counts in proportion to its area
    /// relative to `pixel`; the entry at `pixel` itself counts in full.
    pub fn photon_count(&self, pixel: &HealPixel, include_children: bool, weighted: bool) -> f64 {
        let own = self.counts.get(pixel) as f64;
        if !include_children {
            return own;
        }
        let area = pixel.area();
        let below: f64 = self
            .counts
            .descendants(*pixel)
            .map(|(p, c)| {
                let weight = if weighted { p.area() / area } else { 1.0 };
                weight * c as f64
            })
            .sum();
        own + below
    }

    /// Weighted subtree count of `pixel` and the count-weighted mean direction
    /// of its entries. With no entries the direction is the pixel centre.
    pub fn photon_count_with_dir(&self, pixel: &HealPixel) -> (f64, SkyDir) {
        let area = pixel.area();
        let own = (*pixel, self.counts.get(pixel), 1.0);
        let below = self
            .counts
            .descendants(*pixel)
            .map(|(p, c)| (p, c, p.area() / area));

        let mut total = 0.0;
        let mut sum = [0.0f64; 3];
        for (p, count, weight) in std::iter::once(own).chain(below) {
            if count == 0 {
                continue;
            }
            let w = weight * count as f64;
            let d = p.dir();
            total += w;
            sum[0] += w * d.x();
            sum[1] += w * d.y();
            sum[2] += w * d.z();
        }

        let dir = SkyDir::from_xyz(sum[0], sum[1], sum[2]).unwrap_or_else(|_| pixel.dir());
        (total, dir)
    }

    /// Entries within `radius_deg` of `dir`, see [`extract::extract`].
    pub fn extract(
        &self,
        dir: &SkyDir,
        radius_deg: f64,
        summary_level: Option<u8>,
        select_level: Option<u8>,
    ) -> (Vec<(HealPixel, u64)>, u64) {
        let disc = Disc::from_degrees(*dir, radius_deg);
        extract::extract(
            &self.counts,
            &disc,
            summary_level.unwrap_or(self.min_level()),
            select_level,
        )
    }

    /// Single-level entries within `radius_deg` of `dir`, see [`extract::extract_level`].
    pub fn extract_level(
        &self,
        dir: &SkyDir,
        radius_deg: f64,
        select_level: Option<u8>,
        include_all: bool,
    ) -> (Vec<(HealPixel, u64)>, u64) {
        let disc = Disc::from_degrees(*dir, radius_deg);
        extract::extract_level(
            &self.counts,
            &disc,
            select_level.unwrap_or(self.min_level()),
            include_all,
        )
    }

    /// Per-band totals, lowest energy first.
    pub fn band_summary(&self) -> Vec<BandSummary> {
        let edges = self.binning.energy_bins();
        edges
            .iter()
            .enumerate()
            .map(|(i, &emin)| {
                let level = self.binning.min_level() + i as u8;
                let (photons, pixels) = self
                    .counts
                    .level(level)
                    .fold((0u64, 0usize), |(n, k), (_, c)| (n + c, k + 1));
                BandSummary {
                    level,
                    emin,
                    emax: edges.get(i + 1).copied(),
                    photons,
                    pixels,
                }
            })
            .collect()
    }
}

impl SkyFunction for PhotonMap {
    fn evaluate(&self, dir: &SkyDir) -> f64 {
        self.density(dir)
    }
}

impl SkySpectrum for PhotonMap {
    fn value(&self, dir: &SkyDir, energy: f64) -> f64 {
        PhotonMap::value(self, dir, energy)
    }

    fn integral(&self, dir: &SkyDir, a: f64, b: f64) -> f64 {
        PhotonMap::integral(self, dir, a, b)
    }

    fn name(&self) -> &str {
        PhotonMap::name(self)
    }
}

impl Extend<Photon> for PhotonMap {
    fn extend<I: IntoIterator<Item = Photon>>(&mut self, iter: I) {
        for photon in iter {
            self.add_photon(&photon);
        }
    }
}

impl<'a> Extend<&'a Photon> for PhotonMap {
    fn extend<I: IntoIterator<Item = &'a Photon>>(&mut self, iter: I) {
        for photon in iter {
            self.add_photon(photon);
        }
    }
}

impl fmt::Display for PhotonMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Photon map: {}", self.name)?;
        writeln!(
            f,
            "  Binning: emin={} MeV, ratio={:.4}, {} levels from level {}",
            self.binning.emin(),
            self.binning.eratio(),
            self.binning.levels(),
            self.binning.min_level()
        )?;
        writeln!(
            f,
            "  Total: {} photons in {} pixels",
            self.total_photons(),
            self.pixel_count()
        )?;
        writeln!(f, "  {:>10} {:>10} {:>6} {:>10} {:>8}", "emin", "emax", "level", "photons", "pixels")?;
        for band in self.band_summary() {
            let emax = band
                .emax
                .map_or_else(|| "-".to_string(), |e| format!("{:.0}", e));
            writeln!(
                f,
                "  {:>10.0} {:>10} {:>6} {:>10} {:>8}",
                band.emin, emax, band.level, band.photons, band.pixels
            )?;
        }
        Ok(())
    }
}
