//! Logarithmic energy bands and their pixel levels.
//!
//! Band `i` covers `[emin·ratio^i, emin·ratio^(i+1))` and is stored at pixel
//! level `min_level + i`, so higher-energy photons (with sharper PSFs) land
//! in finer pixels. The last band is open-ended upward.

use crate::error::{PhotonMapError, Result};
use celestial_healpix::MAX_LEVEL;

pub const DEFAULT_EMIN: f64 = 100.0;
pub const DEFAULT_ERATIO: f64 = 2.35;
pub const DEFAULT_LEVELS: u8 = 8;
pub const DEFAULT_MIN_LEVEL: u8 = 6;

/// Immutable binning parameters.
///
/// The ratio is held as its base-10 logarithm, the form it is persisted in,
/// so a map read back from disk bins exactly as the one written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyBinning {
    emin: f64,
    log_ratio: f64,
    levels: u8,
    min_level: u8,
}

impl Default for EnergyBinning {
    fn default() -> Self {
        Self {
            emin: DEFAULT_EMIN,
            log_ratio: DEFAULT_ERATIO.log10(),
            levels: DEFAULT_LEVELS,
            min_level: DEFAULT_MIN_LEVEL,
        }
    }
}

impl EnergyBinning {
    /// `levels` bands starting at `emin` MeV, each `eratio` times wider than
    /// the last, the first stored at pixel level `min_level`.
    pub fn new(emin: f64, eratio: f64, levels: u8, min_level: u8) -> Result<Self> {
        if !eratio.is_finite() || eratio <= 1.0 {
            return Err(PhotonMapError::invalid_binning(format!(
                "energy ratio must be finite and greater than 1, got {}",
                eratio
            )));
        }
        Self::from_log_ratio(emin, eratio.log10(), levels, min_level)
    }

    /// Same as [`new`](Self::new) with the ratio given as `log10(eratio)`.
    pub fn from_log_ratio(emin: f64, log_ratio: f64, levels: u8, min_level: u8) -> Result<Self> {
        if !emin.is_finite() || emin <= 0.0 {
            return Err(PhotonMapError::invalid_binning(format!(
                "minimum energy must be finite and positive, got {}",
                emin
            )));
        }
        if !log_ratio.is_finite() || log_ratio <= 0.0 {
            return Err(PhotonMapError::invalid_binning(format!(
                "log10 energy ratio must be finite and positive, got {}",
                log_ratio
            )));
        }
        if levels == 0 {
            return Err(PhotonMapError::invalid_binning("at least one level is required"));
        }
        if u16::from(min_level) + u16::from(levels) - 1 > u16::from(MAX_LEVEL) {
            return Err(PhotonMapError::invalid_binning(format!(
                "levels {}..={} exceed the deepest pixel level {}",
                min_level,
                u16::from(min_level) + u16::from(levels) - 1,
                MAX_LEVEL
            )));
        }
        Ok(Self {
            emin,
            log_ratio,
            levels,
            min_level,
        })
    }

    /// Lower edge of the first band, MeV.
    pub fn emin(&self) -> f64 {
        self.emin
    }

    pub fn eratio(&self) -> f64 {
        10f64.powf(self.log_ratio)
    }

    pub fn log_ratio(&self) -> f64 {
        self.log_ratio
    }

    /// Number of energy bands.
    pub fn levels(&self) -> u8 {
        self.levels
    }

    /// Pixel level of the lowest band.
    pub fn min_level(&self) -> u8 {
        self.min_level
    }

    /// Pixel level of the highest band.
    pub fn max_level(&self) -> u8 {
        self.min_level + self.levels - 1
    }

    /// Left edges of every band, lowest first.
    pub fn energy_bins(&self) -> Vec<f64> {
        (0..self.levels).map(|i| self.edge(i)).collect()
    }

    /// Band holding `energy`. Energies below `emin`, and non-finite or
    /// non-positive ones, go to band 0; energies past the top edge go to the
    /// last band.
    pub fn bin_index(&self, energy: f64) -> u8 {
        if !energy.is_finite() || energy <= self.emin {
            return 0;
        }
        let top = self.levels - 1;
        let estimate = ((energy / self.emin).log10() / self.log_ratio).floor();
        let mut index = if estimate >= f64::from(top) {
            top
        } else {
            estimate.max(0.0) as u8
        };

        // The log estimate can be one off at an edge; settle against the edges themselves.
        while index > 0 && energy < self.edge(index) {
            index -= 1;
        }
        while index < top && energy >= self.edge(index + 1) {
            index += 1;
        }
        index
    }

    /// Pixel level used for photons of `energy`.
    pub fn bin_level(&self, energy: f64) -> u8 {
        self.min_level + self.bin_index(energy)
    }

    /// Left edge of the band stored at `level`, `None` outside the configured levels.
    pub fn level_energy(&self, level: u8) -> Option<f64> {
        let index = level.checked_sub(self.min_level)?;
        (index < self.levels).then(|| self.edge(index))
    }

    fn edge(&self, index: u8) -> f64 {
        self.emin * 10f64.powf(f64::from(index) * self.log_ratio)
    }
}

#[cfg(feature = "serde")]
mod serde_ {
    use super::EnergyBinning;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Raw {
        emin: f64,
        eratio: f64,
        levels: u8,
        min_level: u8,
    }

    impl Serialize for EnergyBinning {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            Raw {
                emin: self.emin,
                eratio: self.eratio(),
                levels: self.levels,
                min_level: self.min_level,
            }
            .serialize(s)
        }
    }

    impl<'de> Deserialize<'de> for EnergyBinning {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            let raw = Raw::deserialize(d)?;
            EnergyBinning::new(raw.emin, raw.eratio, raw.levels, raw.min_level)
                .map_err(de::Error::custom)
        }
    }
}
