//! Evaluation interfaces for anything that assigns a value to a sky direction.

use celestial_core::SkyDir;

/// A scalar function on the sphere.
pub trait SkyFunction {
    fn evaluate(&self, dir: &SkyDir) -> f64;
}

/// A sky function that also resolves energy.
pub trait SkySpectrum: SkyFunction {
    /// Differential value at `dir` and `energy` (MeV).
    fn value(&self, dir: &SkyDir, energy: f64) -> f64;

    /// Value over the energy interval `[a, b)`.
    fn integral(&self, dir: &SkyDir, a: f64, b: f64) -> f64;

    fn name(&self) -> &str;
}
