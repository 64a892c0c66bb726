//! Multi-resolution photon sky maps.
//!
//! A [`PhotonMap`] histograms detected photons by direction and energy. Energy
//! is cut into logarithmic bands and each band is stored at its own HEALPix
//! level, finer for higher energies. Counts live in a sparse ordered store, so
//! subtree sums and cone extractions touch only the entries they need.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`binning`] | [`EnergyBinning`]: band edges and the energy → level mapping |
//! | [`store`] | [`CellCounts`]: ordered pixel → count store, subtree ranges, disc walk |
//! | [`map`] | [`PhotonMap`]: insertion, density, counting, centroids, band summary |
//! | [`extract`] | Summary-level and single-level cone extraction |
//! | [`persist`] | FITS binary-table write (clobber/append) and read |
//! | [`sky`] | [`SkyFunction`] and [`SkySpectrum`] evaluation traits |
//! | [`photon`] | [`Photon`] event record |
//! | [`error`] | [`PhotonMapError`] and [`Result`] |
//!
//! # Quick Start
//!
//! ```
//! use celestial_core::SkyDir;
//! use celestial_photons::{Photon, PhotonMap};
//!
//! let mut map = PhotonMap::default();
//! let vela = SkyDir::from_radec_deg(128.8, -45.2);
//! map.add_photon(&Photon::new(vela, 150.0));
//! map.add_photon(&Photon::new(vela, 2_000.0));
//!
//! assert_eq!(map.total_photons(), 2);
//! assert!(map.density(&vela) > 0.0);
//!
//! let (cells, total) = map.extract(&vela, 2.0, None, None);
//! assert_eq!(total, 2);
//! assert_eq!(cells.len(), 1);
//! ```

pub mod binning;
pub mod error;
pub mod extract;
pub mod map;
pub mod persist;
pub mod photon;
pub mod sky;
pub mod store;

pub use binning::EnergyBinning;
pub use error::{PhotonMapError, Result};
pub use map::{BandSummary, PhotonMap};
pub use persist::DEFAULT_TABLE;
pub use photon::Photon;
pub use sky::{SkyFunction, SkySpectrum};
pub use store::CellCounts;
