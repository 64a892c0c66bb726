//! FITS persistence for [`PhotonMap`].
//!
//! A map is one `BINTABLE` extension named by the caller (default
//! [`DEFAULT_TABLE`]) with one row per entry:
//!
//! | Column | Format | Contents |
//! |--------|--------|----------|
//! | `LEVEL` | `1I` | pixel level (the energy band) |
//! | `INDEX` | `1K` | nested pixel index |
//! | `COUNT` | `1K` | photons |
//!
//! The binning travels as the keywords `EMIN`, `LOGERAT` (log10 of the band
//! ratio), `LEVELS` and `MINLEVEL`, the map name as `MAPNAME`. `PHOTONS` and
//! `PIXELS` are written for information only; totals are recomputed from the
//! rows on reading.

use crate::binning::EnergyBinning;
use crate::error::{PhotonMapError, Result};
use crate::map::PhotonMap;
use celestial_core::{AstroError, MathErrorKind};
use celestial_fits::{BinaryTable, ColumnData, FitsError, FitsFile, FitsWriter, Keyword};
use celestial_healpix::HealPixel;
use std::io::BufWriter;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

pub const DEFAULT_TABLE: &str = "PHOTONMAP";

const COL_LEVEL: &str = "LEVEL";
const COL_INDEX: &str = "INDEX";
const COL_COUNT: &str = "COUNT";

impl PhotonMap {
    /// Writes the map as table `table_name` of the FITS file at `path`.
    ///
    /// With `clobber` the file is replaced. Without it a missing file is
    /// created, a file lacking the table gets it appended, and a file that
    /// already has it is left alone and [`PhotonMapError::TableExists`] is
    /// returned. The file is assembled next to `path` and renamed into place,
    /// so a failed write leaves any previous file intact.
    pub fn write<P: AsRef<Path>>(&self, path: P, table_name: &str, clobber: bool) -> Result<()> {
        let path = path.as_ref();
        let table = self.to_table(table_name)?;

        let mut existing = if !clobber && path.exists() {
            Some(FitsFile::open(path)?)
        } else {
            None
        };
        if existing
            .as_ref()
            .is_some_and(|fits| fits.has_extension(table_name))
        {
            return Err(PhotonMapError::TableExists {
                path: path.display().to_string(),
                table: table_name.to_string(),
            });
        }

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged = NamedTempFile::new_in(dir)?;
        {
            let mut writer = FitsWriter::new(BufWriter::new(staged.as_file_mut()));
            match existing.as_mut() {
                Some(fits) => {
                    for index in 0..fits.num_hdus() {
                        writer.write_raw(&fits.read_raw_hdu(index)?)?;
                    }
                }
                None => writer.write_empty_primary(&[
                    Keyword::string("ORIGIN", "celestial-photons"),
                    Keyword::comment("multi-resolution photon map"),
                ])?,
            }
            writer.write_binary_table(&table)?;
            writer.into_inner()?;
        }
        staged.as_file().sync_all()?;
        drop(existing);
        staged.persist(path).map_err(|e| PhotonMapError::Io(e.error))?;

        debug!(
            path = %path.display(),
            table = table_name,
            entries = table.nrows(),
            photons = self.total_photons(),
            appended = !clobber,
            "wrote photon map"
        );
        Ok(())
    }

    /// Reads the map stored as table `table_name` (matched ignoring case).
    ///
    /// Without a `MAPNAME` keyword the map is named after the file stem.
    pub fn read<P: AsRef<Path>>(path: P, table_name: &str) -> Result<Self> {
        let path = path.as_ref();
        let mut fits = FitsFile::open(path)?;
        let table = fits.read_table(table_name)?;

        let binning = EnergyBinning::from_log_ratio(
            table.required_real("EMIN")?,
            table.required_real("LOGERAT")?,
            small_keyword(&table, "LEVELS")?,
            small_keyword(&table, "MINLEVEL")?,
        )?;

        let mut map = PhotonMap::new(binning);
        match table.optional_string("MAPNAME") {
            Some(name) => map.set_name(name),
            None => {
                if let Some(stem) = path.file_stem() {
                    map.set_name(stem.to_string_lossy());
                }
            }
        }

        let levels = integer_column(&table, COL_LEVEL)?;
        let indices = integer_column(&table, COL_INDEX)?;
        let counts = integer_column(&table, COL_COUNT)?;

        let rows = levels.iter().zip(&indices).zip(&counts);
        for (row, ((&level, &index), &count)) in rows.enumerate() {
            map.add_pixel(row_pixel(level, index)?, row_count(row, count)?);
        }

        debug!(
            path = %path.display(),
            table = table.name(),
            entries = map.pixel_count(),
            photons = map.total_photons(),
            "read photon map"
        );
        Ok(map)
    }

    fn to_table(&self, table_name: &str) -> Result<BinaryTable> {
        let n = self.pixel_count();
        let mut levels = Vec::with_capacity(n);
        let mut indices = Vec::with_capacity(n);
        let mut counts = Vec::with_capacity(n);
        for (pixel, count) in self.iter() {
            levels.push(i16::from(pixel.level()));
            indices.push(pixel.index() as i64);
            counts.push(i64::try_from(count).unwrap_or(i64::MAX));
        }

        let binning = self.binning();
        let keywords = [
            Keyword::real("EMIN", binning.emin()).with_comment("lower edge of first band [MeV]"),
            Keyword::real("LOGERAT", binning.log_ratio()).with_comment("log10 of band energy ratio"),
            Keyword::integer("LEVELS", i64::from(binning.levels()))
                .with_comment("number of energy bands"),
            Keyword::integer("MINLEVEL", i64::from(binning.min_level()))
                .with_comment("pixel level of first band"),
            Keyword::string("MAPNAME", self.name()),
            Keyword::integer("PHOTONS", i64::try_from(self.total_photons()).unwrap_or(i64::MAX))
                .with_comment("informational"),
            Keyword::integer("PIXELS", n as i64).with_comment("informational"),
        ];

        let mut table = BinaryTable::new(table_name);
        for keyword in keywords {
            table.add_keyword(keyword);
        }
        table.add_column(COL_LEVEL, ColumnData::I16(levels))?;
        table.add_column(COL_INDEX, ColumnData::I64(indices))?;
        table.add_column(COL_COUNT, ColumnData::I64(counts))?;
        Ok(table)
    }
}

fn small_keyword(table: &BinaryTable, name: &str) -> Result<u8> {
    let value = table.required_integer(name)?;
    u8::try_from(value).map_err(|_| {
        PhotonMapError::invalid_binning(format!("{} = {} is out of range", name, value))
    })
}

fn integer_column(table: &BinaryTable, name: &str) -> Result<Vec<i64>> {
    table
        .column(name)?
        .to_i64()
        .ok_or_else(|| {
            FitsError::UnsupportedFormat(format!("{} must be an integer column", name)).into()
        })
}

fn row_pixel(level: i64, index: i64) -> Result<HealPixel> {
    let (Ok(level), Ok(index)) = (u8::try_from(level), u64::try_from(index)) else {
        return Err(AstroError::math_error(
            "PhotonMap::read",
            MathErrorKind::OutOfRange,
            &format!("pixel level {} index {} is not a valid pixel", level, index),
        )
        .into());
    };
    Ok(HealPixel::new(level, index)?)
}

fn row_count(row: usize, count: i64) -> Result<u64> {
    u64::try_from(count).map_err(|_| {
        FitsError::InvalidFormat(format!("COUNT {} in row {} is out of range", count, row + 1)).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photon::Photon;
    use celestial_core::SkyDir;

    fn sample_map() -> PhotonMap {
        let mut map = PhotonMap::new(EnergyBinning::new(50.0, 3.0, 4, 3).unwrap());
        map.set_name("sample");
        for i in 0..40 {
            let dir = SkyDir::from_radec_deg(i as f64 * 9.0, (i as f64 * 4.0) - 80.0);
            map.add_photon(&Photon::new(dir, 50.0 * 1.7f64.powi(i % 8)));
        }
        map.add_pixel(HealPixel::new(3, 700).unwrap(), 1_000_000);
        map
    }

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.fits");
        let map = sample_map();
        map.write(&path, DEFAULT_TABLE, true).unwrap();

        let loaded = PhotonMap::read(&path, "photonmap").unwrap();
        assert_eq!(loaded, map);
        assert_eq!(loaded.binning(), map.binning());
        assert_eq!(loaded.name(), "sample");
        assert_eq!(loaded.total_photons(), map.total_photons());
        assert_eq!(loaded.pixel_count(), map.pixel_count());
    }

    #[test]
    fn test_roundtrip_beyond_u32_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bright.fits");
        let pixel = HealPixel::new(6, 42).unwrap();
        let mut map = PhotonMap::default();
        map.add_pixel(pixel, u64::from(u32::MAX));
        map.add_pixel(pixel, 10);
        let summed: u64 = map.iter().map(|(_, c)| c).sum();
        assert_eq!(map.total_photons(), summed);

        map.write(&path, DEFAULT_TABLE, true).unwrap();
        let loaded = PhotonMap::read(&path, DEFAULT_TABLE).unwrap();
        assert_eq!(loaded.total_photons(), u64::from(u32::MAX) + 10);
        assert_eq!(loaded, map);
    }

    #[test]
    fn test_no_clobber_appends_then_refuses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maps.fits");
        let front = sample_map();
        let mut back = PhotonMap::default();
        back.set_name("back");
        back.add_pixel(HealPixel::new(6, 1).unwrap(), 3);

        front.write(&path, "FRONT", false).unwrap();
        back.write(&path, "BACK", false).unwrap();

        assert_eq!(PhotonMap::read(&path, "FRONT").unwrap(), front);
        assert_eq!(PhotonMap::read(&path, "BACK").unwrap(), back);

        let before = std::fs::read(&path).unwrap();
        let err = back.write(&path, "back", false).unwrap_err();
        assert!(matches!(err, PhotonMapError::TableExists { .. }));
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_clobber_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maps.fits");
        sample_map().write(&path, "FRONT", true).unwrap();
        PhotonMap::default().write(&path, "OTHER", true).unwrap();

        assert!(matches!(
            PhotonMap::read(&path, "FRONT"),
            Err(PhotonMapError::Fits(FitsError::ExtensionNotFound { .. }))
        ));
        assert_eq!(PhotonMap::read(&path, "OTHER").unwrap().total_photons(), 0);
    }

    #[test]
    fn test_name_defaults_to_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vela_region.fits");
        let map = sample_map();
        let full = map.to_table(DEFAULT_TABLE).unwrap();
        let column = |name| full.column(name).unwrap().clone();
        let unnamed = BinaryTable::new(full.name())
            .with_keyword(Keyword::real("EMIN", 50.0))
            .with_keyword(Keyword::real("LOGERAT", 3f64.log10()))
            .with_keyword(Keyword::integer("LEVELS", 4))
            .with_keyword(Keyword::integer("MINLEVEL", 3))
            .with_column(COL_LEVEL, column(COL_LEVEL))
            .unwrap()
            .with_column(COL_INDEX, column(COL_INDEX))
            .unwrap()
            .with_column(COL_COUNT, column(COL_COUNT))
            .unwrap();
        let mut writer = FitsWriter::create(&path).unwrap();
        writer.write_empty_primary(&[]).unwrap();
        writer.write_binary_table(&unnamed).unwrap();
        writer.flush().unwrap();
        drop(writer);

        let loaded = PhotonMap::read(&path, DEFAULT_TABLE).unwrap();
        assert_eq!(loaded.name(), "vela_region");
        assert_eq!(loaded.total_photons(), map.total_photons());
    }

    #[test]
    fn test_read_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.fits");
        assert!(matches!(
            PhotonMap::read(&missing, DEFAULT_TABLE),
            Err(PhotonMapError::Fits(FitsError::Io(_)))
        ));

        let garbage = dir.path().join("garbage.fits");
        std::fs::write(&garbage, b"not a fits file").unwrap();
        assert!(matches!(
            PhotonMap::read(&garbage, DEFAULT_TABLE),
            Err(PhotonMapError::Fits(_))
        ));

        let no_binning = dir.path().join("no_binning.fits");
        let table = BinaryTable::new(DEFAULT_TABLE)
            .with_column(COL_LEVEL, ColumnData::I16(vec![6]))
            .unwrap();
        let mut writer = FitsWriter::create(&no_binning).unwrap();
        writer.write_empty_primary(&[]).unwrap();
        writer.write_binary_table(&table).unwrap();
        writer.flush().unwrap();
        drop(writer);
        assert!(matches!(
            PhotonMap::read(&no_binning, DEFAULT_TABLE),
            Err(PhotonMapError::Fits(FitsError::KeywordNotFound { .. }))
        ));
    }

    #[test]
    fn test_invalid_rows_are_rejected() {
        assert!(matches!(row_pixel(6, -1), Err(PhotonMapError::InvalidPixel(_))));
        assert!(matches!(row_pixel(30, 0), Err(PhotonMapError::InvalidPixel(_))));
        assert!(matches!(row_pixel(0, 12), Err(PhotonMapError::InvalidPixel(_))));
        assert!(row_pixel(0, 11).is_ok());
        assert!(row_count(0, -3).is_err());
        assert_eq!(row_count(0, i64::from(u32::MAX) + 1).unwrap(), 1 << 32);
    }
}
