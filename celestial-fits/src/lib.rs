//! Minimal FITS binary-table support.
//!
//! Enough of the FITS standard to store and recover tabular sky products:
//! an empty primary HDU followed by `BINTABLE` extensions of scalar numeric
//! columns, located by their `EXTNAME`.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`header`] | Header cards, keyword values, header block parsing |
//! | [`table`] | [`BinaryTable`], column formats and column data |
//! | [`writer`] | [`FitsWriter`]: sequential HDU output |
//! | [`reader`] | [`FitsFile`]: HDU scan, extension lookup, table decoding |
//!
//! ```
//! use celestial_fits::{BinaryTable, ColumnData, FitsFile, FitsWriter, Keyword};
//! use std::io::Cursor;
//!
//! let table = BinaryTable::new("EVENTS")
//!     .with_keyword(Keyword::real("EMIN", 100.0))
//!     .with_column("ENERGY", ColumnData::F64(vec![150.0, 420.0]))?;
//!
//! let mut writer = FitsWriter::new(Vec::new());
//! writer.write_empty_primary(&[])?;
//! writer.write_binary_table(&table)?;
//! let bytes = writer.into_inner()?;
//!
//! let mut fits = FitsFile::new(Cursor::new(bytes))?;
//! let events = fits.read_table("events")?;
//! assert_eq!(events.column("ENERGY")?.to_f64(), vec![150.0, 420.0]);
//! # Ok::<(), celestial_fits::FitsError>(())
//! ```

pub mod errors;
pub mod header;
pub mod reader;
pub mod table;
pub mod writer;

pub use errors::{FitsError, Result};
pub use header::{Header, Keyword, KeywordValue};
pub use reader::{FitsFile, HduInfo};
pub use table::{BinaryTable, Column, ColumnData, ColumnFormat, ColumnType};
pub use writer::FitsWriter;
