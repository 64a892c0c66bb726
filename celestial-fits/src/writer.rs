use crate::header::{pad_to_block, Header, Keyword};
use crate::table::{BinaryTable, ColumnData};
use crate::Result;
use byteorder::{BigEndian, WriteBytesExt};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::trace;

/// Sequential HDU writer. HDUs are emitted in call order, each padded to
/// whole 2880-byte blocks.
pub struct FitsWriter<W: Write> {
    writer: W,
}

impl FitsWriter<BufWriter<File>> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> FitsWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Primary HDU with no data array, announcing extensions.
    pub fn write_empty_primary(&mut self, keywords: &[Keyword]) -> Result<()> {
        let mut header = Header::new();
        header.add_keyword(Keyword::logical("SIMPLE", true).with_comment("conforms to FITS standard"));
        header.add_keyword(Keyword::integer("BITPIX", 8));
        header.add_keyword(Keyword::integer("NAXIS", 0));
        header.add_keyword(Keyword::logical("EXTEND", true));
        for keyword in keywords.iter().filter(|k| !k.is_structural()) {
            header.add_keyword(keyword.clone());
        }
        self.writer.write_all(&header.to_bytes())?;
        Ok(())
    }

    /// `BINTABLE` extension holding every column of `table`, rows in order.
    pub fn write_binary_table(&mut self, table: &BinaryTable) -> Result<()> {
        let header = Self::build_table_header(table);
        self.writer.write_all(&header.to_bytes())?;

        let mut data = Vec::with_capacity(table.nrows() * table.row_width());
        for row in 0..table.nrows() {
            for column in table.columns() {
                write_cell(&mut data, &column.data, row)?;
            }
        }
        pad_to_block(&mut data, 0);
        self.writer.write_all(&data)?;

        trace!(
            extname = table.name(),
            rows = table.nrows(),
            bytes = data.len(),
            "wrote binary table"
        );
        Ok(())
    }

    /// Copies already-encoded HDU bytes (header and data) unchanged.
    pub fn write_raw(&mut self, hdu_bytes: &[u8]) -> Result<()> {
        self.writer.write_all(hdu_bytes)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes and hands back the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn build_table_header(table: &BinaryTable) -> Header {
        let mut header = Header::new();
        header.add_keyword(Keyword::string("XTENSION", "BINTABLE").with_comment("binary table extension"));
        header.add_keyword(Keyword::integer("BITPIX", 8));
        header.add_keyword(Keyword::integer("NAXIS", 2));
        header.add_keyword(Keyword::integer("NAXIS1", table.row_width() as i64).with_comment("bytes per row"));
        header.add_keyword(Keyword::integer("NAXIS2", table.nrows() as i64).with_comment("number of rows"));
        header.add_keyword(Keyword::integer("PCOUNT", 0));
        header.add_keyword(Keyword::integer("GCOUNT", 1));
        header.add_keyword(Keyword::integer("TFIELDS", table.columns().len() as i64));

        for (i, column) in table.columns().iter().enumerate() {
            let n = i + 1;
            header.add_keyword(Keyword::string(format!("TTYPE{}", n), column.name.as_str()));
            header.add_keyword(Keyword::string(format!("TFORM{}", n), column.data.format().tform()));
        }

        header.add_keyword(Keyword::string("EXTNAME", table.name()));
        for keyword in table.keywords() {
            header.add_keyword(keyword.clone());
        }
        header
    }
}

fn write_cell(out: &mut Vec<u8>, data: &ColumnData, row: usize) -> Result<()> {
    match data {
        ColumnData::I16(v) => out.write_i16::<BigEndian>(v[row])?,
        ColumnData::I32(v) => out.write_i32::<BigEndian>(v[row])?,
        ColumnData::I64(v) => out.write_i64::<BigEndian>(v[row])?,
        ColumnData::F32(v) => out.write_f32::<BigEndian>(v[row])?,
        ColumnData::F64(v) => out.write_f64::<BigEndian>(v[row])?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{HeaderParser, KeywordValue};

    const BLOCK: usize = 2880;

    #[test]
    fn test_empty_primary_is_one_block() {
        let mut writer = FitsWriter::new(Vec::new());
        writer
            .write_empty_primary(&[Keyword::string("ORIGIN", "photonmap")])
            .unwrap();
        let bytes = writer.into_inner().unwrap();
        assert_eq!(bytes.len(), BLOCK);
        assert_eq!(&bytes[0..30], b"SIMPLE  =                    T");

        let header = HeaderParser::parse_header(&bytes).unwrap();
        assert_eq!(header.required_integer("NAXIS").unwrap(), 0);
        assert_eq!(header.optional_string("ORIGIN"), Some("photonmap"));
    }

    #[test]
    fn test_binary_table_layout() {
        let table = BinaryTable::new("COUNTS")
            .with_keyword(Keyword::real("EMIN", 100.0))
            .with_column("LEVEL", ColumnData::I16(vec![6, 7]))
            .unwrap()
            .with_column("COUNT", ColumnData::I64(vec![1, 0x0102_0304_0506_0708]))
            .unwrap();

        let mut writer = FitsWriter::new(Vec::new());
        writer.write_binary_table(&table).unwrap();
        let bytes = writer.into_inner().unwrap();
        assert_eq!(bytes.len(), 2 * BLOCK);

        let header = HeaderParser::parse_header(&bytes[..BLOCK]).unwrap();
        assert_eq!(
            header.get_keyword_value("XTENSION"),
            Some(&KeywordValue::String("BINTABLE".to_string()))
        );
        assert_eq!(header.required_integer("NAXIS1").unwrap(), 10);
        assert_eq!(header.required_integer("NAXIS2").unwrap(), 2);
        assert_eq!(header.optional_string("TFORM2"), Some("1K"));
        assert_eq!(header.optional_string("EXTNAME"), Some("COUNTS"));
        assert_eq!(header.required_real("EMIN").unwrap(), 100.0);

        let data = &bytes[BLOCK..];
        assert_eq!(&data[0..2], &[0, 6]);
        assert_eq!(&data[2..10], &[0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(&data[10..12], &[0, 7]);
        assert_eq!(&data[12..20], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(data[20..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_empty_table_has_no_data_blocks() {
        let table = BinaryTable::new("EMPTY")
            .with_column("LEVEL", ColumnData::I16(Vec::new()))
            .unwrap();
        let mut writer = FitsWriter::new(Vec::new());
        writer.write_binary_table(&table).unwrap();
        assert_eq!(writer.into_inner().unwrap().len(), BLOCK);
    }
}
