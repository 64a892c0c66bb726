use crate::header::{Header, HeaderParser, BLOCK_SIZE};
use crate::table::{BinaryTable, ColumnData, ColumnFormat};
use crate::{FitsError, Result};
use byteorder::{BigEndian, ByteOrder};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::trace;

/// Location of one HDU inside the file.
#[derive(Debug, Clone)]
pub struct HduInfo {
    pub index: usize,
    pub header_start: u64,
    pub header_size: usize,
    pub data_start: u64,
    /// Data bytes including the padding to the next block.
    pub data_size: usize,
    pub extname: Option<String>,
    pub xtension: Option<String>,
}

impl HduInfo {
    pub fn end(&self) -> u64 {
        self.data_start + self.data_size as u64
    }

    pub fn is_binary_table(&self) -> bool {
        self.xtension.as_deref() == Some("BINTABLE")
    }
}

/// A FITS file opened for reading. All HDUs are located when it is opened.
#[derive(Debug)]
pub struct FitsFile<R> {
    reader: R,
    hdus: Vec<HduInfo>,
}

impl FitsFile<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> FitsFile<R> {
    pub fn new(reader: R) -> Result<Self> {
        let mut fits = FitsFile {
            reader,
            hdus: Vec::new(),
        };
        fits.scan_hdus()?;
        Ok(fits)
    }

    pub fn num_hdus(&self) -> usize {
        self.hdus.len()
    }

    pub fn hdus(&self) -> &[HduInfo] {
        &self.hdus
    }

    pub fn hdu_info(&self, index: usize) -> Option<&HduInfo> {
        self.hdus.get(index)
    }

    /// Index of the extension whose `EXTNAME` matches `name`, ignoring case
    /// and surrounding blanks.
    pub fn find_extension(&self, name: &str) -> Option<usize> {
        let wanted = name.trim();
        self.hdus
            .iter()
            .skip(1)
            .find(|hdu| {
                hdu.extname
                    .as_deref()
                    .is_some_and(|n| n.trim().eq_ignore_ascii_case(wanted))
            })
            .map(|hdu| hdu.index)
    }

    pub fn has_extension(&self, name: &str) -> bool {
        self.find_extension(name).is_some()
    }

    pub fn read_header(&mut self, index: usize) -> Result<Header> {
        let info = self.info(index)?.clone();
        let bytes = self.read_at(info.header_start, info.header_size)?;
        HeaderParser::parse_header(&bytes)
    }

    /// Header and data bytes of one HDU exactly as stored.
    pub fn read_raw_hdu(&mut self, index: usize) -> Result<Vec<u8>> {
        let info = self.info(index)?.clone();
        self.read_at(info.header_start, (info.end() - info.header_start) as usize)
    }

    /// Reads the binary table extension named `name`.
    pub fn read_table(&mut self, name: &str) -> Result<BinaryTable> {
        let index = self
            .find_extension(name)
            .ok_or_else(|| FitsError::ExtensionNotFound {
                name: name.to_string(),
            })?;
        self.read_binary_table(index)
    }

    /// Reads the binary table at HDU `index`. Columns with a format other than
    /// a single `I`, `J`, `K`, `E` or `D` element are skipped.
    pub fn read_binary_table(&mut self, index: usize) -> Result<BinaryTable> {
        let info = self.info(index)?.clone();
        if !info.is_binary_table() {
            return Err(FitsError::InvalidFormat(format!(
                "HDU {} is not a binary table",
                index
            )));
        }

        let header = self.read_header(index)?;
        let row_width = non_negative(&header, "NAXIS1")?;
        let nrows = non_negative(&header, "NAXIS2")?;
        let tfields = non_negative(&header, "TFIELDS")?;

        let mut layout = Vec::with_capacity(tfields);
        let mut offset = 0usize;
        for n in 1..=tfields {
            let tform_key = format!("TFORM{}", n);
            let tform = header
                .optional_string(&tform_key)
                .ok_or_else(|| FitsError::keyword_not_found(&tform_key))?;
            let format = ColumnFormat::parse(tform)?;
            let name = header
                .optional_string(&format!("TTYPE{}", n))
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| format!("COL{}", n));
            layout.push((name, format, offset));
            offset += format.width();
        }
        if offset != row_width {
            return Err(FitsError::InvalidFormat(format!(
                "Column widths sum to {} bytes but NAXIS1 is {}",
                offset, row_width
            )));
        }

        let data_len = row_width
            .checked_mul(nrows)
            .filter(|&len| len <= info.data_size)
            .ok_or_else(|| {
                FitsError::InvalidFormat(format!(
                    "NAXIS1 = {} and NAXIS2 = {} exceed the {} byte data unit",
                    row_width, nrows, info.data_size
                ))
            })?;
        let data = self.read_at(info.data_start, data_len)?;

        let extname = info.extname.clone().unwrap_or_default();
        let mut table = BinaryTable::new(extname.trim());
        for keyword in header.keywords() {
            table.add_keyword(keyword.clone());
        }

        for (name, format, offset) in layout {
            let Some(mut column) = ColumnData::with_capacity(format, nrows) else {
                trace!(column = %name, tform = %format.tform(), "skipping column");
                continue;
            };
            for row in data.chunks_exact(row_width.max(1)).take(nrows) {
                decode_cell(&mut column, &row[offset..offset + format.width()]);
            }
            table.add_column(name, column)?;
        }

        Ok(table)
    }

    fn info(&self, index: usize) -> Result<&HduInfo> {
        self.hdus
            .get(index)
            .ok_or_else(|| FitsError::InvalidFormat(format!("HDU {} does not exist", index)))
    }

    fn read_at(&mut self, position: u64, len: usize) -> Result<Vec<u8>> {
        self.reader.seek(SeekFrom::Start(position))?;
        let mut buffer = vec![0u8; len];
        self.reader
            .read_exact(&mut buffer)
            .map_err(FitsError::from_read)?;
        Ok(buffer)
    }

    fn scan_hdus(&mut self) -> Result<()> {
        let file_len = self.reader.seek(SeekFrom::End(0))?;
        let mut position = 0u64;

        while position < file_len {
            let info = self.scan_single_hdu(position, self.hdus.len())?;
            if info.data_size as u64 > file_len.saturating_sub(info.data_start) {
                return Err(FitsError::UnexpectedEof);
            }
            trace!(
                index = info.index,
                extname = info.extname.as_deref().unwrap_or(""),
                header_start = info.header_start,
                data_size = info.data_size,
                "found HDU"
            );
            position = info.end();
            self.hdus.push(info);
        }

        if self.hdus.is_empty() {
            return Err(FitsError::InvalidFormat("File contains no HDU".to_string()));
        }
        Ok(())
    }

    fn scan_single_hdu(&mut self, position: u64, index: usize) -> Result<HduInfo> {
        self.reader.seek(SeekFrom::Start(position))?;

        let mut header_bytes = Vec::new();
        let mut block = [0u8; BLOCK_SIZE];
        loop {
            self.reader
                .read_exact(&mut block)
                .map_err(FitsError::from_read)?;
            header_bytes.extend_from_slice(&block);
            if HeaderParser::block_has_end(&block) {
                break;
            }
        }

        let header = HeaderParser::parse_header(&header_bytes)?;
        if index == 0 && header.get_keyword("SIMPLE").is_none() {
            return Err(FitsError::InvalidFormat(
                "Primary header does not start with SIMPLE".to_string(),
            ));
        }
        if index > 0 && !header.is_extension() {
            return Err(FitsError::InvalidFormat(format!(
                "HDU {} has no XTENSION keyword",
                index
            )));
        }

        let data_start = position + header_bytes.len() as u64;
        Ok(HduInfo {
            index,
            header_start: position,
            header_size: header_bytes.len(),
            data_start,
            data_size: padded_data_size(&header)?,
            extname: header.optional_string("EXTNAME").map(str::to_string),
            xtension: header
                .optional_string("XTENSION")
                .map(|s| s.trim().to_string()),
        })
    }
}

/// `|BITPIX| / 8 · GCOUNT · (PCOUNT + NAXIS1 · … · NAXISn)`, rounded up to blocks.
fn padded_data_size(header: &Header) -> Result<usize> {
    let naxis = non_negative(header, "NAXIS")?;
    if naxis == 0 {
        return Ok(0);
    }

    let bitpix = header.required_integer("BITPIX")?;
    let too_large = || FitsError::InvalidFormat("Data unit size overflows".to_string());
    let mut elements = 1usize;
    for n in 1..=naxis {
        elements = elements
            .checked_mul(non_negative(header, &format!("NAXIS{}", n))?)
            .ok_or_else(too_large)?;
    }

    let pcount = optional_count(header, "PCOUNT", 0)?;
    let gcount = optional_count(header, "GCOUNT", 1)?;
    let bytes = pcount
        .checked_add(elements)
        .and_then(|n| n.checked_mul(gcount))
        .and_then(|n| n.checked_mul(bitpix.unsigned_abs() as usize / 8))
        .ok_or_else(too_large)?;

    bytes
        .div_ceil(BLOCK_SIZE)
        .checked_mul(BLOCK_SIZE)
        .ok_or_else(too_large)
}

fn non_negative(header: &Header, name: &str) -> Result<usize> {
    let value = header.required_integer(name)?;
    usize::try_from(value).map_err(|_| FitsError::InvalidKeywordValue {
        keyword: name.to_string(),
        value: value.to_string(),
    })
}

fn optional_count(header: &Header, name: &str, default: usize) -> Result<usize> {
    if header.get_keyword_value(name).is_some() {
        non_negative(header, name)
    } else {
        Ok(default)
    }
}

fn decode_cell(column: &mut ColumnData, bytes: &[u8]) {
    match column {
        ColumnData::I16(v) => v.push(BigEndian::read_i16(bytes)),
        ColumnData::I32(v) => v.push(BigEndian::read_i32(bytes)),
        ColumnData::I64(v) => v.push(BigEndian::read_i64(bytes)),
        ColumnData::F32(v) => v.push(BigEndian::read_f32(bytes)),
        ColumnData::F64(v) => v.push(BigEndian::read_f64(bytes)),
    }
}
