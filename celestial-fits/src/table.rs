//! In-memory binary tables.
//!
//! A [`BinaryTable`] is a named set of equal-length scalar columns plus any
//! extra header keywords that travel with the table. Only one-element numeric
//! columns can be held in memory; other column formats are understood well
//! enough to compute row widths so their bytes can be skipped when reading.

use crate::header::{Keyword, KeywordValue};
use crate::{FitsError, Result};

/// Element type of a binary table column, by its `TFORM` letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Logical,
    Bit,
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
    ComplexFloat,
    ComplexDouble,
    Descriptor32,
    Descriptor64,
}

/// A parsed `TFORMn` value: repeat count and element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnFormat {
    pub repeat: usize,
    pub kind: ColumnType,
}

impl ColumnType {
    fn from_code(code: char) -> Option<Self> {
        let kind = match code {
            'L' => Self::Logical,
            'X' => Self::Bit,
            'B' => Self::Byte,
            'I' => Self::Short,
            'J' => Self::Int,
            'K' => Self::Long,
            'A' => Self::Char,
            'E' => Self::Float,
            'D' => Self::Double,
            'C' => Self::ComplexFloat,
            'M' => Self::ComplexDouble,
            'P' => Self::Descriptor32,
            'Q' => Self::Descriptor64,
            _ => return None,
        };
        Some(kind)
    }

    pub fn code(&self) -> char {
        match self {
            Self::Logical => 'L',
            Self::Bit => 'X',
            Self::Byte => 'B',
            Self::Short => 'I',
            Self::Int => 'J',
            Self::Long => 'K',
            Self::Char => 'A',
            Self::Float => 'E',
            Self::Double => 'D',
            Self::ComplexFloat => 'C',
            Self::ComplexDouble => 'M',
            Self::Descriptor32 => 'P',
            Self::Descriptor64 => 'Q',
        }
    }

    /// Bytes per element in the row; bit columns are handled by [`ColumnFormat::width`].
    pub fn element_size(&self) -> usize {
        match self {
            Self::Logical | Self::Bit | Self::Byte | Self::Char => 1,
            Self::Short => 2,
            Self::Int | Self::Float => 4,
            Self::Long | Self::Double | Self::ComplexFloat | Self::Descriptor32 => 8,
            Self::ComplexDouble | Self::Descriptor64 => 16,
        }
    }
}

impl ColumnFormat {
    /// Parses a `TFORM` value such as `1K`, `E` or `16A`.
    ///
    /// Variable-length descriptors (`1PE`, `QJ`) are accepted; only their
    /// descriptor width matters here.
    pub fn parse(format: &str) -> Result<Self> {
        let format = format.trim();
        if format.is_empty() {
            return Err(FitsError::InvalidFormat("Empty column format".to_string()));
        }

        let digits = format.chars().take_while(|c| c.is_ascii_digit()).count();
        let repeat = if digits == 0 {
            1
        } else {
            format[..digits].parse().map_err(|_| {
                FitsError::InvalidFormat(format!("Invalid repeat count in format '{}'", format))
            })?
        };

        let code = format[digits..].chars().next().ok_or_else(|| {
            FitsError::InvalidFormat(format!(
                "Invalid FITS format '{}' - missing data type",
                format
            ))
        })?;
        let kind = ColumnType::from_code(code)
            .ok_or_else(|| FitsError::UnsupportedFormat(format.to_string()))?;

        Ok(Self { repeat, kind })
    }

    /// Bytes the column occupies in one row.
    pub fn width(&self) -> usize {
        match self.kind {
            ColumnType::Bit => self.repeat.div_ceil(8),
            kind => self.repeat * kind.element_size(),
        }
    }

    /// `TFORM` text, e.g. `1K`.
    pub fn tform(&self) -> String {
        format!("{}{}", self.repeat, self.kind.code())
    }
}

/// Values of one scalar column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            Self::I16(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::I64(v) => v.len(),
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn format(&self) -> ColumnFormat {
        let kind = match self {
            Self::I16(_) => ColumnType::Short,
            Self::I32(_) => ColumnType::Int,
            Self::I64(_) => ColumnType::Long,
            Self::F32(_) => ColumnType::Float,
            Self::F64(_) => ColumnType::Double,
        };
        ColumnFormat { repeat: 1, kind }
    }

    /// Integer column widened to `i64`; `None` for floating point columns.
    pub fn to_i64(&self) -> Option<Vec<i64>> {
        match self {
            Self::I16(v) => Some(v.iter().map(|&x| i64::from(x)).collect()),
            Self::I32(v) => Some(v.iter().map(|&x| i64::from(x)).collect()),
            Self::I64(v) => Some(v.clone()),
            Self::F32(_) | Self::F64(_) => None,
        }
    }

    /// Any numeric column as `f64`.
    pub fn to_f64(&self) -> Vec<f64> {
        match self {
            Self::I16(v) => v.iter().map(|&x| f64::from(x)).collect(),
            Self::I32(v) => v.iter().map(|&x| f64::from(x)).collect(),
            Self::I64(v) => v.iter().map(|&x| x as f64).collect(),
            Self::F32(v) => v.iter().map(|&x| f64::from(x)).collect(),
            Self::F64(v) => v.clone(),
        }
    }

    pub(crate) fn with_capacity(format: ColumnFormat, rows: usize) -> Option<Self> {
        if format.repeat != 1 {
            return None;
        }
        let data = match format.kind {
            ColumnType::Short => Self::I16(Vec::with_capacity(rows)),
            ColumnType::Int => Self::I32(Vec::with_capacity(rows)),
            ColumnType::Long => Self::I64(Vec::with_capacity(rows)),
            ColumnType::Float => Self::F32(Vec::with_capacity(rows)),
            ColumnType::Double => Self::F64(Vec::with_capacity(rows)),
            _ => return None,
        };
        Some(data)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryTable {
    name: String,
    keywords: Vec<Keyword>,
    columns: Vec<Column>,
}

impl BinaryTable {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            keywords: Vec::new(),
            columns: Vec::new(),
        }
    }

    /// The table's `EXTNAME`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Adds a header keyword. Structural keywords are ignored; the writer
    /// derives them from the columns.
    pub fn with_keyword(mut self, keyword: Keyword) -> Self {
        self.add_keyword(keyword);
        self
    }

    pub fn add_keyword(&mut self, keyword: Keyword) {
        if keyword.is_structural() {
            return;
        }
        match self.keywords.iter_mut().find(|k| k.name == keyword.name) {
            Some(existing) if keyword.value.is_some() => *existing = keyword,
            _ => self.keywords.push(keyword),
        }
    }

    /// Appends a column; its length must match the columns already present.
    pub fn add_column<S: Into<String>>(&mut self, name: S, data: ColumnData) -> Result<()> {
        let name = name.into();
        if let Some(first) = self.columns.first() {
            if first.data.len() != data.len() {
                return Err(FitsError::InvalidFormat(format!(
                    "Column {} has {} rows, table has {}",
                    name,
                    data.len(),
                    first.data.len()
                )));
            }
        }
        self.columns.push(Column { name, data });
        Ok(())
    }

    pub fn with_column<S: Into<String>>(mut self, name: S, data: ColumnData) -> Result<Self> {
        self.add_column(name, data)?;
        Ok(self)
    }

    pub fn nrows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data.len())
    }

    /// Bytes per row in the written table.
    pub fn row_width(&self) -> usize {
        self.columns.iter().map(|c| c.data.format().width()).sum()
    }

    /// Column by `TTYPE` name, compared case-insensitively.
    pub fn column(&self, name: &str) -> Result<&ColumnData> {
        self.columns
            .iter()
            .find(|c| c.name.trim().eq_ignore_ascii_case(name))
            .map(|c| &c.data)
            .ok_or_else(|| FitsError::ColumnNotFound {
                name: name.to_string(),
            })
    }

    pub fn keyword_value(&self, name: &str) -> Option<&KeywordValue> {
        self.keywords
            .iter()
            .find(|k| k.name == name)
            .and_then(|k| k.value.as_ref())
    }

    pub fn required_integer(&self, name: &str) -> Result<i64> {
        let value = self
            .keyword_value(name)
            .ok_or_else(|| FitsError::keyword_not_found(name))?;
        value.as_integer().ok_or_else(|| FitsError::InvalidKeywordValue {
            keyword: name.to_string(),
            value: value.to_string(),
        })
    }

    pub fn required_real(&self, name: &str) -> Result<f64> {
        let value = self
            .keyword_value(name)
            .ok_or_else(|| FitsError::keyword_not_found(name))?;
        value.as_real().ok_or_else(|| FitsError::InvalidKeywordValue {
            keyword: name.to_string(),
            value: value.to_string(),
        })
    }

    pub fn optional_string(&self, name: &str) -> Option<&str> {
        self.keyword_value(name)?.as_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        let k = ColumnFormat::parse("1K").unwrap();
        assert_eq!(k, ColumnFormat { repeat: 1, kind: ColumnType::Long });
        assert_eq!(k.width(), 8);

        let e = ColumnFormat::parse("E").unwrap();
        assert_eq!(e.repeat, 1);
        assert_eq!(e.width(), 4);

        assert_eq!(ColumnFormat::parse("20A").unwrap().width(), 20);
        assert_eq!(ColumnFormat::parse("11X").unwrap().width(), 2);
        assert_eq!(ColumnFormat::parse("1PE(100)").unwrap().width(), 8);
        assert_eq!(ColumnFormat::parse(" 1I ").unwrap().tform(), "1I");
    }

    #[test]
    fn test_parse_rejects_bad_formats() {
        assert!(matches!(
            ColumnFormat::parse(""),
            Err(FitsError::InvalidFormat(_))
        ));
        assert!(matches!(
            ColumnFormat::parse("12"),
            Err(FitsError::InvalidFormat(_))
        ));
        assert!(matches!(
            ColumnFormat::parse("1Z"),
            Err(FitsError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_column_conversions() {
        let col = ColumnData::I16(vec![1, -2, 3]);
        assert_eq!(col.to_i64(), Some(vec![1, -2, 3]));
        assert_eq!(col.to_f64(), vec![1.0, -2.0, 3.0]);
        assert_eq!(ColumnData::F32(vec![0.5]).to_i64(), None);
        assert_eq!(col.format().tform(), "1I");
    }

    #[test]
    fn test_table_columns_must_match() {
        let mut table = BinaryTable::new("T");
        table.add_column("A", ColumnData::I32(vec![1, 2])).unwrap();
        assert!(table.add_column("B", ColumnData::I64(vec![1])).is_err());
        table.add_column("B", ColumnData::F64(vec![1.0, 2.0])).unwrap();
        assert_eq!(table.nrows(), 2);
        assert_eq!(table.row_width(), 12);
        assert!(table.column("a").is_ok());
        assert!(matches!(
            table.column("C"),
            Err(FitsError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_table_keywords() {
        let table = BinaryTable::new("T")
            .with_keyword(Keyword::integer("NAXIS2", 99))
            .with_keyword(Keyword::real("EMIN", 100.0))
            .with_keyword(Keyword::real("EMIN", 50.0))
            .with_keyword(Keyword::string("MAPNAME", "m"));
        assert_eq!(table.keywords().len(), 2);
        assert_eq!(table.required_real("EMIN").unwrap(), 50.0);
        assert_eq!(table.optional_string("MAPNAME"), Some("m"));
        assert!(matches!(
            table.required_integer("LEVELS"),
            Err(FitsError::KeywordNotFound { .. })
        ));
    }
}
