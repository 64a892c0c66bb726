use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub name: String,
    pub value: Option<KeywordValue>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeywordValue {
    Logical(bool),
    Integer(i64),
    Real(f64),
    String(String),
}

impl Keyword {
    pub fn new(name: String) -> Self {
        Self {
            name,
            value: None,
            comment: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<KeywordValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_comment<S: Into<String>>(mut self, comment: S) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn logical<S: Into<String>>(name: S, value: bool) -> Self {
        Self::new(name.into()).with_value(value)
    }

    pub fn integer<S: Into<String>>(name: S, value: i64) -> Self {
        Self::new(name.into()).with_value(value)
    }

    pub fn real<S: Into<String>>(name: S, value: f64) -> Self {
        Self::new(name.into()).with_value(value)
    }

    pub fn string<S: Into<String>, V: Into<String>>(name: S, value: V) -> Self {
        Self::new(name.into()).with_value(KeywordValue::String(value.into()))
    }

    /// Create a COMMENT keyword (no value, just text in comment position).
    pub fn comment<S: Into<String>>(text: S) -> Self {
        Self {
            name: "COMMENT".to_string(),
            value: None,
            comment: Some(text.into()),
        }
    }

    /// Keywords whose values the writer derives from the table layout.
    ///
    /// Caller-supplied copies of these are dropped rather than duplicated.
    pub fn is_structural(&self) -> bool {
        matches!(
            self.name.as_str(),
            "SIMPLE"
                | "XTENSION"
                | "BITPIX"
                | "NAXIS"
                | "EXTEND"
                | "PCOUNT"
                | "GCOUNT"
                | "TFIELDS"
                | "EXTNAME"
                | "END"
        ) || has_numbered_suffix(&self.name, "NAXIS")
            || has_numbered_suffix(&self.name, "TTYPE")
            || has_numbered_suffix(&self.name, "TFORM")
    }
}

fn has_numbered_suffix(name: &str, prefix: &str) -> bool {
    name.len() > prefix.len()
        && name.starts_with(prefix)
        && name[prefix.len()..].chars().all(|c| c.is_ascii_digit())
}

impl KeywordValue {
    pub fn as_logical(&self) -> Option<bool> {
        match self {
            Self::Logical(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for KeywordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Logical(b) => write!(f, "{}", if *b { "T" } else { "F" }),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Real(r) => write!(f, "{}", r),
            Self::String(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<bool> for KeywordValue {
    fn from(value: bool) -> Self {
        Self::Logical(value)
    }
}

impl From<i64> for KeywordValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for KeywordValue {
    fn from(value: i32) -> Self {
        Self::Integer(value as i64)
    }
}

impl From<f64> for KeywordValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<String> for KeywordValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for KeywordValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}
