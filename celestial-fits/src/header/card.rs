use super::{Keyword, KeywordValue};
use crate::{FitsError, Result};
use std::collections::HashMap;
use std::str;

pub(crate) const CARD_SIZE: usize = 80;
pub(crate) const BLOCK_SIZE: usize = 2880;

#[derive(Debug, Clone, Default)]
pub struct Header {
    keywords: Vec<Keyword>,
    keyword_index: HashMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct HeaderCard {
    pub keyword: String,
    pub value: Option<String>,
    pub comment: Option<String>,
}

pub struct HeaderParser;

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_keyword(&mut self, keyword: Keyword) {
        let index = self.keywords.len();
        self.keyword_index.insert(keyword.name.clone(), index);
        self.keywords.push(keyword);
    }

    pub fn get_keyword(&self, name: &str) -> Option<&Keyword> {
        self.keyword_index
            .get(name)
            .and_then(|&index| self.keywords.get(index))
    }

    pub fn get_keyword_value(&self, name: &str) -> Option<&KeywordValue> {
        self.get_keyword(name)?.value.as_ref()
    }

    pub fn keywords(&self) -> &[Keyword] {
        &self.keywords
    }

    pub fn is_extension(&self) -> bool {
        self.get_keyword("XTENSION").is_some()
    }

    /// Integer value of a mandatory keyword.
    pub fn required_integer(&self, name: &str) -> Result<i64> {
        let value = self
            .get_keyword_value(name)
            .ok_or_else(|| FitsError::keyword_not_found(name))?;
        value.as_integer().ok_or_else(|| FitsError::InvalidKeywordValue {
            keyword: name.to_string(),
            value: value.to_string(),
        })
    }

    /// Real value of a mandatory keyword (integers are accepted).
    pub fn required_real(&self, name: &str) -> Result<f64> {
        let value = self
            .get_keyword_value(name)
            .ok_or_else(|| FitsError::keyword_not_found(name))?;
        value.as_real().ok_or_else(|| FitsError::InvalidKeywordValue {
            keyword: name.to_string(),
            value: value.to_string(),
        })
    }

    pub fn optional_string(&self, name: &str) -> Option<&str> {
        self.get_keyword_value(name)?.as_string()
    }

    /// Serialises the cards followed by `END`, padded to whole 2880-byte blocks.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(BLOCK_SIZE);
        for keyword in &self.keywords {
            for card in format_cards(keyword) {
                bytes.extend_from_slice(&card);
            }
        }
        bytes.extend_from_slice(&end_card());
        pad_to_block(&mut bytes, b' ');
        bytes
    }
}

impl HeaderCard {
    pub fn parse(data: &[u8; CARD_SIZE]) -> Result<Self> {
        let card_str = str::from_utf8(data)
            .map_err(|_| FitsError::InvalidFormat("Invalid UTF-8 in header card".to_string()))?;

        let mut card = HeaderCard {
            keyword: card_str[0..8].trim().to_string(),
            value: None,
            comment: None,
        };

        if &card_str[8..10] == "= " {
            let (value, comment) = split_value_comment(&card_str[10..]);
            card.value = value;
            card.comment = comment;
        } else {
            let comment_part = card_str[8..].trim();
            if !comment_part.is_empty() {
                card.comment = Some(comment_part.to_string());
            }
        }

        Ok(card)
    }

    pub fn to_keyword(&self) -> Result<Keyword> {
        let mut keyword = Keyword::new(self.keyword.clone());

        if let Some(comment) = &self.comment {
            keyword = keyword.with_comment(comment.clone());
        }

        if let Some(value_str) = &self.value {
            keyword = keyword.with_value(Self::parse_value(value_str));
        }

        Ok(keyword)
    }

    fn parse_value(value_str: &str) -> KeywordValue {
        let trimmed = value_str.trim();

        if trimmed == "T" {
            return KeywordValue::Logical(true);
        }
        if trimmed == "F" {
            return KeywordValue::Logical(false);
        }

        if trimmed.starts_with('\'') && trimmed.ends_with('\'') && trimmed.len() >= 2 {
            let string_content = &trimmed[1..trimmed.len() - 1];
            return KeywordValue::String(string_content.replace("''", "'").trim_end().to_string());
        }

        if let Ok(int_val) = trimmed.parse::<i64>() {
            return KeywordValue::Integer(int_val);
        }

        if let Ok(float_val) = trimmed.replace('D', "E").parse::<f64>() {
            return KeywordValue::Real(float_val);
        }

        KeywordValue::String(trimmed.to_string())
    }
}

/// Splits the value field at the first `/` that is not inside a quoted string.
fn split_value_comment(field: &str) -> (Option<String>, Option<String>) {
    let mut in_string = false;
    let mut split_at = None;
    for (i, ch) in field.char_indices() {
        match ch {
            '\'' => in_string = !in_string,
            '/' if !in_string => {
                split_at = Some(i);
                break;
            }
            _ => {}
        }
    }

    let (value_part, comment_part) = match split_at {
        Some(i) => (&field[..i], Some(&field[i + 1..])),
        None => (field, None),
    };

    let value = Some(value_part.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    let comment = comment_part
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);
    (value, comment)
}

impl HeaderParser {
    /// Parses a header made of whole 2880-byte blocks and terminated by `END`.
    pub fn parse_header(data: &[u8]) -> Result<Header> {
        if !data.len().is_multiple_of(BLOCK_SIZE) {
            return Err(FitsError::InvalidFormat(
                "Header size must be multiple of 2880 bytes".to_string(),
            ));
        }

        let mut header = Header::new();

        for chunk in data.chunks_exact(CARD_SIZE) {
            let mut card_data = [0u8; CARD_SIZE];
            card_data.copy_from_slice(chunk);

            let card = HeaderCard::parse(&card_data)?;
            if card.keyword == "END" {
                return Ok(header);
            }
            if card.keyword.is_empty() && card.value.is_none() && card.comment.is_none() {
                continue;
            }
            header.add_keyword(card.to_keyword()?);
        }

        Err(FitsError::InvalidFormat("Missing END keyword".to_string()))
    }

    /// `true` if the block contains the `END` card.
    pub fn block_has_end(block: &[u8]) -> bool {
        block
            .chunks_exact(CARD_SIZE)
            .any(|card| &card[0..8] == b"END     ")
    }
}

fn end_card() -> [u8; CARD_SIZE] {
    let mut card = [b' '; CARD_SIZE];
    card[0..3].copy_from_slice(b"END");
    card
}

/// Formats one keyword. Long strings are truncated to what fits on one card.
pub(crate) fn format_cards(keyword: &Keyword) -> Vec<[u8; CARD_SIZE]> {
    let mut card = [b' '; CARD_SIZE];

    let name_bytes = keyword.name.as_bytes();
    let name_len = name_bytes.len().min(8);
    card[0..name_len].copy_from_slice(&name_bytes[0..name_len]);

    // COMMENT / HISTORY style: free text after the keyword name
    let Some(value) = &keyword.value else {
        if let Some(comment) = &keyword.comment {
            let comment_bytes = comment.as_bytes();
            let comment_len = comment_bytes.len().min(72);
            card[8..8 + comment_len].copy_from_slice(&comment_bytes[0..comment_len]);
        }
        return vec![card];
    };

    card[8] = b'=';
    card[9] = b' ';

    let value_str = match value {
        KeywordValue::Logical(b) => format!("{:>20}", if *b { "T" } else { "F" }),
        KeywordValue::Integer(i) => format!("{:>20}", i),
        KeywordValue::Real(f) => format!("{:>20}", format_real(*f)),
        KeywordValue::String(s) => format_string(s),
    };

    let value_bytes = value_str.as_bytes();
    let value_len = value_bytes.len().min(CARD_SIZE - 10);
    card[10..10 + value_len].copy_from_slice(&value_bytes[0..value_len]);

    if let Some(comment) = &keyword.comment {
        let start = 10 + value_len.max(20) + 1;
        if start + 2 < CARD_SIZE {
            card[start] = b'/';
            card[start + 1] = b' ';
            let room = CARD_SIZE - (start + 2);
            let comment_bytes = comment.as_bytes();
            let comment_len = comment_bytes.len().min(room);
            card[start + 2..start + 2 + comment_len].copy_from_slice(&comment_bytes[..comment_len]);
        }
    }

    vec![card]
}

/// Shortest representation that parses back to the same `f64`.
fn format_real(value: f64) -> String {
    format!("{:?}", value).replace('e', "E")
}

/// Quoted FITS string, quotes doubled, at least 8 characters inside the quotes.
fn format_string(value: &str) -> String {
    const MAX_CHARS: usize = 68;
    let mut escaped = String::new();
    for ch in value.chars().filter(|c| c.is_ascii() && !c.is_ascii_control()) {
        let extra = if ch == '\'' { 2 } else { 1 };
        if escaped.len() + extra > MAX_CHARS {
            break;
        }
        if ch == '\'' {
            escaped.push('\'');
        }
        escaped.push(ch);
    }
    format!("'{:<8}'", escaped)
}

pub(crate) fn pad_to_block(bytes: &mut Vec<u8>, fill: u8) {
    let remainder = bytes.len() % BLOCK_SIZE;
    if remainder != 0 {
        bytes.resize(bytes.len() + BLOCK_SIZE - remainder, fill);
    }
}
