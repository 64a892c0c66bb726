//! FITS header model: 80-character cards grouped in 2880-byte blocks.

mod card;
mod keywords;

pub use card::{Header, HeaderCard, HeaderParser};
pub use keywords::{Keyword, KeywordValue};

pub(crate) use card::{pad_to_block, BLOCK_SIZE};
