//! Address parsing: raw text to a normalized (number, name, type) triple.

mod street;
mod synonyms;

use std::sync::OnceLock;

pub use street::AddressParser;
pub use synonyms::StreetTypes;

use crate::models::{AddressParseError, ParsedAddress};

/// Parse with the built-in street type table.
pub fn parse(raw: &str) -> Result<ParsedAddress, AddressParseError> {
    static DEFAULT: OnceLock<AddressParser> = OnceLock::new();
    DEFAULT.get_or_init(AddressParser::default).parse(raw)
}
