//! Parsed street address.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a raw address could not be turned into a [`ParsedAddress`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("empty address")]
    Empty,
    #[error("no house number in address: {0:?}")]
    MissingNumber(String),
    #[error("invalid house number: {0:?}")]
    InvalidNumber(String),
    #[error("no street name in address: {0:?}")]
    MissingStreet(String),
}

/// Side of the street a house number falls on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub fn of(number: u32) -> Self {
        if number % 2 == 0 {
            Parity::Even
        } else {
            Parity::Odd
        }
    }
}

/// A normalized (house number, street name, street type) triple.
///
/// `name` and `street_type` are lowercase; `street_type` is empty when the
/// address carried no recognized street suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedAddress {
    pub number: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub street_type: String,
}

impl ParsedAddress {
    pub fn new(number: u32, name: impl Into<String>, street_type: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
            street_type: street_type.into(),
        }
    }

    pub fn parity(&self) -> Parity {
        Parity::of(self.number)
    }
}

impl std::fmt::Display for ParsedAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.street_type.is_empty() {
            write!(f, "{} {}", self.number, self.name)
        } else {
            write!(f, "{} {} {}", self.number, self.name, self.street_type)
        }
    }
}
