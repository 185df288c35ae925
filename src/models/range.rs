//! House number ranges and the district/neighborhood they map to.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized side code: {0:?}")]
pub struct UnknownSideCode(pub String);

/// Which side of the street a range covers.
///
/// The elections extract encodes these as single letters: E for even, O for
/// odd, A for all (no number range provided) and B for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SideCode {
    Even,
    Odd,
    All,
    Both,
}

impl SideCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SideCode::Even => "E",
            SideCode::Odd => "O",
            SideCode::All => "A",
            SideCode::Both => "B",
        }
    }
}

impl std::str::FromStr for SideCode {
    type Err = UnknownSideCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "E" | "EVEN" => Ok(SideCode::Even),
            "O" | "ODD" => Ok(SideCode::Odd),
            "A" | "ALL" => Ok(SideCode::All),
            "B" | "BOTH" => Ok(SideCode::Both),
            other => Err(UnknownSideCode(other.to_string())),
        }
    }
}

impl TryFrom<String> for SideCode {
    type Error = UnknownSideCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SideCode> for String {
    fn from(code: SideCode) -> Self {
        code.as_str().to_string()
    }
}

impl std::fmt::Display for SideCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (district, neighborhood) label pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Assignment {
    pub district: String,
    pub neighborhood: String,
}

/// One row of the lookup table: a house number range on one street.
///
/// Bounds are inclusive. A number matches when it is on the right side of the
/// street and, unless the side code is [`SideCode::All`], within the bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseNumberRange {
    pub side: SideCode,
    pub low: u32,
    pub high: u32,
    pub district: String,
    pub neighborhood: String,
}

impl HouseNumberRange {
    pub fn matches(&self, number: u32) -> bool {
        let even = number % 2 == 0;
        match self.side {
            SideCode::All => true,
            SideCode::Even if !even => false,
            SideCode::Odd if even => false,
            _ => self.low <= number && number <= self.high,
        }
    }

    pub fn assignment(&self) -> Assignment {
        Assignment {
            district: self.district.clone(),
            neighborhood: self.neighborhood.clone(),
        }
    }
}
