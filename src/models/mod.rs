//! Core data models for the neighborhood lookup.

pub mod address;
pub mod range;

pub use address::{AddressParseError, ParsedAddress, Parity};
pub use range::{Assignment, HouseNumberRange, SideCode, UnknownSideCode};
