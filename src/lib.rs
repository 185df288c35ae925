//! sfhood - San Francisco district and neighborhood lookup by street address
//!
//! This library provides the address parser, the street range index and the
//! lookup service shared by the query, lookup and join binaries.

pub mod config;
pub mod index;
pub mod models;
pub mod parser;
pub mod service;

pub use index::StreetIndex;
pub use models::{Assignment, HouseNumberRange, ParsedAddress, SideCode};
pub use service::{FindResponse, Lookup, NeighborhoodService};
