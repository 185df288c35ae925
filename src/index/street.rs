//! In-memory street range index.

use hashbrown::HashMap;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

use super::SourceRow;
use crate::models::{Assignment, HouseNumberRange, ParsedAddress};

/// How a parsed address was matched to indexed ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    /// Street name and type both matched
    Exact,
    /// Street name matched; ranges of every type under it were used
    NameOnly,
    /// A leading run of the street name's words matched an indexed street
    Prefix,
}

/// Candidate ranges for an address before the house number is applied
#[derive(Debug)]
pub struct Candidates<'a> {
    pub tier: MatchTier,
    /// The indexed street name the ranges were taken from
    pub street: &'a str,
    pub ranges: Vec<&'a HouseNumberRange>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct IndexStats {
    pub streets: usize,
    pub street_types: usize,
    pub ranges: usize,
}

/// Street name -> street type -> house number ranges, in source order.
///
/// Built once and read-only afterwards, so a single instance can be shared
/// across threads behind an `Arc` without locking.
#[derive(Debug, Clone)]
pub struct StreetIndex {
    streets: HashMap<String, HashMap<String, Vec<HouseNumberRange>>>,
    ranges: usize,
    prefix_fallback: bool,
}

impl StreetIndex {
    /// Build the index from source rows. Every row becomes one range; rows for
    /// the same (name, type) keep their source order.
    pub fn build<I: IntoIterator<Item = SourceRow>>(rows: I) -> Self {
        let mut streets: HashMap<String, HashMap<String, Vec<HouseNumberRange>>> =
            HashMap::new();
        let mut ranges = 0;

        for row in rows {
            streets
                .entry(row.street_name)
                .or_default()
                .entry(row.street_type)
                .or_default()
                .push(HouseNumberRange {
                    side: row.side_code,
                    low: row.house_num_lo,
                    high: row.house_num_hi,
                    district: row.district,
                    neighborhood: row.neighborhood,
                });
            ranges += 1;
        }

        let index = Self {
            streets,
            ranges,
            prefix_fallback: true,
        };
        let stats = index.stats();
        info!(
            "Street index built with {} ranges over {} streets ({} street/type pairs)",
            stats.ranges, stats.streets, stats.street_types
        );
        index
    }

    /// Enable or disable the prefix tier ("main suite" -> "main").
    pub fn with_prefix_fallback(mut self, enabled: bool) -> Self {
        self.prefix_fallback = enabled;
        self
    }

    pub fn prefix_fallback(&self) -> bool {
        self.prefix_fallback
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            streets: self.streets.len(),
            street_types: self.streets.values().map(HashMap::len).sum(),
            ranges: self.ranges,
        }
    }

    pub fn len(&self) -> usize {
        self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges == 0
    }

    pub fn contains_street(&self, name: &str) -> bool {
        self.streets.contains_key(name)
    }

    /// Ranges registered for an exact (name, type) pair
    pub fn ranges(&self, name: &str, street_type: &str) -> &[HouseNumberRange] {
        self.streets
            .get(name)
            .and_then(|types| types.get(street_type))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Find the ranges worth testing for an address, trying in order:
    /// exact name and type, then every type under the name, then (when
    /// enabled) the longest leading run of words that names an indexed street.
    pub fn candidates(&self, name: &str, street_type: &str) -> Option<Candidates<'_>> {
        if let Some(found) = self.candidates_for_street(name, street_type) {
            return Some(found);
        }
        if !self.prefix_fallback {
            return None;
        }

        let words: Vec<&str> = name.split(' ').collect();
        (1..words.len()).rev().find_map(|len| {
            let prefix = words[..len].join(" ");
            self.candidates_for_street(&prefix, street_type)
                .map(|found| Candidates {
                    tier: MatchTier::Prefix,
                    ..found
                })
        })
    }

    fn candidates_for_street(&self, name: &str, street_type: &str) -> Option<Candidates<'_>> {
        let (street, types) = self.streets.get_key_value(name)?;

        if let Some(ranges) = types.get(street_type).filter(|r| !r.is_empty()) {
            return Some(Candidates {
                tier: MatchTier::Exact,
                street,
                ranges: ranges.iter().collect(),
            });
        }

        Some(Candidates {
            tier: MatchTier::NameOnly,
            street,
            ranges: types.values().flatten().collect(),
        })
    }

    /// All (district, neighborhood) pairs whose ranges contain the address.
    pub fn find(&self, address: &ParsedAddress) -> BTreeSet<Assignment> {
        let Some(candidates) = self.candidates(&address.name, &address.street_type) else {
            debug!("No indexed street for {:?}", address.name);
            return BTreeSet::new();
        };

        let hits: Vec<&HouseNumberRange> = candidates
            .ranges
            .iter()
            .copied()
            .filter(|r| r.matches(address.number))
            .collect();

        debug!(
            "{} matched street {:?} via {:?}: {} of {} ranges",
            address,
            candidates.street,
            candidates.tier,
            hits.len(),
            candidates.ranges.len()
        );

        hits.into_iter().map(HouseNumberRange::assignment).collect()
    }
}
