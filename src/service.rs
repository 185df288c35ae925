//! Parse-then-lookup service shared by the HTTP and command-line front ends.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::config::Config;
use crate::index::{load_index, StreetIndex};
use crate::models::{AddressParseError, Assignment, ParsedAddress};
use crate::parser::{AddressParser, StreetTypes};

/// Outcome of a single lookup.
///
/// Front ends flatten this into a [`FindResponse`], where a parse failure and
/// a miss look the same; the distinction is kept here for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    ParseFailure(AddressParseError),
    NoMatch(ParsedAddress),
    Matches {
        address: ParsedAddress,
        assignments: BTreeSet<Assignment>,
    },
}

impl Lookup {
    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        let set = match self {
            Lookup::Matches { assignments, .. } => Some(assignments),
            _ => None,
        };
        set.into_iter().flatten()
    }

    pub fn is_match(&self) -> bool {
        matches!(self, Lookup::Matches { .. })
    }
}

/// Wire shape of a lookup: unique districts and neighborhoods, each sorted on
/// its own. The i-th district is not necessarily paired with the i-th
/// neighborhood.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindResponse {
    pub district: Vec<String>,
    pub neighborhood: Vec<String>,
}

impl From<&Lookup> for FindResponse {
    fn from(lookup: &Lookup) -> Self {
        let mut district: Vec<String> = lookup
            .assignments()
            .map(|a| a.district.clone())
            .collect();
        let mut neighborhood: Vec<String> = lookup
            .assignments()
            .map(|a| a.neighborhood.clone())
            .collect();

        district.sort_by(|a, b| natural_cmp(a, b));
        district.dedup();
        neighborhood.sort();
        neighborhood.dedup();

        Self {
            district,
            neighborhood,
        }
    }
}

/// Numeric labels compare by value ("2" < "10") and sort before other text.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Address parser plus street index
pub struct NeighborhoodService {
    parser: AddressParser,
    index: StreetIndex,
}

impl NeighborhoodService {
    pub fn new(parser: AddressParser, index: StreetIndex) -> Self {
        Self { parser, index }
    }

    /// Load the index and street types named by the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut street_types = StreetTypes::builtin();
        if let Some(dir) = &config.data.synonyms_dir {
            street_types.load_from_dir(dir)?;
        }

        let index =
            load_index(&config.data.file)?.with_prefix_fallback(config.matching.prefix_fallback);
        info!(
            "Neighborhood service ready ({} ranges, prefix fallback {})",
            index.len(),
            if index.prefix_fallback() { "on" } else { "off" }
        );

        Ok(Self::new(AddressParser::new(street_types), index))
    }

    pub fn index(&self) -> &StreetIndex {
        &self.index
    }

    pub fn lookup(&self, raw: &str) -> Lookup {
        let address = match self.parser.parse(raw) {
            Ok(address) => address,
            Err(e) => {
                debug!("Unparseable address {:?}: {}", raw, e);
                return Lookup::ParseFailure(e);
            }
        };

        let assignments = self.index.find(&address);
        if assignments.is_empty() {
            debug!("No match for {:?} ({})", raw, address);
            Lookup::NoMatch(address)
        } else {
            debug!(
                "{} assignments for {:?} ({})",
                assignments.len(),
                raw,
                address
            );
            Lookup::Matches {
                address,
                assignments,
            }
        }
    }

    pub fn find(&self, raw: &str) -> FindResponse {
        FindResponse::from(&self.lookup(raw))
    }

    /// Matching (district, neighborhood) pairs, sorted by district then
    /// neighborhood.
    pub fn find_pairs(&self, raw: &str) -> Vec<Assignment> {
        let mut pairs: Vec<Assignment> = self.lookup(raw).assignments().cloned().collect();
        pairs.sort_by(|a, b| {
            natural_cmp(&a.district, &b.district).then_with(|| a.neighborhood.cmp(&b.neighborhood))
        });
        pairs
    }

    /// Comma-joined districts, empty when nothing matches
    pub fn find_district(&self, raw: &str) -> String {
        self.find(raw).district.join(",")
    }

    /// Comma-joined neighborhoods, empty when nothing matches
    pub fn find_neighborhood(&self, raw: &str) -> String {
        self.find(raw).neighborhood.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{read_rows, SourceRow};
    use crate::models::SideCode;
    use rayon::prelude::*;
    use std::sync::Arc;

    const SAMPLE: &str = include_str!("../data/sample_neighborhood_data.tsv");

    fn sample_rows() -> Vec<SourceRow> {
        read_rows(SAMPLE.as_bytes()).unwrap()
    }

    fn service() -> NeighborhoodService {
        NeighborhoodService::new(AddressParser::default(), StreetIndex::build(sample_rows()))
    }

    fn assert_find_results(
        service: &NeighborhoodService,
        raw: &str,
        districts: &str,
        neighborhoods: &str,
    ) {
        let split = |s: &str| -> Vec<String> {
            if s.is_empty() {
                vec![]
            } else {
                s.split(',').map(String::from).collect()
            }
        };
        assert_eq!(
            service.find(raw),
            FindResponse {
                district: split(districts),
                neighborhood: split(neighborhoods),
            },
            "finding {:?}",
            raw
        );
        assert_eq!(service.find_district(raw), districts);
        assert_eq!(service.find_neighborhood(raw), neighborhoods);
    }

    #[test]
    fn test_street_match() {
        assert_find_results(&service(), "123 Main St", "6", "Financial District/South Beach");
    }

    #[test]
    fn test_padded_street_match() {
        assert_find_results(&service(), "   123 Main St   ", "6", "Financial District/South Beach");
    }

    #[test]
    fn test_full_address() {
        let service = service();
        assert_find_results(
            &service,
            "123 Main St, San Francisco, CA 94105",
            "6",
            "Financial District/South Beach",
        );
        assert_eq!(
            service.find("123 Main St, San Francisco, CA 94105"),
            service.find("123 Main St")
        );
    }

    #[test]
    fn test_street_type_missing() {
        assert_find_results(&service(), "123 Main", "6", "Financial District/South Beach");
    }

    #[test]
    fn test_junk_suffix() {
        assert_find_results(&service(), "123 Main Suite 100", "6", "Financial District/South Beach");
        assert_find_results(&service(), "123 Main Street Unit 7, SF", "6", "Financial District/South Beach");
    }

    #[test]
    fn test_unparseable_address() {
        let service = service();
        assert_find_results(&service, "1 10th", "", "");
        assert_find_results(&service, "1 10th Apt 3", "", "");
        assert_find_results(&service, "b123 Main St", "", "");
    }

    #[test]
    fn test_ambiguous_address() {
        assert_find_results(
            &service(),
            "10 10th Apt 3",
            "2,6",
            "Inner Richmond,South of Market",
        );
    }

    #[test]
    fn test_no_match() {
        assert_find_results(&service(), "1 asdf123 st", "", "");
    }

    #[test]
    fn test_empty_input() {
        assert_find_results(&service(), " ", "", "");
        assert_find_results(&service(), "", "", "");
    }

    #[test]
    fn test_tagged_outcomes() {
        let service = service();
        assert_eq!(
            service.lookup(""),
            Lookup::ParseFailure(AddressParseError::Empty)
        );
        assert!(matches!(
            service.lookup("b123 Main St"),
            Lookup::ParseFailure(AddressParseError::InvalidNumber(_))
        ));
        assert_eq!(
            service.lookup("1 asdf123 st"),
            Lookup::NoMatch(ParsedAddress::new(1, "asdf123", "st"))
        );
        assert!(service.lookup("123 Main St").is_match());
    }

    #[test]
    fn test_districts_sort_numerically() {
        // Overlaps the even 1500-1998 block of market st in district 6
        let mut rows = sample_rows();
        rows.push(SourceRow {
            street_name: "market".into(),
            street_type: "st".into(),
            side_code: SideCode::Both,
            house_num_lo: 1500,
            house_num_hi: 1700,
            district: "10".into(),
            neighborhood: "Hayes Valley".into(),
        });
        let service = NeighborhoodService::new(AddressParser::default(), StreetIndex::build(rows));
        let response = service.find("1600 Market St");
        assert_eq!(response.district, vec!["6", "10"]);
        assert_eq!(response.neighborhood, vec!["Hayes Valley", "South of Market"]);
    }

    #[test]
    fn test_find_pairs_keeps_pairing() {
        let pairs = service().find_pairs("10 10th Apt 3");
        assert_eq!(
            pairs,
            vec![
                Assignment {
                    district: "2".into(),
                    neighborhood: "Inner Richmond".into()
                },
                Assignment {
                    district: "6".into(),
                    neighborhood: "South of Market".into()
                },
            ]
        );
        assert!(service().find_pairs("").is_empty());
    }

    #[test]
    fn test_prefix_fallback_toggle() {
        let index = StreetIndex::build(sample_rows()).with_prefix_fallback(false);
        let service = NeighborhoodService::new(AddressParser::default(), index);
        // The parser already drops "suite 100", so this still resolves
        assert_find_results(&service, "123 Main Suite 100", "6", "Financial District/South Beach");
        // A noisy trailing word does not
        assert_find_results(&service, "123 Main Rear", "", "");
        assert_find_results(&self::service(), "123 Main Rear", "6", "Financial District/South Beach");
    }

    #[test]
    fn test_every_row_is_reachable() {
        let service = service();
        for row in sample_rows() {
            let number = match row.side_code {
                SideCode::All => 7,
                SideCode::Both => row.house_num_lo,
                SideCode::Even if row.house_num_lo % 2 == 0 => row.house_num_lo,
                SideCode::Odd if row.house_num_lo % 2 == 1 => row.house_num_lo,
                _ => row.house_num_lo + 1,
            };
            let address = format!("{} {} {}", number, row.street_name, row.street_type);
            let expected = Assignment {
                district: row.district.clone(),
                neighborhood: row.neighborhood.clone(),
            };
            let lookup = service.lookup(&address);
            assert!(
                lookup.assignments().any(|a| *a == expected),
                "{:?} did not yield {:?}: {:?}",
                address,
                expected,
                lookup
            );
        }
    }

    #[test]
    fn test_concurrent_lookups_are_idempotent() {
        let service = Arc::new(service());
        let addresses = [
            "123 Main St",
            "10 10th Apt 3",
            "",
            "1 asdf123 st",
            "1600 Market St",
        ];
        let expected: Vec<FindResponse> = addresses.iter().map(|a| service.find(a)).collect();

        let results: Vec<Vec<FindResponse>> = (0..64)
            .into_par_iter()
            .map(|_| addresses.iter().map(|a| service.find(a)).collect())
            .collect();

        for round in results {
            assert_eq!(round, expected);
        }
    }
}
