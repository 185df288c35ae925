//! Heuristic street address tokenizer.

use tracing::trace;

use super::StreetTypes;
use crate::models::{AddressParseError, ParsedAddress};

/// Words that introduce a unit, suite or floor. Everything from one of these
/// onward is dropped.
const UNIT_DESIGNATORS: &[&str] = &[
    "apt",
    "apartment",
    "suite",
    "ste",
    "unit",
    "fl",
    "floor",
    "rm",
    "room",
    "bldg",
    "building",
    "dept",
    "spc",
    "space",
];

const STATES: &[&str] = &["ca", "calif", "california"];

/// Splits a raw address into (house number, street name, street type).
#[derive(Debug, Clone, Default)]
pub struct AddressParser {
    street_types: StreetTypes,
}

impl AddressParser {
    pub fn new(street_types: StreetTypes) -> Self {
        Self { street_types }
    }

    pub fn street_types(&self) -> &StreetTypes {
        &self.street_types
    }

    pub fn parse(&self, raw: &str) -> Result<ParsedAddress, AddressParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AddressParseError::Empty);
        }

        // City, state and ZIP follow the first comma
        let street_line = trimmed.split(',').next().unwrap_or_default();
        let mut tokens = street_line.split_whitespace().map(|t| t.to_lowercase());

        let number_token = tokens.next().ok_or(AddressParseError::Empty)?;
        let number = parse_house_number(&number_token)?;

        let mut words: Vec<String> = Vec::new();
        for token in tokens {
            let clean = token
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_string();
            if !words.is_empty()
                && (token.starts_with('#') || UNIT_DESIGNATORS.contains(&clean.as_str()))
            {
                break;
            }
            if !clean.is_empty() {
                words.push(clean);
            }
        }

        strip_locality(&mut words);

        // A lone unit letter, e.g. "123 Main St b"
        if words.len() > 1 && words.last().is_some_and(|w| w.chars().count() == 1) {
            words.pop();
        }
        // A bare unit number, e.g. "123 Main St 101"
        if words.len() > 1
            && words
                .last()
                .is_some_and(|w| w.chars().any(|c| c.is_ascii_digit()))
        {
            words.pop();
        }

        let mut street_type = String::new();
        if words.len() > 1 {
            if let Some(canon) = words
                .last()
                .and_then(|w| self.street_types.canonical(w))
            {
                street_type = canon.to_string();
                words.pop();
            }
        }

        if words.is_empty() {
            return Err(AddressParseError::MissingStreet(trimmed.to_string()));
        }

        let name = words.join(" ");
        trace!(
            "Parsed {:?} as number={} name={:?} type={:?}",
            raw,
            number,
            name,
            street_type
        );

        Ok(ParsedAddress::new(number, name, street_type))
    }
}

/// Parse the leading house-number token. A single trailing letter ("123b") is
/// a unit suffix and ignored; a hyphenated span ("123-125") keeps its start.
fn parse_house_number(token: &str) -> Result<u32, AddressParseError> {
    let token = token.trim_matches(|c: char| !c.is_alphanumeric() && c != '-');
    if !token.chars().any(|c| c.is_ascii_digit()) {
        return Err(AddressParseError::MissingNumber(token.to_string()));
    }

    let mut digits = token.split('-').next().unwrap_or_default();
    let mut chars = digits.chars().rev();
    if let (Some(last), Some(prev)) = (chars.next(), chars.next()) {
        if last.is_ascii_alphabetic() && prev.is_ascii_digit() {
            digits = &digits[..digits.len() - 1];
        }
    }

    digits
        .parse::<u32>()
        .map_err(|_| AddressParseError::InvalidNumber(token.to_string()))
}

/// Drop a trailing "San Francisco CA 94105" written without commas.
fn strip_locality(words: &mut Vec<String>) {
    let is_zip = |s: &str| {
        let (five, plus4) = s.split_once('-').unwrap_or((s, "0000"));
        five.len() == 5
            && plus4.len() == 4
            && five.chars().all(|c| c.is_ascii_digit())
            && plus4.chars().all(|c| c.is_ascii_digit())
    };

    if words.len() > 1 && words.last().is_some_and(|w| is_zip(w)) {
        words.pop();
    }
    if words.len() > 1 && words.last().is_some_and(|w| STATES.contains(&w.as_str())) {
        words.pop();
    }
    let n = words.len();
    if n > 2 && words[n - 2] == "san" && words[n - 1] == "francisco" {
        words.truncate(n - 2);
    } else if n > 1 && words[n - 1] == "sf" {
        words.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<ParsedAddress, AddressParseError> {
        AddressParser::default().parse(raw)
    }

    fn assert_parses_to(raw: &str, number: u32, name: &str, street_type: &str) {
        assert_eq!(
            parse(raw),
            Ok(ParsedAddress::new(number, name, street_type)),
            "parsing {:?}",
            raw
        );
    }

    #[test]
    fn test_basic_parse() {
        assert_parses_to("123 Main St", 123, "main", "st");
    }

    #[test]
    fn test_street_type_normalization() {
        assert_parses_to("123 Main Street", 123, "main", "st");
        assert_parses_to("123 MAIN ST.", 123, "main", "st");
        assert_parses_to("500 Sunset Boulevard", 500, "sunset", "blvd");
    }

    #[test]
    fn test_apt_number_parse() {
        assert_parses_to("123 Main St #101", 123, "main", "st");
        assert_parses_to("123 Main St # 101", 123, "main", "st");
        assert_parses_to("123 Main St 101", 123, "main", "st");
    }

    #[test]
    fn test_apt_number_parse_with_suite() {
        assert_parses_to("123 Main St Suite 101", 123, "main", "st");
        assert_parses_to("123 Main St Apt 4B", 123, "main", "st");
        assert_parses_to("123 Main St Fl 2", 123, "main", "st");
    }

    #[test]
    fn test_street_type_missing() {
        assert_parses_to("123 Main", 123, "main", "");
        assert_parses_to("123 Main Suite 100", 123, "main", "");
        assert_parses_to("10 10th Apt 3", 10, "10th", "");
        assert_parses_to("1 10th", 1, "10th", "");
    }

    #[test]
    fn test_number_with_letter_suffix() {
        assert_parses_to("123b Main St", 123, "main", "st");
        assert_parses_to("123B Main St", 123, "main", "st");
        assert_parses_to("123 Main St b", 123, "main", "st");
    }

    #[test]
    fn test_hyphenated_number() {
        assert_parses_to("123-125 Main St", 123, "main", "st");
    }

    #[test]
    fn test_multi_word_name() {
        assert_parses_to("1 Van Ness Ave", 1, "van ness", "ave");
        assert_parses_to("2 De Haro St", 2, "de haro", "st");
    }

    #[test]
    fn test_lone_street_type_is_the_name() {
        assert_parses_to("100 Park", 100, "park", "");
    }

    #[test]
    fn test_trailing_locality() {
        assert_parses_to("123 Main St, San Francisco, CA 94105", 123, "main", "st");
        assert_parses_to("123 Main St San Francisco CA 94105", 123, "main", "st");
        assert_parses_to("123 Main St San Francisco CA 94105-1234", 123, "main", "st");
        assert_parses_to("123 Main St SF", 123, "main", "st");
        assert_parses_to("123 Main St, Apt 4", 123, "main", "st");
    }

    #[test]
    fn test_padded_input() {
        assert_parses_to("   123   Main St   ", 123, "main", "st");
    }

    #[test]
    fn test_number_value_error() {
        assert!(matches!(
            parse("b123 Main St"),
            Err(AddressParseError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse("12x3 Main St"),
            Err(AddressParseError::InvalidNumber(_))
        ));
        assert!(matches!(
            parse("Main St"),
            Err(AddressParseError::MissingNumber(_))
        ));
    }

    #[test]
    fn test_empty_error() {
        assert_eq!(parse(""), Err(AddressParseError::Empty));
        assert_eq!(parse("   "), Err(AddressParseError::Empty));
        assert_eq!(parse(", San Francisco"), Err(AddressParseError::Empty));
    }

    #[test]
    fn test_number_without_street() {
        assert!(matches!(
            parse("123"),
            Err(AddressParseError::MissingStreet(_))
        ));
    }
}
