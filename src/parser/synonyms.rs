use anyhow::{Context, Result};
use hashbrown::HashMap;
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use walkdir::WalkDir;

/// Canonical street type followed by the spellings that normalize to it.
const BUILTIN: &[(&str, &[&str])] = &[
    ("st", &["st", "street", "str", "strt"]),
    ("ave", &["ave", "avenue", "av", "aven", "avenu", "avn", "avnue"]),
    ("blvd", &["blvd", "boulevard", "boul", "boulv"]),
    ("dr", &["dr", "drive", "drv", "driv"]),
    ("ter", &["ter", "terrace", "terr"]),
    ("way", &["way", "wy"]),
    ("park", &["park", "prk"]),
    ("pl", &["pl", "place"]),
    ("ct", &["ct", "court", "crt"]),
    ("ln", &["ln", "lane"]),
    ("rd", &["rd", "road"]),
    ("aly", &["aly", "alley", "ally", "allee"]),
    ("hwy", &["hwy", "highway", "hiway", "hiwy"]),
    ("cir", &["cir", "circle", "circ", "crcl"]),
    ("plz", &["plz", "plaza", "plza"]),
    ("sq", &["sq", "square", "sqr"]),
    ("row", &["row"]),
    ("walk", &["walk", "wlk"]),
    ("stwy", &["stwy", "stairway", "stairs"]),
    ("path", &["path"]),
    ("loop", &["loop"]),
    ("hl", &["hl", "hill"]),
    ("trl", &["trl", "trail"]),
    ("xing", &["xing", "crossing"]),
    ("expy", &["expy", "expressway", "expw"]),
    ("fwy", &["fwy", "freeway"]),
];

/// Maps street-type spellings ("Street", "AVENUE", "blvd.") to the canonical
/// lowercase abbreviation used in the lookup table.
#[derive(Debug, Clone)]
pub struct StreetTypes {
    /// Spelling -> canonical abbreviation
    replacements: HashMap<String, String>,
}

impl Default for StreetTypes {
    fn default() -> Self {
        Self::builtin()
    }
}

impl StreetTypes {
    /// An empty table that recognizes nothing.
    pub fn empty() -> Self {
        Self {
            replacements: HashMap::new(),
        }
    }

    /// The USPS-derived table covering the street types found in San Francisco.
    pub fn builtin() -> Self {
        let mut types = Self::empty();
        for (canon, variants) in BUILTIN {
            for variant in *variants {
                types.insert(variant, canon);
            }
        }
        types
    }

    pub fn insert(&mut self, spelling: &str, canon: &str) {
        self.replacements
            .insert(spelling.trim().to_lowercase(), canon.trim().to_lowercase());
    }

    /// Canonical abbreviation for a token, if it is a street type.
    pub fn canonical(&self, token: &str) -> Option<&str> {
        let clean = token
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        self.replacements.get(&clean).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    /// Load extra mappings from `*.txt` files under a directory, recursively.
    pub fn load_from_dir<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            warn!("Street type directory not found: {}", dir.display());
            return Ok(());
        }

        info!("Loading street types from {}", dir.display());
        let before = self.len();

        for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();

            if !path.is_file() || path.extension().map_or(true, |e| e != "txt") {
                continue;
            }

            self.load_file(path)?;
        }

        info!("Loaded {} street type mappings", self.len() - before);
        Ok(())
    }

    fn load_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read street type file: {}", path.display()))?;
        self.load_rules(&content)
    }

    /// Parse rules, one per line:
    ///
    /// ```text
    /// # comment
    /// avenue, av => ave
    /// st, street, str
    /// ```
    ///
    /// An arrow maps every left spelling to the first right entry; a plain list
    /// maps every entry to the first.
    pub fn load_rules(&mut self, content: &str) -> Result<()> {
        let comment_regex = Regex::new(r"#.*")?;
        let whitespace_regex = Regex::new(r"\s+")?;

        for line in content.lines() {
            let line = comment_regex.replace(line, "");
            let line = line.trim().to_lowercase();
            if line.is_empty() {
                continue;
            }
            let line = whitespace_regex.replace_all(&line, " ");

            let (lefts, canon) = match line.split_once("=>") {
                Some((left, right)) => {
                    let canon = right.split(',').next().unwrap_or("").trim();
                    (left.split(',').collect::<Vec<_>>(), canon)
                }
                None => {
                    let parts: Vec<&str> = line.split(',').collect();
                    let canon = parts.first().copied().unwrap_or("").trim();
                    (parts, canon)
                }
            };

            if canon.is_empty() {
                warn!("Ignoring street type rule without a target: {}", line);
                continue;
            }

            // The canonical form always maps to itself
            self.insert(canon, canon);
            for src in lefts {
                let src = src.trim();
                if !src.is_empty() {
                    self.insert(src, canon);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_spellings() {
        let types = StreetTypes::builtin();
        assert_eq!(types.canonical("Street"), Some("st"));
        assert_eq!(types.canonical("ST"), Some("st"));
        assert_eq!(types.canonical("St."), Some("st"));
        assert_eq!(types.canonical("avenue"), Some("ave"));
        assert_eq!(types.canonical("Drive"), Some("dr"));
        assert_eq!(types.canonical("boulevard"), Some("blvd"));
        assert_eq!(types.canonical("terrace"), Some("ter"));
        assert_eq!(types.canonical("way"), Some("way"));
        assert_eq!(types.canonical("park"), Some("park"));
        assert_eq!(types.canonical("main"), None);
        assert_eq!(types.canonical("suite"), None);
    }

    #[test]
    fn test_load_rules() {
        let mut types = StreetTypes::empty();
        types
            .load_rules("# comment\ngardens, gdns => gdn\n  mall,  mal \n\n")
            .unwrap();
        assert_eq!(types.canonical("gardens"), Some("gdn"));
        assert_eq!(types.canonical("gdns"), Some("gdn"));
        assert_eq!(types.canonical("gdn"), Some("gdn"));
        assert_eq!(types.canonical("mal"), Some("mall"));
        assert_eq!(types.canonical("mall"), Some("mall"));
        assert_eq!(types.len(), 5);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("extra.txt"), "gardens => gdn\n").unwrap();
        fs::write(dir.path().join("ignored.md"), "causeway => cswy\n").unwrap();

        let mut types = StreetTypes::builtin();
        types.load_from_dir(dir.path()).unwrap();
        assert_eq!(types.canonical("gardens"), Some("gdn"));
        assert_eq!(types.canonical("causeway"), None);
        assert_eq!(types.canonical("street"), Some("st"));
    }

    #[test]
    fn test_missing_dir_is_not_an_error() {
        let mut types = StreetTypes::empty();
        types.load_from_dir("/nonexistent/street/types").unwrap();
        assert!(types.is_empty());
    }
}
