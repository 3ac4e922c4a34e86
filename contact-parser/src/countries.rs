use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

lazy_static! {
    static ref BUILTIN_TABLE: CountryTable = CountryTable::builtin();
}

/// The table every free function in this crate uses.
pub fn builtin_table() -> &'static CountryTable {
    &BUILTIN_TABLE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LengthRule {
    Exact(usize),
    Range { min: usize, max: usize },
}

impl LengthRule {
    pub fn accepts(&self, len: usize) -> bool {
        match *self {
            LengthRule::Exact(expected) => len == expected,
            LengthRule::Range { min, max } => (min..=max).contains(&len),
        }
    }

    /// Same rule for a number written `digits` shorter, e.g. with a trunk
    /// code instead of the international prefix.
    pub fn shorter_by(&self, digits: usize) -> LengthRule {
        match *self {
            LengthRule::Exact(expected) => LengthRule::Exact(expected.saturating_sub(digits)),
            LengthRule::Range { min, max } => LengthRule::Range {
                min: min.saturating_sub(digits),
                max: max.saturating_sub(digits),
            },
        }
    }
}

impl fmt::Display for LengthRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthRule::Exact(expected) => write!(f, "exactly {} digits", expected),
            LengthRule::Range { min, max } => write!(f, "{} to {} digits", min, max),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Mobile,
    Landline,
    Any,
}

fn dialable_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinePattern {
    pub label: String,
    pub kind: LineKind,
    pub accepted_prefixes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded_prefixes: Vec<String>,
    pub length: LengthRule,
    #[serde(default = "dialable_default")]
    pub dialable: bool,
}

impl LinePattern {
    fn new(label: &str, kind: LineKind, accepted: &[&str], length: LengthRule) -> Self {
        LinePattern {
            label: label.to_string(),
            kind,
            accepted_prefixes: accepted.iter().map(|p| p.to_string()).collect(),
            excluded_prefixes: Vec::new(),
            length,
            dialable: true,
        }
    }

    fn excluding(mut self, excluded: &[&str]) -> Self {
        self.excluded_prefixes = excluded.iter().map(|p| p.to_string()).collect();
        self
    }

    fn not_dialable(mut self) -> Self {
        self.dialable = false;
        self
    }

    /// Prefix test only: accepted and not carved out by an exclusion.
    pub fn matches_prefix(&self, digits: &str) -> bool {
        self.accepted_prefixes.iter().any(|p| digits.starts_with(p.as_str()))
            && !self.excluded_prefixes.iter().any(|p| digits.starts_with(p.as_str()))
    }

    pub fn matches(&self, digits: &str) -> bool {
        self.matches_prefix(digits) && self.length.accepts(digits.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryRule {
    pub id: String,
    pub display_name: String,
    pub international_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trunk_prefix: Option<String>,
    pub line_patterns: Vec<LinePattern>,
}

impl CountryRule {
    fn new(id: &str, display_name: &str, international_prefix: &str) -> Self {
        CountryRule {
            id: id.to_string(),
            display_name: display_name.to_string(),
            international_prefix: international_prefix.to_string(),
            trunk_prefix: None,
            line_patterns: Vec::new(),
        }
    }

    fn trunk(mut self, trunk_prefix: &str) -> Self {
        self.trunk_prefix = Some(trunk_prefix.to_string());
        self
    }

    fn pattern(mut self, pattern: LinePattern) -> Self {
        self.line_patterns.push(pattern);
        self
    }

    /// Rewrites a number written with the national trunk code into its
    /// international form, e.g. `0612345678` -> `33612345678` for France.
    pub fn internationalize(&self, digits: &str) -> Option<String> {
        let trunk = self.trunk_prefix.as_deref()?;
        let national = digits.strip_prefix(trunk)?;
        Some(format!("{}{}", self.international_prefix, national))
    }

    /// First pattern whose prefixes match, regardless of length.
    pub fn pattern_for_prefix(&self, digits: &str) -> Option<&LinePattern> {
        self.line_patterns.iter().find(|p| p.matches_prefix(digits))
    }

    pub fn classify(&self, digits: &str) -> Option<&LinePattern> {
        if let Some(international) = self.internationalize(digits) {
            if let Some(pattern) = self.line_patterns.iter().find(|p| p.matches(&international)) {
                return Some(pattern);
            }
        }
        self.line_patterns.iter().find(|p| p.matches(digits))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("country table is empty")]
    Empty,
    #[error("country id is empty")]
    EmptyId,
    #[error("duplicate country id: {0}")]
    DuplicateId(String),
    #[error("country {0} has an invalid international prefix")]
    InvalidPrefix(String),
    #[error("country {0} has an invalid trunk prefix")]
    InvalidTrunkPrefix(String),
    #[error("country {0} has no line patterns")]
    NoPatterns(String),
    #[error("pattern {label} of {country} has no accepted prefixes")]
    NoAcceptedPrefixes { country: String, label: String },
    #[error("pattern {label} of {country} has a non-digit prefix: {prefix}")]
    NonDigitPrefix {
        country: String,
        label: String,
        prefix: String,
    },
    #[error("pattern {label} of {country} has prefix {prefix} outside its international prefix")]
    ForeignPrefix {
        country: String,
        label: String,
        prefix: String,
    },
    #[error("pattern {label} of {country} has an empty length range")]
    InvalidLengthRange { country: String, label: String },
    #[error("invalid country table: {0}")]
    Parse(String),
}

fn is_digit_string(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Ordered registry of supported countries. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryTable {
    countries: Vec<CountryRule>,
}

impl CountryTable {
    pub fn new(countries: Vec<CountryRule>) -> Result<Self, TableError> {
        let table = CountryTable { countries };
        table.validate()?;
        Ok(table)
    }

    pub fn from_json(json: &str) -> Result<Self, TableError> {
        let countries: Vec<CountryRule> =
            serde_json::from_str(json).map_err(|e| TableError::Parse(e.to_string()))?;
        Self::new(countries)
    }

    pub fn builtin() -> Self {
        let countries = vec![
            CountryRule::new("FR", "France", "33")
                .trunk("0")
                .pattern(LinePattern::new(
                    "Mobile FR",
                    LineKind::Mobile,
                    &["336", "337"],
                    LengthRule::Exact(11),
                ))
                .pattern(
                    LinePattern::new(
                        "Landline FR",
                        LineKind::Landline,
                        &["331", "332", "333", "334", "335", "339"],
                        LengthRule::Exact(11),
                    )
                    .not_dialable(),
                ),
            CountryRule::new("CH", "Switzerland", "41")
                .pattern(LinePattern::new(
                    "Mobile CH",
                    LineKind::Mobile,
                    &["417"],
                    LengthRule::Exact(11),
                ))
                .pattern(
                    LinePattern::new(
                        "Landline CH",
                        LineKind::Landline,
                        &["41"],
                        LengthRule::Exact(11),
                    )
                    .excluding(&["417"]),
                ),
            CountryRule::new("BE", "Belgium", "32").pattern(LinePattern::new(
                "Number BE",
                LineKind::Any,
                &["32"],
                LengthRule::Exact(11),
            )),
            CountryRule::new("IT", "Italy", "39").pattern(LinePattern::new(
                "Number IT",
                LineKind::Any,
                &["39"],
                LengthRule::Exact(12),
            )),
            CountryRule::new("AD", "Andorra", "376").pattern(LinePattern::new(
                "Number AD",
                LineKind::Any,
                &["376"],
                LengthRule::Exact(9),
            )),
            CountryRule::new("RE", "Réunion", "262")
                .pattern(LinePattern::new(
                    "Mobile RE",
                    LineKind::Mobile,
                    &["262692", "262693"],
                    LengthRule::Exact(12),
                ))
                .pattern(LinePattern::new(
                    "Landline RE",
                    LineKind::Landline,
                    &["262262"],
                    LengthRule::Exact(12),
                )),
            CountryRule::new("DE", "Germany", "49").pattern(LinePattern::new(
                "Number DE",
                LineKind::Any,
                &["49"],
                LengthRule::Range { min: 11, max: 15 },
            )),
        ];
        CountryTable { countries }
    }

    pub fn validate(&self) -> Result<(), TableError> {
        if self.countries.is_empty() {
            return Err(TableError::Empty);
        }

        let mut seen = HashSet::new();
        for country in &self.countries {
            if country.id.trim().is_empty() {
                return Err(TableError::EmptyId);
            }
            if !seen.insert(country.id.as_str()) {
                return Err(TableError::DuplicateId(country.id.clone()));
            }
            if !is_digit_string(&country.international_prefix) {
                return Err(TableError::InvalidPrefix(country.id.clone()));
            }
            if let Some(trunk) = &country.trunk_prefix {
                if !is_digit_string(trunk) {
                    return Err(TableError::InvalidTrunkPrefix(country.id.clone()));
                }
            }
            if country.line_patterns.is_empty() {
                return Err(TableError::NoPatterns(country.id.clone()));
            }

            for pattern in &country.line_patterns {
                if pattern.accepted_prefixes.is_empty() {
                    return Err(TableError::NoAcceptedPrefixes {
                        country: country.id.clone(),
                        label: pattern.label.clone(),
                    });
                }
                let prefixes = pattern
                    .accepted_prefixes
                    .iter()
                    .chain(pattern.excluded_prefixes.iter());
                for prefix in prefixes {
                    if !is_digit_string(prefix) {
                        return Err(TableError::NonDigitPrefix {
                            country: country.id.clone(),
                            label: pattern.label.clone(),
                            prefix: prefix.clone(),
                        });
                    }
                    if !prefix.starts_with(&country.international_prefix) {
                        return Err(TableError::ForeignPrefix {
                            country: country.id.clone(),
                            label: pattern.label.clone(),
                            prefix: prefix.clone(),
                        });
                    }
                }
                if let LengthRule::Range { min, max } = pattern.length {
                    if min > max {
                        return Err(TableError::InvalidLengthRange {
                            country: country.id.clone(),
                            label: pattern.label.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&CountryRule> {
        self.countries.iter().find(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CountryRule> {
        self.countries.iter()
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

impl Default for CountryTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_is_valid() {
        let table = CountryTable::builtin();
        assert_eq!(table.validate(), Ok(()));
        assert_eq!(table.len(), 7);

        let ids: Vec<&str> = table.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["FR", "CH", "BE", "IT", "AD", "RE", "DE"]);
    }

    #[test]
    fn test_lookup_by_id() {
        let table = builtin_table();
        let swiss = table.get("CH").unwrap();
        assert_eq!(swiss.display_name, "Switzerland");
        assert_eq!(swiss.international_prefix, "41");

        for missing in vec!["US", "fr", "", "GB"] {
            assert!(table.get(missing).is_none(), "Should not be found: {}", missing);
        }
    }

    #[test]
    fn test_swiss_landline_excludes_mobile_prefix() {
        let swiss = builtin_table().get("CH").unwrap();
        let landline = &swiss.line_patterns[1];
        assert!(landline.matches("41221234567"));
        assert!(!landline.matches("41791234567"));
        assert_eq!(swiss.classify("41791234567").unwrap().label, "Mobile CH");
        assert_eq!(swiss.classify("41221234567").unwrap().label, "Landline CH");
    }

    #[test]
    fn test_length_rules() {
        assert!(LengthRule::Exact(11).accepts(11));
        assert!(!LengthRule::Exact(11).accepts(10));

        let range = LengthRule::Range { min: 11, max: 15 };
        for len in 11..=15 {
            assert!(range.accepts(len), "Length should be accepted: {}", len);
        }
        assert!(!range.accepts(10));
        assert!(!range.accepts(16));

        assert_eq!(LengthRule::Exact(11).shorter_by(1), LengthRule::Exact(10));
        assert_eq!(
            range.shorter_by(2),
            LengthRule::Range { min: 9, max: 13 }
        );
    }

    #[test]
    fn test_internationalize_trunk_prefix() {
        let table = builtin_table();
        let france = table.get("FR").unwrap();
        assert_eq!(
            france.internationalize("0612345678").as_deref(),
            Some("33612345678")
        );
        assert_eq!(france.internationalize("33612345678"), None);
        assert_eq!(table.get("DE").unwrap().internationalize("0301234567"), None);
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let mut countries: Vec<CountryRule> = CountryTable::builtin().iter().cloned().collect();
        countries.push(countries[0].clone());
        assert_eq!(
            CountryTable::new(countries),
            Err(TableError::DuplicateId("FR".to_string()))
        );
    }

    #[test]
    fn test_rejects_bad_patterns() {
        let empty_prefixes = CountryRule::new("XX", "Nowhere", "999").pattern(LinePattern::new(
            "Number XX",
            LineKind::Any,
            &[],
            LengthRule::Exact(10),
        ));
        assert!(matches!(
            CountryTable::new(vec![empty_prefixes]),
            Err(TableError::NoAcceptedPrefixes { .. })
        ));

        let letters = CountryRule::new("XX", "Nowhere", "999").pattern(LinePattern::new(
            "Number XX",
            LineKind::Any,
            &["99a"],
            LengthRule::Exact(10),
        ));
        assert!(matches!(
            CountryTable::new(vec![letters]),
            Err(TableError::NonDigitPrefix { .. })
        ));

        let foreign = CountryRule::new("XX", "Nowhere", "999").pattern(LinePattern::new(
            "Number XX",
            LineKind::Any,
            &["9991", "4479"],
            LengthRule::Exact(12),
        ));
        assert_eq!(
            CountryTable::new(vec![foreign]),
            Err(TableError::ForeignPrefix {
                country: "XX".to_string(),
                label: "Number XX".to_string(),
                prefix: "4479".to_string(),
            })
        );

        let excluded = CountryRule::new("XX", "Nowhere", "999").pattern(
            LinePattern::new("Number XX", LineKind::Any, &["999"], LengthRule::Exact(12))
                .excluding(&["33"]),
        );
        assert!(matches!(
            CountryTable::new(vec![excluded]),
            Err(TableError::ForeignPrefix { .. })
        ));

        let inverted = CountryRule::new("XX", "Nowhere", "999").pattern(LinePattern::new(
            "Number XX",
            LineKind::Any,
            &["999"],
            LengthRule::Range { min: 12, max: 10 },
        ));
        assert!(matches!(
            CountryTable::new(vec![inverted]),
            Err(TableError::InvalidLengthRange { .. })
        ));

        assert_eq!(CountryTable::new(vec![]), Err(TableError::Empty));
    }

    #[test]
    fn test_json_table_round_trip() {
        let json = serde_json::to_string(builtin_table()).unwrap();
        let table = CountryTable::from_json(&json).unwrap();
        assert_eq!(&table, builtin_table());
    }

    #[test]
    fn test_json_table_defaults() {
        let json = r#"[
            {
                "id": "LU",
                "displayName": "Luxembourg",
                "internationalPrefix": "352",
                "linePatterns": [
                    {
                        "label": "Number LU",
                        "kind": "any",
                        "acceptedPrefixes": ["352"],
                        "length": { "min": 9, "max": 14 }
                    }
                ]
            }
        ]"#;
        let table = CountryTable::from_json(json).unwrap();
        let lux = table.get("LU").unwrap();
        assert_eq!(lux.trunk_prefix, None);
        assert!(lux.line_patterns[0].dialable);
        assert!(lux.line_patterns[0].excluded_prefixes.is_empty());
        assert_eq!(lux.line_patterns[0].length, LengthRule::Range { min: 9, max: 14 });

        assert!(matches!(
            CountryTable::from_json("not json"),
            Err(TableError::Parse(_))
        ));
    }
}
