use crate::countries::{
    builtin_table, CountryRule, CountryTable, LengthRule, LineKind, LinePattern,
};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::debug;

pub const UNKNOWN_LINE_TYPE: &str = "Unknown";

/// Keeps ASCII digits plus a leading `+`, then drops the international
/// access marker (`+` or `00`). Always returns digits only.
pub fn clean_input(raw: &str) -> String {
    let mut kept = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_digit() || (c == '+' && kept.is_empty()) {
            kept.push(c);
        }
    }

    if let Some(rest) = kept.strip_prefix('+') {
        rest.to_string()
    } else if let Some(rest) = kept.strip_prefix("00") {
        rest.to_string()
    } else {
        kept
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    EmptyInput,
    RejectedLineType,
    InvalidLength,
    UnrecognizedFormat,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::EmptyInput => "empty_input",
            ErrorKind::RejectedLineType => "rejected_line_type",
            ErrorKind::InvalidLength => "invalid_length",
            ErrorKind::UnrecognizedFormat => "unrecognized_format",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("phone number is empty")]
    EmptyInput,
    #[error("{label} numbers are not accepted: {number}")]
    RejectedLineType { label: String, number: String },
    #[error("{country} number {number} has {actual} digits, expected {expected}")]
    InvalidLength {
        country: String,
        number: String,
        expected: LengthRule,
        actual: usize,
    },
    #[error("unrecognized phone number format: {0:?}")]
    UnrecognizedFormat(String),
}

impl FormatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FormatError::EmptyInput => ErrorKind::EmptyInput,
            FormatError::RejectedLineType { .. } => ErrorKind::RejectedLineType,
            FormatError::InvalidLength { .. } => ErrorKind::InvalidLength,
            FormatError::UnrecognizedFormat(_) => ErrorKind::UnrecognizedFormat,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedNumber {
    pub formatted: String,
    pub country: String,
    pub line_type: String,
    pub kind: LineKind,
}

#[derive(Debug, Clone, Copy)]
pub struct Classification<'a> {
    pub country: &'a CountryRule,
    pub pattern: &'a LinePattern,
}

/// Outcome of trying one country against a cleaned number.
enum Attempt {
    Done(Result<NormalizedNumber, FormatError>),
    Continue,
}

/// Cleans, classifies and formats phone numbers against a country table.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    table: &'a CountryTable,
}

impl Default for Normalizer<'static> {
    fn default() -> Self {
        Normalizer::new(builtin_table())
    }
}

impl<'a> Normalizer<'a> {
    pub fn new(table: &'a CountryTable) -> Self {
        Normalizer { table }
    }

    pub fn table(&self) -> &'a CountryTable {
        self.table
    }

    /// First country and pattern matching an already-cleaned number, in
    /// table order.
    pub fn classify_match(&self, cleaned: &str) -> Option<Classification<'a>> {
        self.table.iter().find_map(|country| {
            country
                .classify(cleaned)
                .map(|pattern| Classification { country, pattern })
        })
    }

    pub fn classify(&self, cleaned: &str) -> &'a str {
        self.classify_match(cleaned)
            .map(|m| m.pattern.label.as_str())
            .unwrap_or(UNKNOWN_LINE_TYPE)
    }

    pub fn format(&self, raw: &str) -> Result<NormalizedNumber, FormatError> {
        let cleaned = clean_input(raw);
        if cleaned.is_empty() {
            return Err(FormatError::EmptyInput);
        }

        for country in self.table.iter() {
            let attempt = if country.trunk_prefix.is_some() {
                match self.local_form(country, &cleaned) {
                    Attempt::Continue => self.international_trunk_form(country, &cleaned),
                    done => done,
                }
            } else {
                self.international_form(country, &cleaned)
            };

            if let Attempt::Done(result) = attempt {
                if let Err(err) = &result {
                    debug!(country = %country.id, kind = %err.kind(), "phone number rejected: {}", err);
                }
                return result;
            }
        }

        debug!(cleaned = %cleaned, "phone number matched no country");
        Err(FormatError::UnrecognizedFormat(cleaned))
    }

    /// Number written with the national trunk code, e.g. `06…` in France.
    fn local_form(&self, country: &CountryRule, cleaned: &str) -> Attempt {
        let international = match country.internationalize(cleaned) {
            Some(international) => international,
            None => return Attempt::Continue,
        };
        let fits = |pattern: &LinePattern| pattern.length.accepts(international.len());
        let offset = international.len().saturating_sub(cleaned.len());

        match country.pattern_for_prefix(&international) {
            Some(pattern) if pattern.dialable => {
                if fits(pattern) {
                    Attempt::Done(Ok(success(country, pattern, &international)))
                } else {
                    let expected = pattern.length.shorter_by(offset);
                    Attempt::Done(Err(invalid_length(country, expected, cleaned)))
                }
            }
            Some(pattern) if fits(pattern) => Attempt::Done(Err(FormatError::RejectedLineType {
                label: pattern.label.clone(),
                number: cleaned.to_string(),
            })),
            Some(_) => Attempt::Continue,
            None => match country.line_patterns.iter().find(|&p| fits(p)) {
                Some(sized) => {
                    let expected = sized.length.shorter_by(offset);
                    Attempt::Done(Err(invalid_length(country, expected, cleaned)))
                }
                None => Attempt::Continue,
            },
        }
    }

    /// Already-internationalized number of a country that also has a local
    /// form. Only a complete, dialable match is accepted here.
    fn international_trunk_form(&self, country: &CountryRule, cleaned: &str) -> Attempt {
        match country.line_patterns.iter().find(|p| p.matches(cleaned)) {
            Some(pattern) if pattern.dialable => {
                Attempt::Done(Ok(success(country, pattern, cleaned)))
            }
            _ => Attempt::Continue,
        }
    }

    fn international_form(&self, country: &CountryRule, cleaned: &str) -> Attempt {
        let pattern = match country.pattern_for_prefix(cleaned) {
            Some(pattern) => pattern,
            None => return Attempt::Continue,
        };

        if !pattern.length.accepts(cleaned.len()) {
            return Attempt::Done(Err(invalid_length(country, pattern.length, cleaned)));
        }
        if !pattern.dialable {
            return Attempt::Done(Err(FormatError::RejectedLineType {
                label: pattern.label.clone(),
                number: cleaned.to_string(),
            }));
        }
        Attempt::Done(Ok(success(country, pattern, cleaned)))
    }
}

fn success(country: &CountryRule, pattern: &LinePattern, international: &str) -> NormalizedNumber {
    NormalizedNumber {
        formatted: format!("+{}", international),
        country: country.id.clone(),
        line_type: pattern.label.clone(),
        kind: pattern.kind,
    }
}

fn invalid_length(country: &CountryRule, expected: LengthRule, cleaned: &str) -> FormatError {
    FormatError::InvalidLength {
        country: country.display_name.clone(),
        number: cleaned.to_string(),
        expected,
        actual: cleaned.len(),
    }
}
