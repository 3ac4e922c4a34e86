pub mod api;
pub mod config;
pub mod contact;
pub mod countries;
pub mod extraction;
pub mod logging;
pub mod normalizer;

pub use countries::{builtin_table, CountryRule, CountryTable, LengthRule, LineKind, LinePattern};
pub use normalizer::{clean_input, ErrorKind, FormatError, NormalizedNumber, Normalizer};

/// Line-type label of an already-cleaned number, or `"Unknown"`.
pub fn classify(cleaned: &str) -> &'static str {
    Normalizer::default().classify(cleaned)
}

pub fn format(raw: &str) -> Result<NormalizedNumber, FormatError> {
    Normalizer::default().format(raw)
}
