pub mod description;
pub mod summary;

pub use description::{parse_description, DescriptionFields};
pub use summary::{parse_summary, Channel, SummaryFields};

const HONORIFICS: [&str; 8] = [
    "m", "mr", "mme", "mlle", "madame", "monsieur", "mademoiselle", "dr",
];

/// Separators that may stick to a word in free text ("Jean,", "-", "(06)").
pub(crate) fn trim_separators(word: &str) -> &str {
    word.trim_matches(|c: char| matches!(c, '-' | ':' | ',' | '/' | ';' | '(' | ')' | '.'))
}

pub(crate) fn is_honorific(word: &str) -> bool {
    let word = trim_separators(word).to_lowercase();
    HONORIFICS.contains(&word.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_honorifics() {
        for word in vec!["M.", "Mr", "MME", "Mlle", "Madame", "monsieur", "Dr.", "mademoiselle"] {
            assert!(is_honorific(word), "Should be an honorific: {}", word);
        }
        for word in vec!["Marie", "Mo", "Dupont", ""] {
            assert!(!is_honorific(word), "Should not be an honorific: {}", word);
        }
    }

    #[test]
    fn test_trim_separators() {
        assert_eq!(trim_separators("Jean,"), "Jean");
        assert_eq!(trim_separators("(Paul)"), "Paul");
        assert_eq!(trim_separators("-"), "");
        assert_eq!(trim_separators("Jean-Luc"), "Jean-Luc");
    }
}
