use regex::Regex;
use lazy_static::lazy_static;
use super::{is_honorific, trim_separators};

lazy_static! {
    // "50 €", "45,50 euros", "30eur" or "€ 20"
    static ref AMOUNT_PATTERN: Regex = Regex::new(
        r"(?i)(?:(\d+(?:[.,]\d{1,2})?)\s*(?:€|euros?\b|eur\b))|(?:€\s*(\d+(?:[.,]\d{1,2})?))"
    ).unwrap();

    // Explicit "Nom: Dupont" label
    static ref NAME_LABEL_PATTERN: Regex = Regex::new(
        r"(?i)\bnom\s*:\s*(\p{L}[\p{L}'\-]+)"
    ).unwrap();
}

#[derive(Debug, Clone, PartialEq)]
pub struct DescriptionFields {
    pub family_name: Option<String>,
    pub amount: Option<f64>,
}

pub fn parse_description(description: &str) -> DescriptionFields {
    DescriptionFields {
        family_name: extract_family_name(description),
        amount: extract_amount(description),
    }
}

pub fn extract_family_name(text: &str) -> Option<String> {
    if let Some(cap) = NAME_LABEL_PATTERN.captures(text) {
        return Some(cap[1].to_string());
    }

    text.split_whitespace()
        .filter(|w| !is_honorific(w))
        .map(trim_separators)
        .find(|w| is_name_word(w))
        .map(|w| w.to_string())
}

pub fn extract_amount(text: &str) -> Option<f64> {
    let cap = AMOUNT_PATTERN.captures(text)?;
    let number = cap.get(1).or_else(|| cap.get(2))?;
    number.as_str().replace(',', ".").parse::<f64>().ok()
}

fn is_name_word(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() => {}
        _ => return false,
    }
    word.chars().count() >= 2
        && chars.all(|c| c.is_alphabetic() || c == '\'' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_amounts() {
        let cases = vec![
            ("Consultation 50€", 50.0),
            ("Dupont 45,50 euros", 45.5),
            ("tarif 30 EUR", 30.0),
            ("payé € 20", 20.0),
            ("60.5 euro", 60.5),
            ("1 euro symbolique", 1.0),
        ];

        for (text, amount) in cases {
            assert_eq!(extract_amount(text), Some(amount), "Amount in {:?}", text);
        }
    }

    #[test]
    fn test_missing_amounts() {
        let texts = vec!["Dupont", "rdv à 14h30", "50 personnes", "", "2 europeens"];

        for text in texts {
            assert_eq!(extract_amount(text), None, "Should have no amount: {:?}", text);
        }
    }

    #[test]
    fn test_family_names() {
        let cases = vec![
            ("Dupont 50€", Some("Dupont")),
            ("M. Martin, 60 euros", Some("Martin")),
            ("Mme Le Goff", Some("Le")),
            ("50€ Durand", Some("Durand")),
            ("Nom: Lefèvre - 40€", Some("Lefèvre")),
            ("madame d'Artagnan", Some("d'Artagnan")),
            ("45 €", None),
            ("", None),
        ];

        for (text, name) in cases {
            assert_eq!(extract_family_name(text).as_deref(), name, "Family name in {:?}", text);
        }
    }

    #[test]
    fn test_parse_description() {
        let fields = parse_description("Mr Bernard 75,00 €");
        assert_eq!(fields.family_name.as_deref(), Some("Bernard"));
        assert_eq!(fields.amount, Some(75.0));
    }
}
