use regex::Regex;
use lazy_static::lazy_static;
use serde::Serialize;
use super::{is_honorific, trim_separators};

lazy_static! {
    // A run of digits and common separators, optionally led by '+'
    static ref PHONE_PATTERN: Regex = Regex::new(
        r"\+?\d[\d\s./()\-]*\d"
    ).unwrap();
}

const MIN_PHONE_DIGITS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    PhoneCall,
    HomeVisit,
    Messaging,
    Unknown,
}

impl Channel {
    pub fn from_token(token: &str) -> Channel {
        match trim_separators(token).to_lowercase().as_str() {
            "appel" | "tel" | "tél" | "telephone" | "téléphone" | "call" | "phone" => {
                Channel::PhoneCall
            }
            "visite" | "domicile" | "vad" | "visit" => Channel::HomeVisit,
            "whatsapp" | "wa" | "whats" | "sms" | "message" | "messaging" => Channel::Messaging,
            _ => Channel::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryFields {
    pub channel: Channel,
    pub first_name: Option<String>,
    pub raw_phone: Option<String>,
}

/// Splits an event summary such as `"Appel Jean 06 12 34 56 78"` into its
/// channel, first name and raw phone substring.
pub fn parse_summary(summary: &str) -> SummaryFields {
    let trimmed = summary.trim();

    let first_token = trimmed.split_whitespace().next().unwrap_or("");
    let channel = Channel::from_token(first_token);
    let rest = if channel == Channel::Unknown {
        trimmed
    } else {
        &trimmed[first_token.len()..]
    };

    let phone = PHONE_PATTERN
        .find_iter(rest)
        .find_map(|m| phone_span(rest, m.start(), m.end()));

    let (raw_phone, name_text) = match phone {
        Some((start, end)) => (
            Some(rest[start..end].trim().to_string()),
            format!("{} {}", &rest[..start], &rest[end..]),
        ),
        None => (None, rest.to_string()),
    };

    SummaryFields {
        channel,
        first_name: clean_name(&name_text),
        raw_phone,
    }
}

/// Narrows a digit run to the phone number it holds. A last group glued to
/// letters, like the `15` of `15h30`, belongs to the following word.
fn phone_span(text: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let mut end = end;
    if text[end..].starts_with(char::is_alphabetic) {
        if let Some(cut) = text[start..end].rfind(|c: char| !c.is_ascii_digit()) {
            end = start + cut;
        }
        while end > start && !text[..end].ends_with(|c: char| c.is_ascii_digit()) {
            end -= 1;
        }
    }

    let digits = text[start..end].chars().filter(|c| c.is_ascii_digit()).count();
    if digits >= MIN_PHONE_DIGITS {
        Some((start, end))
    } else {
        None
    }
}

fn clean_name(text: &str) -> Option<String> {
    let words: Vec<&str> = text
        .split_whitespace()
        .filter(|w| !is_honorific(w))
        .map(trim_separators)
        .filter(|w| !w.is_empty())
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}
