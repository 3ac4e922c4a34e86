use crate::extraction::{parse_description, parse_summary, Channel};
use crate::countries::LineKind;
use crate::normalizer::{clean_input, FormatError, Normalizer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Calendar event fields as received from a client.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EventFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContactError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error(transparent)]
    Phone(#[from] FormatError),
}

impl ContactError {
    pub fn kind(&self) -> &'static str {
        match self {
            ContactError::MissingField(_) => "missing_field",
            ContactError::Phone(err) => err.kind().as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorBody {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl From<&ContactError> for ErrorBody {
    fn from(err: &ContactError) -> Self {
        ErrorBody::new(err.kind(), err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    pub status: Status,
    pub channel: Channel,
    pub first_name: Option<String>,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub line_type: Option<String>,
    pub family_name: Option<String>,
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl ContactRecord {
    pub fn failure(error: ErrorBody) -> Self {
        ContactRecord {
            status: Status::Error,
            channel: Channel::Unknown,
            first_name: None,
            phone: None,
            country: None,
            line_type: None,
            family_name: None,
            amount: None,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Builds a contact record from an event. Never fails: problems are
/// reported through `status` and `error`, alongside whatever could still be
/// extracted.
pub fn extract_contact(normalizer: &Normalizer<'_>, event: &EventFields) -> ContactRecord {
    let summary = match event.summary.as_deref().map(str::trim) {
        Some(summary) if !summary.is_empty() => summary,
        _ => {
            let err = ContactError::MissingField("summary");
            return ContactRecord::failure(ErrorBody::from(&err));
        }
    };

    let fields = parse_summary(summary);
    let details = event
        .description
        .as_deref()
        .map(parse_description);

    let mut record = ContactRecord {
        status: Status::Success,
        channel: fields.channel,
        first_name: fields.first_name,
        phone: None,
        country: None,
        line_type: None,
        family_name: details.as_ref().and_then(|d| d.family_name.clone()),
        amount: details.as_ref().and_then(|d| d.amount),
        error: None,
    };

    match normalizer.format(fields.raw_phone.as_deref().unwrap_or("")) {
        Ok(number) => {
            record.phone = Some(number.formatted);
            record.country = Some(number.country);
            record.line_type = Some(number.line_type);
        }
        Err(err) => {
            record.status = Status::Error;
            record.error = Some(ErrorBody::from(&ContactError::from(err)));
        }
    }
    record
}

/// Result of normalizing a single phone number, as returned by the
/// `/normalize` endpoint and `--phone` on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneReport {
    pub status: Status,
    pub input: String,
    pub cleaned: String,
    pub classification: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_kind: Option<LineKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl PhoneReport {
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

pub fn normalize_phone(normalizer: &Normalizer<'_>, raw: &str) -> PhoneReport {
    let cleaned = clean_input(raw);
    let mut report = PhoneReport {
        status: Status::Success,
        input: raw.to_string(),
        classification: normalizer.classify(&cleaned).to_string(),
        cleaned,
        formatted: None,
        country: None,
        line_type: None,
        line_kind: None,
        error: None,
    };

    match normalizer.format(raw) {
        Ok(number) => {
            report.formatted = Some(number.formatted);
            report.country = Some(number.country);
            report.line_type = Some(number.line_type);
            report.line_kind = Some(number.kind);
        }
        Err(err) => {
            report.status = Status::Error;
            report.error = Some(ErrorBody::new(err.kind().as_str(), err.to_string()));
        }
    }
    report
}
