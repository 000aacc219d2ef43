//! PII redaction for span attributes.
//!
//! Detects and masks personally identifiable information in string values:
//! - Payment card numbers
//! - Email addresses
//! - Phone numbers
//!
//! The walk preserves structural shape: objects keep their keys, arrays keep
//! their length, and only leaf string content is rewritten.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::logging::structured::LogContext;

use super::{Attributes, Sanitizer};

lazy_static! {
    /// Payment-card-like digit runs (13-16 digits, optional space or
    /// hyphen separators, at word boundaries)
    static ref CARD_PATTERN: Regex = Regex::new(
        r"\b(?:\d[ -]*?){13,16}\b"
    ).unwrap();

    /// Email pattern
    static ref EMAIL_PATTERN: Regex = Regex::new(
        r"(?i)[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}"
    ).unwrap();

    /// Phone-shaped digit runs (10-15 digits at word boundaries)
    static ref PHONE_PATTERN: Regex = Regex::new(
        r"\b\d{10,15}\b"
    ).unwrap();
}

/// PII redaction tallies for one sanitize pass.
#[derive(Debug, Default)]
pub struct PiiScrubResult {
    pub cards_found: usize,
    pub emails_found: usize,
    pub phones_found: usize,
}

impl PiiScrubResult {
    pub fn total_entities(&self) -> usize {
        self.cards_found + self.emails_found + self.phones_found
    }
}

/// Sanitizer that masks card numbers, email addresses and phone numbers in
/// string values, recursing through nested objects and arrays.
#[derive(Debug, Default)]
pub struct PiiSanitizer;

impl PiiSanitizer {
    pub fn new() -> Self {
        Self
    }
}

impl Sanitizer for PiiSanitizer {
    fn sanitize(&self, attributes: &Attributes, ctx: &LogContext) -> Attributes {
        let mut result = PiiScrubResult::default();
        let mut scrubbed = Attributes::new();
        for (key, val) in attributes {
            scrubbed.insert(key.clone(), scrub_value(val, &mut result));
        }

        if result.total_entities() > 0 {
            log::info!(
                "{} PII_SCRUBBED cards={} emails={} phones={}",
                ctx,
                result.cards_found,
                result.emails_found,
                result.phones_found
            );
        }

        scrubbed
    }
}

/// Recursively scrub a JSON value, replacing only leaf string content.
fn scrub_value(value: &Value, result: &mut PiiScrubResult) -> Value {
    match value {
        Value::String(s) => Value::String(scrub_string(s, result)),
        Value::Array(arr) => {
            Value::Array(arr.iter().map(|v| scrub_value(v, result)).collect())
        }
        Value::Object(obj) => {
            let mut scrubbed = serde_json::Map::new();
            for (key, val) in obj {
                scrubbed.insert(key.clone(), scrub_value(val, result));
            }
            Value::Object(scrubbed)
        }
        _ => value.clone(),
    }
}

/// Apply the three redactions in fixed order: card, then email, then phone.
/// The order is load-bearing: card redaction consumes the long digit runs
/// that would otherwise re-match as phone-shaped, and masked output must
/// not be re-matched by the later patterns.
fn scrub_string(s: &str, result: &mut PiiScrubResult) -> String {
    let scrubbed = CARD_PATTERN.replace_all(s, |caps: &Captures<'_>| {
        result.cards_found += 1;
        mask_card(&caps[0])
    });
    let scrubbed = EMAIL_PATTERN.replace_all(&scrubbed, |caps: &Captures<'_>| {
        result.emails_found += 1;
        mask_email(&caps[0])
    });
    let scrubbed = PHONE_PATTERN.replace_all(&scrubbed, |caps: &Captures<'_>| {
        result.phones_found += 1;
        mask_phone(&caps[0])
    });
    scrubbed.into_owned()
}

/// Keep the last four digits of a card-shaped run.
fn mask_card(card: &str) -> String {
    let digits: String = card.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() > 4 {
        format!("****-****-****-{}", &digits[digits.len() - 4..])
    } else {
        "****".to_string()
    }
}

/// Keep the first four characters of the local part and the full domain.
fn mask_email(email: &str) -> String {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return "***@***".to_string();
    }
    let (local, domain) = (parts[0], parts[1]);
    let kept: String = local.chars().take(4).collect();
    format!("{}...{}", kept, domain)
}

/// Keep the last four digits of a phone-shaped run.
fn mask_phone(phone: &str) -> String {
    if phone.len() > 4 {
        format!("...{}", &phone[phone.len() - 4..])
    } else {
        "...".to_string()
    }
}
