//! Offline regex/keyword PII detectors (C12) feeding redaction and
//! highlight plan generation. No network call, no model inference: every
//! pattern here runs locally and deterministically.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Upper-cased entity type, matching `PIIFinding.entity_type`'s contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Ssn,
    CreditCard,
    Email,
    Phone,
    IpAddress,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Ssn => "SSN",
            EntityType::CreditCard => "CREDIT_CARD",
            EntityType::Email => "EMAIL",
            EntityType::Phone => "PHONE",
            EntityType::IpAddress => "IP_ADDRESS",
        }
    }
}

/// One detected span, prior to becoming a `PIIFinding` or redaction action.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub entity_type: EntityType,
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub score: f64,
}

static RE_SSN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap());

static RE_CREDIT_CARD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:\d[ -]?){13,16}\b").unwrap());

static RE_EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());

static RE_PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]\d{3}[-.\s]\d{4}\b").unwrap());

static RE_IP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:(?:25[0-5]|2[0-4]\d|[01]?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|[01]?\d?\d)\b").unwrap()
});

/// Offline PII detector over plain text.
#[derive(Debug, Clone, Default)]
pub struct PiiDetector;

impl PiiDetector {
    pub fn new() -> Self {
        PiiDetector
    }

    /// Find every recognized entity in `text`, sorted by position. A byte
    /// range matched by a more specific pattern (SSN, email) is not also
    /// reported under a weaker one (credit card) when the spans overlap.
    pub fn find_all(&self, text: &str) -> Vec<Match> {
        let mut matches = Vec::new();
        for m in RE_SSN.find_iter(text) {
            matches.push(Match {
                entity_type: EntityType::Ssn,
                start: m.start(),
                end: m.end(),
                text: m.as_str().to_string(),
                score: 0.9,
            });
        }
        for m in RE_EMAIL.find_iter(text) {
            matches.push(Match {
                entity_type: EntityType::Email,
                start: m.start(),
                end: m.end(),
                text: m.as_str().to_string(),
                score: 0.95,
            });
        }
        for m in RE_PHONE.find_iter(text) {
            matches.push(Match {
                entity_type: EntityType::Phone,
                start: m.start(),
                end: m.end(),
                text: m.as_str().to_string(),
                score: 0.75,
            });
        }
        for m in RE_IP.find_iter(text) {
            matches.push(Match {
                entity_type: EntityType::IpAddress,
                start: m.start(),
                end: m.end(),
                text: m.as_str().to_string(),
                score: 0.6,
            });
        }
        for m in RE_CREDIT_CARD.find_iter(text) {
            let digits: String = m.as_str().chars().filter(|c| c.is_ascii_digit()).collect();
            if luhn_valid(&digits) {
                matches.push(Match {
                    entity_type: EntityType::CreditCard,
                    start: m.start(),
                    end: m.end(),
                    text: m.as_str().to_string(),
                    score: 0.85,
                });
            }
        }

        matches.sort_by_key(|m| m.start);
        drop_overlaps(matches)
    }
}

/// Keep the first (earliest-starting, by insertion order already sorted)
/// match of any set of overlapping spans, discarding the rest.
fn drop_overlaps(matches: Vec<Match>) -> Vec<Match> {
    let mut kept: Vec<Match> = Vec::with_capacity(matches.len());
    for m in matches {
        if kept.last().is_some_and(|last: &Match| m.start < last.end) {
            continue;
        }
        kept.push(m);
    }
    kept
}

fn luhn_valid(digits: &str) -> bool {
    if digits.len() < 13 || digits.len() > 19 {
        return false;
    }
    let sum: u32 = digits
        .chars()
        .rev()
        .enumerate()
        .map(|(i, c)| {
            let d = c.to_digit(10).unwrap_or(0);
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_ssn_and_email() {
        let detector = PiiDetector::new();
        let matches = detector.find_all("Contact jdoe@example.com, SSN 123-45-6789.");
        assert!(matches.iter().any(|m| m.entity_type == EntityType::Email));
        assert!(matches.iter().any(|m| m.entity_type == EntityType::Ssn));
    }

    #[test]
    fn detects_valid_credit_card_only() {
        let detector = PiiDetector::new();
        // 4111111111111111 is a well-known Luhn-valid test number.
        let matches = detector.find_all("card 4111111111111111 expires soon");
        assert!(matches.iter().any(|m| m.entity_type == EntityType::CreditCard));

        let invalid = detector.find_all("card 1234567890123456 expires soon");
        assert!(!invalid.iter().any(|m| m.entity_type == EntityType::CreditCard));
    }

    #[test]
    fn overlapping_matches_keep_earliest_only() {
        let detector = PiiDetector::new();
        let matches = detector.find_all("192.168.1.1");
        let ip_count = matches.iter().filter(|m| m.entity_type == EntityType::IpAddress).count();
        assert_eq!(ip_count, 1);
    }

    #[test]
    fn plain_text_with_no_pii_yields_no_matches() {
        let detector = PiiDetector::new();
        assert!(detector.find_all("The quick brown fox jumps over the lazy dog.").is_empty());
    }
}
