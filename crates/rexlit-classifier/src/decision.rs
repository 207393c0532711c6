//! `PolicyDecision` (§3) and the chain-of-thought privacy guarantees the
//! envelope enforces before anything is persisted (§4.11).

use serde::{Deserialize, Serialize};

use rexlit_common::hash::sha256_bytes;

const MAX_SUMMARY_CHARS: usize = 200;
const BANNED_SUMMARY_MARKERS: [&str; 3] = ["\"", "excerpt:", "states:"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyDecision {
    pub labels: Vec<String>,
    pub confidence: f64,
    pub needs_review: bool,
    pub reasoning_hash: String,
    pub reasoning_summary: String,
    pub full_reasoning_available: bool,
    pub redaction_spans: Vec<(usize, usize)>,
    pub model_version: String,
    pub policy_version: String,
    pub reasoning_effort: String,
    pub decision_ts: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl PolicyDecision {
    /// A decision produced from a model call: `reasoning_hash` is computed
    /// over the raw chain-of-thought plus `salt` and the raw text itself
    /// never enters the record (§I5).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        labels: Vec<String>,
        confidence: f64,
        needs_review: bool,
        raw_cot: &str,
        salt: &str,
        redaction_spans: Vec<(usize, usize)>,
        model_version: impl Into<String>,
        policy_version: impl Into<String>,
        reasoning_effort: impl Into<String>,
    ) -> Self {
        PolicyDecision {
            labels,
            confidence,
            needs_review,
            reasoning_hash: reasoning_hash(raw_cot, salt),
            reasoning_summary: scrub_summary(raw_cot),
            full_reasoning_available: false,
            redaction_spans,
            model_version: model_version.into(),
            policy_version: policy_version.into(),
            reasoning_effort: reasoning_effort.into(),
            decision_ts: chrono::Utc::now(),
            error_message: None,
        }
    }

    /// The fallback decision produced for timeouts, malformed model output,
    /// or a circuit-open rejection — never a raw exception (§4.11).
    pub fn error(error_message: impl Into<String>, model_version: impl Into<String>, policy_version: impl Into<String>) -> Self {
        PolicyDecision {
            labels: Vec::new(),
            confidence: 0.0,
            needs_review: true,
            reasoning_hash: String::new(),
            reasoning_summary: String::new(),
            full_reasoning_available: false,
            redaction_spans: Vec::new(),
            model_version: model_version.into(),
            policy_version: policy_version.into(),
            reasoning_effort: "none".to_string(),
            decision_ts: chrono::Utc::now(),
            error_message: Some(error_message.into()),
        }
    }
}

/// `SHA-256(raw_cot || salt)` (§I5).
pub fn reasoning_hash(raw_cot: &str, salt: &str) -> String {
    let mut combined = Vec::with_capacity(raw_cot.len() + salt.len());
    combined.extend_from_slice(raw_cot.as_bytes());
    combined.extend_from_slice(salt.as_bytes());
    sha256_bytes(&combined)
}

/// Build a summary of at most 200 chars, dropping any line that contains a
/// quote, `"excerpt:"`, or `"states:"` — the markers most likely to carry a
/// verbatim quote out of the redacted reasoning (§4.11).
pub fn scrub_summary(raw_cot: &str) -> String {
    let safe_lines: Vec<&str> = raw_cot
        .lines()
        .filter(|line| {
            let lower = line.to_ascii_lowercase();
            !BANNED_SUMMARY_MARKERS.iter().any(|marker| lower.contains(marker))
        })
        .collect();

    let joined = safe_lines.join(" ");
    if joined.chars().count() <= MAX_SUMMARY_CHARS {
        joined
    } else {
        joined.chars().take(MAX_SUMMARY_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasoning_hash_is_salted_and_deterministic() {
        let a = reasoning_hash("the document discusses privilege", "salt-1");
        let b = reasoning_hash("the document discusses privilege", "salt-1");
        let c = reasoning_hash("the document discusses privilege", "salt-2");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn scrub_summary_drops_lines_with_banned_markers() {
        let raw = "first line is safe\nit states: the memo is privileged\nlast line fine";
        let summary = scrub_summary(raw);
        assert!(!summary.contains("states:"));
        assert!(summary.contains("first line is safe"));
    }

    #[test]
    fn scrub_summary_drops_quoted_excerpts() {
        let raw = "he said \"do not disclose\" in the email";
        let summary = scrub_summary(raw);
        assert!(summary.is_empty());
    }

    #[test]
    fn scrub_summary_truncates_to_200_chars() {
        let raw = "a".repeat(500);
        let summary = scrub_summary(&raw);
        assert_eq!(summary.chars().count(), 200);
    }

    #[test]
    fn error_decision_has_empty_labels_and_needs_review() {
        let decision = PolicyDecision::error("model timed out", "gpt-x", "policy-1");
        assert!(decision.labels.is_empty());
        assert_eq!(decision.confidence, 0.0);
        assert!(decision.needs_review);
        assert_eq!(decision.error_message.as_deref(), Some("model timed out"));
    }
}
