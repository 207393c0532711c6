//! The privacy-preserving classifier envelope (§4.11): wraps any model port
//! with a circuit breaker, a timeout, and chain-of-thought redaction before
//! a `PolicyDecision` is ever constructed.

use std::time::{Duration, Instant};

use rexlit_common::error::{Error, Result};

use crate::circuit_breaker::CircuitBreaker;
use crate::decision::PolicyDecision;
use crate::escalation::{EscalationDecision, EscalationPolicy};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw output of a single model call: labels, confidence, and the full
/// chain-of-thought text the envelope will hash/scrub before persisting.
pub struct ModelOutput {
    pub labels: Vec<String>,
    pub confidence: f64,
    pub raw_cot: String,
}

/// Any port that can answer a classification/privilege-review prompt.
pub trait ModelPort {
    fn classify(&self, text: &str) -> Result<ModelOutput>;
}

/// Wraps a `ModelPort` with resilience (circuit breaker + timeout) and
/// privacy guarantees (salted CoT hash, scrubbed summary).
pub struct ClassifierEnvelope<'a> {
    port: &'a dyn ModelPort,
    breaker: CircuitBreaker,
    timeout: Duration,
    salt: String,
    model_version: String,
    policy_version: String,
    reasoning_effort: String,
}

impl<'a> ClassifierEnvelope<'a> {
    pub fn new(
        port: &'a dyn ModelPort,
        salt: impl Into<String>,
        model_version: impl Into<String>,
        policy_version: impl Into<String>,
        reasoning_effort: impl Into<String>,
    ) -> Self {
        ClassifierEnvelope {
            port,
            breaker: CircuitBreaker::default(),
            timeout: DEFAULT_TIMEOUT,
            salt: salt.into(),
            model_version: model_version.into(),
            policy_version: policy_version.into(),
            reasoning_effort: reasoning_effort.into(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Classify `text`, always returning a `PolicyDecision` — timeouts,
    /// malformed output, and circuit-open rejections all map to a
    /// `needs_review=true` decision instead of propagating as errors
    /// (§4.11: "the caller is never expected to catch raw exceptions").
    pub fn classify(&mut self, text: &str, redaction_spans: Vec<(usize, usize)>) -> PolicyDecision {
        let port = self.port;
        let timeout = self.timeout;
        let started = Instant::now();

        let outcome = self.breaker.call(|| {
            let output = port.classify(text)?;
            if started.elapsed() > timeout {
                return Err(Error::Timeout {
                    seconds: timeout.as_secs(),
                });
            }
            Ok(output)
        });

        match outcome {
            Ok(output) => PolicyDecision::new(
                output.labels,
                output.confidence,
                false,
                &output.raw_cot,
                &self.salt,
                redaction_spans,
                self.model_version.clone(),
                self.policy_version.clone(),
                self.reasoning_effort.clone(),
            ),
            Err(e) => PolicyDecision::error(e.to_string(), self.model_version.clone(), self.policy_version.clone()),
        }
    }
}

/// A highlight candidate carrying a confidence score, routed through the
/// escalation policy (§4.11).
pub struct HighlightCandidate<F> {
    pub confidence: f64,
    pub finding: F,
}

/// Apply the escalation policy to a batch of findings: high-confidence
/// findings pass through unchanged, mid-confidence findings are refined
/// via `refine`, low-confidence findings are dropped. A refinement failure
/// falls back to the original finding rather than raising.
pub fn apply_escalation<F: Clone>(
    policy: &EscalationPolicy,
    candidates: Vec<HighlightCandidate<F>>,
    mut refine: impl FnMut(&F) -> Result<F>,
) -> Vec<F> {
    let mut out = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match policy.decide(candidate.confidence) {
            EscalationDecision::Skip => out.push(candidate.finding),
            EscalationDecision::Refine => match refine(&candidate.finding) {
                Ok(refined) => out.push(refined),
                Err(e) => {
                    tracing::warn!(error = %e, "highlight refinement failed, keeping original finding");
                    out.push(candidate.finding);
                }
            },
            EscalationDecision::Discard => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysFailsPort;
    impl ModelPort for AlwaysFailsPort {
        fn classify(&self, _text: &str) -> Result<ModelOutput> {
            Err(Error::ModelOutputMalformed("boom".to_string()))
        }
    }

    struct SucceedsPort;
    impl ModelPort for SucceedsPort {
        fn classify(&self, _text: &str) -> Result<ModelOutput> {
            Ok(ModelOutput {
                labels: vec!["privileged".to_string()],
                confidence: 0.9,
                raw_cot: "the memo discusses attorney advice".to_string(),
            })
        }
    }

    #[test]
    fn failure_maps_to_needs_review_decision_not_an_error() {
        let port = AlwaysFailsPort;
        let mut envelope = ClassifierEnvelope::new(&port, "salt", "model-1", "policy-1", "low");
        let decision = envelope.classify("some text", vec![]);
        assert!(decision.needs_review);
        assert!(decision.labels.is_empty());
        assert!(decision.error_message.is_some());
    }

    #[test]
    fn success_never_carries_raw_cot_in_the_decision() {
        let port = SucceedsPort;
        let mut envelope = ClassifierEnvelope::new(&port, "salt", "model-1", "policy-1", "low");
        let decision = envelope.classify("some text", vec![]);
        assert!(!decision.needs_review);
        assert_eq!(decision.labels, vec!["privileged".to_string()]);
        assert_eq!(decision.reasoning_hash.len(), 64);
    }

    #[test]
    fn circuit_open_after_repeated_failures_short_circuits_further_calls() {
        let port = AlwaysFailsPort;
        let mut envelope = ClassifierEnvelope::new(&port, "salt", "model-1", "policy-1", "low");
        for _ in 0..5 {
            let _ = envelope.classify("x", vec![]);
        }
        let decision = envelope.classify("x", vec![]);
        assert!(decision.error_message.unwrap().contains("circuit breaker"));
    }

    #[test]
    fn escalation_skips_high_confidence_and_refines_mid_confidence() {
        let policy = EscalationPolicy::default();
        let candidates = vec![
            HighlightCandidate { confidence: 0.9, finding: "high".to_string() },
            HighlightCandidate { confidence: 0.6, finding: "mid".to_string() },
            HighlightCandidate { confidence: 0.1, finding: "low".to_string() },
        ];
        let results = apply_escalation(&policy, candidates, |f| Ok(format!("refined:{f}")));
        assert_eq!(results, vec!["high".to_string(), "refined:mid".to_string()]);
    }

    #[test]
    fn escalation_falls_back_to_original_on_refinement_failure() {
        let policy = EscalationPolicy::default();
        let candidates = vec![HighlightCandidate { confidence: 0.6, finding: "mid".to_string() }];
        let results = apply_escalation(&policy, candidates, |_| Err(Error::Timeout { seconds: 1 }));
        assert_eq!(results, vec!["mid".to_string()]);
    }
}
