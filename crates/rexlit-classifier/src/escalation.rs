//! Escalation policy for highlight refinement (§4.11): high-confidence
//! findings skip the refinement port; low-confidence ones never reach it
//! either, since they're not worth the extra model call; only the
//! in-between band gets refined.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationDecision {
    Skip,
    Refine,
    Discard,
}

#[derive(Debug, Clone, Copy)]
pub struct EscalationPolicy {
    pub escalate_threshold: f64,
    pub skip_threshold: f64,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        EscalationPolicy {
            escalate_threshold: 0.50,
            skip_threshold: 0.85,
        }
    }
}

impl EscalationPolicy {
    pub fn decide(&self, confidence: f64) -> EscalationDecision {
        if confidence >= self.skip_threshold {
            EscalationDecision::Skip
        } else if confidence >= self.escalate_threshold {
            EscalationDecision::Refine
        } else {
            EscalationDecision::Discard
        }
    }
}
