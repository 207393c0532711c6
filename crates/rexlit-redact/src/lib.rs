//! PII detection (C12) and the encrypted redaction/highlight plan store
//! (C10).

pub mod pii;
pub mod plan;
pub mod store;

pub use pii::{EntityType, Match, PiiDetector};
pub use plan::{Highlight, HighlightPlanEntry, RedactionAction, RedactionPlanEntry};
pub use store::{load_highlight_plan, load_redaction_plan, write_highlight_plan, write_redaction_plan};
