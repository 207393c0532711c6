//! Tamper-evident append-only audit ledger (C7, §4.5): every mutating
//! operation appends a hash-chained, HMAC-signed entry, with an
//! HMAC-sealed sidecar tracking the current tip.

pub mod entry;
pub mod ledger;
pub mod sidecar;

pub use entry::{AuditEntry, GENESIS_HASH};
pub use ledger::AuditLedger;
pub use sidecar::LedgerSidecar;
