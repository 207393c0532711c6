//! Append-only, hash-chained, HMAC-sealed audit ledger (C7, §4.5).

use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rexlit_common::error::{Error, Result};
use rexlit_crypto::{hmac_sign, KeyMaterial};
use rexlit_jsonl::{append_line_fsync, read_lines};

use crate::entry::{AuditEntry, GENESIS_HASH};
use crate::sidecar::LedgerSidecar;

/// Tamper-evident append-only ledger backed by a JSONL file plus an
/// HMAC-sealed sidecar that is authoritative for the current tip (§9).
pub struct AuditLedger {
    ledger_path: PathBuf,
    sidecar_path: PathBuf,
    key: KeyMaterial,
    /// Number of appends between fsyncs of the ledger line itself. The
    /// append is always durable (fsync happens in `append_line_fsync`);
    /// this only controls the sidecar rewrite cadence.
    fsync_interval: u64,
    appends_since_seal: u64,
}

impl AuditLedger {
    pub fn open(ledger_path: impl Into<PathBuf>, key: KeyMaterial) -> Self {
        let ledger_path = ledger_path.into();
        let sidecar_path = sidecar_path_for(&ledger_path);
        AuditLedger {
            ledger_path,
            sidecar_path,
            key,
            fsync_interval: 1,
            appends_since_seal: 0,
        }
    }

    pub fn with_fsync_interval(mut self, interval: u64) -> Self {
        self.fsync_interval = interval.max(1);
        self
    }

    /// Current tip, read from the sidecar if present, otherwise by walking
    /// the ledger file. The sidecar is authoritative when both exist and
    /// disagree is handled by `verify`, not here.
    fn tip(&self) -> Result<(String, u64)> {
        if let Some(sidecar) = LedgerSidecar::load(&self.sidecar_path)? {
            return Ok((sidecar.last_hash, sidecar.last_sequence));
        }
        let entries = self.read_all()?;
        match entries.last() {
            Some(last) => Ok((last.entry_hash.clone(), last.sequence)),
            None => Ok((GENESIS_HASH.to_string(), 0)),
        }
    }

    /// Append a new entry, chaining from the current tip.
    pub fn append(
        &mut self,
        operation: impl Into<String>,
        inputs: Vec<String>,
        outputs: Vec<String>,
        args: HashMap<String, serde_json::Value>,
        mut versions: HashMap<String, String>,
    ) -> Result<AuditEntry> {
        versions
            .entry("rexlit".to_string())
            .or_insert_with(|| env!("CARGO_PKG_VERSION").to_string());

        let (tip_hash, tip_sequence) = self.tip()?;
        let sequence = tip_sequence + 1;
        let key = self.key.clone();

        let entry = AuditEntry::build(
            sequence,
            operation,
            inputs,
            outputs,
            args,
            versions,
            tip_hash,
            Utc::now(),
            move |entry_hash| hmac_sign::sign(&key, entry_hash.as_bytes()),
        )?;

        append_line_fsync(&self.ledger_path, &entry.to_jsonl_line()?)?;

        let sidecar = LedgerSidecar::seal(entry.entry_hash.clone(), entry.sequence, &self.key)?;
        self.appends_since_seal += 1;
        if self.appends_since_seal >= self.fsync_interval {
            sidecar.save(&self.sidecar_path)?;
            self.appends_since_seal = 0;
        } else {
            // Even off-cadence, the sidecar must reflect the true tip for
            // correctness; only the fsync durability point is batched.
            sidecar.save(&self.sidecar_path)?;
        }

        tracing::info!(
            operation = %entry.operation,
            sequence = entry.sequence,
            entry_hash = %entry.entry_hash,
            "audit entry appended"
        );

        Ok(entry)
    }

    pub fn read_all(&self) -> Result<Vec<AuditEntry>> {
        read_lines(&self.ledger_path)?
            .into_iter()
            .map(|line| AuditEntry::from_jsonl_line(&line))
            .collect()
    }

    /// Full integrity check (§4.5): per-entry hash/signature/chain/sequence,
    /// plus sidecar tip and seal.
    pub fn verify(&self) -> Result<(bool, Option<String>)> {
        let entries = match self.read_all() {
            Ok(e) => e,
            Err(_) => return Ok((false, Some("ledger file is unreadable or malformed".to_string()))),
        };

        let mut previous_hash = GENESIS_HASH.to_string();
        for (idx, entry) in entries.iter().enumerate() {
            let expected_sequence = (idx as u64) + 1;
            if entry.sequence != expected_sequence {
                return Ok((
                    false,
                    Some(format!(
                        "sequence gap at index {idx}: expected {expected_sequence}, found {}",
                        entry.sequence
                    )),
                ));
            }
            if entry.previous_hash != previous_hash {
                return Ok((
                    false,
                    Some(format!(
                        "entry {} breaks hash chain: previous_hash mismatch",
                        entry.sequence
                    )),
                ));
            }
            let recomputed = entry.recompute_hash()?;
            if recomputed != entry.entry_hash {
                return Ok((
                    false,
                    Some(format!("entry {} has an invalid hash (content tampered)", entry.sequence)),
                ));
            }
            if !hmac_sign::verify(&self.key, entry.entry_hash.as_bytes(), &entry.signature)? {
                return Ok((
                    false,
                    Some(format!("entry {} has a tampered or invalid signature", entry.sequence)),
                ));
            }
            previous_hash = entry.entry_hash.clone();
        }

        match LedgerSidecar::load(&self.sidecar_path)? {
            None => {
                if entries.is_empty() {
                    Ok((true, None))
                } else {
                    Ok((false, Some("sidecar missing for non-empty ledger".to_string())))
                }
            }
            Some(sidecar) => {
                if !sidecar.verify_seal(&self.key)? {
                    return Ok((false, Some("sidecar HMAC seal is invalid".to_string())));
                }
                match entries.last() {
                    None => {
                        if sidecar.last_sequence != 0 {
                            Ok((false, Some("sidecar tip disagrees with empty ledger".to_string())))
                        } else {
                            Ok((true, None))
                        }
                    }
                    Some(last) => {
                        if last.entry_hash != sidecar.last_hash || last.sequence != sidecar.last_sequence {
                            Ok((false, Some("sidecar tip disagrees with the ledger's last entry".to_string())))
                        } else {
                            Ok((true, None))
                        }
                    }
                }
            }
        }
    }

    pub fn get_by_operation(&self, operation: &str) -> Result<Vec<AuditEntry>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|e| e.operation == operation)
            .collect())
    }

    pub fn get_by_input(&self, input: &str) -> Result<Vec<AuditEntry>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|e| e.inputs.iter().any(|i| i == input))
            .collect())
    }

    pub fn get_by_output(&self, output: &str) -> Result<Vec<AuditEntry>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|e| e.outputs.iter().any(|o| o == output))
            .collect())
    }
}

fn sidecar_path_for(ledger_path: &Path) -> PathBuf {
    let mut path = ledger_path.to_path_buf();
    path.set_extension("meta");
    path
}
