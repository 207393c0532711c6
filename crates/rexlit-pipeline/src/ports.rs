//! Port contracts for every external collaborator the pipeline calls
//! through: CLI/config layer, text/PDF extraction, OCR, PII/LLM analysis,
//! the search index, the embedding model, and the packaging writer. Each is
//! a narrow trait; the orchestrator is wired at bootstrap with whichever
//! implementation the caller supplies, never probing for one at the call
//! site (§4.14).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rexlit_common::error::Result;
use rexlit_discovery::DocumentRecord;
use rexlit_redact::{Highlight, Match};

/// Flat file/JSONL I/O, abstracted so the pipeline can run against a
/// sandboxed or remote backing store instead of the local filesystem.
pub trait Storage {
    fn read_text(&self, path: &Path) -> Result<String>;
    fn write_text(&self, path: &Path, content: &str) -> Result<()>;
    fn read_jsonl(&self, path: &Path) -> Result<Vec<String>>;
    fn write_jsonl(&self, path: &Path, lines: &[String]) -> Result<()>;
    fn list_files(&self, root: &Path) -> Result<Vec<PathBuf>>;
    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()>;
    fn compute_hash(&self, path: &Path) -> Result<String>;
}

/// Local filesystem `Storage` adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

impl Storage for LocalStorage {
    fn read_text(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(rexlit_common::error::Error::Io)
    }

    fn write_text(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(rexlit_common::error::Error::Io)?;
        }
        std::fs::write(path, content).map_err(rexlit_common::error::Error::Io)
    }

    fn read_jsonl(&self, path: &Path) -> Result<Vec<String>> {
        rexlit_jsonl::read_lines(path)
    }

    fn write_jsonl(&self, path: &Path, lines: &[String]) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(rexlit_common::error::Error::Io)?;
        }
        std::fs::write(path, lines.join("\n") + "\n").map_err(rexlit_common::error::Error::Io)
    }

    fn list_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        rexlit_paths::walk_tree(root, &rexlit_paths::ExtensionFilter::default())
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()> {
        if let Some(dir) = dst.parent() {
            std::fs::create_dir_all(dir).map_err(rexlit_common::error::Error::Io)?;
        }
        std::fs::copy(src, dst).map_err(rexlit_common::error::Error::Io)?;
        Ok(())
    }

    fn compute_hash(&self, path: &Path) -> Result<String> {
        rexlit_common::hash::sha256_file(path)
    }
}

/// Document discovery (C8).
pub trait Discovery {
    fn stream(&self, root: &Path, filter: &rexlit_paths::ExtensionFilter) -> Result<Vec<DocumentRecord>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDiscovery;

impl Discovery for DefaultDiscovery {
    fn stream(&self, root: &Path, filter: &rexlit_paths::ExtensionFilter) -> Result<Vec<DocumentRecord>> {
        rexlit_discovery::discover(root, filter)
    }
}

/// Hash-keyed dedup (C9).
pub trait Dedup {
    fn dedup(&self, records: Vec<DocumentRecord>) -> Result<Vec<DocumentRecord>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDedup;

impl Dedup for DefaultDedup {
    fn dedup(&self, records: Vec<DocumentRecord>) -> Result<Vec<DocumentRecord>> {
        Ok(rexlit_discovery::dedup(records))
    }
}

/// Dedup that fails hard on any repeated hash, for callers with no
/// configured deduper (§4.6).
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictDedup;

impl Dedup for StrictDedup {
    fn dedup(&self, records: Vec<DocumentRecord>) -> Result<Vec<DocumentRecord>> {
        rexlit_discovery::require_no_duplicates(records)
    }
}

/// Text extraction from native/scanned documents. `is_online` reports
/// whether the adapter needs network access (cloud OCR) before a pipeline
/// run tries to use it against an offline context.
pub trait Ocr {
    fn is_online(&self) -> bool;
    fn process_document(&self, record: &DocumentRecord) -> Result<String>;
}

/// Regex/keyword PII analysis (C12) over already-extracted text.
pub trait Pii {
    fn analyze_document(&self, text: &str) -> Vec<Match>;
}

impl Pii for rexlit_redact::PiiDetector {
    fn analyze_document(&self, text: &str) -> Vec<Match> {
        self.find_all(text)
    }
}

/// PDF content-stream operations (C13).
pub trait PdfStamper {
    fn stamp(&self, input: &Path, output: &Path, request: &rexlit_pdf::StampRequest) -> Result<rexlit_pdf::StampResult>;
    fn apply_redactions(
        &self,
        input: &Path,
        output: &Path,
        actions: &[rexlit_pdf::PdfRedactionAction],
    ) -> Result<u32>;
    fn get_page_count(&self, path: &Path) -> Result<u32>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPdfStamper;

impl PdfStamper for DefaultPdfStamper {
    fn stamp(&self, input: &Path, output: &Path, request: &rexlit_pdf::StampRequest) -> Result<rexlit_pdf::StampResult> {
        rexlit_pdf::stamp(input, output, request)
    }

    fn apply_redactions(
        &self,
        input: &Path,
        output: &Path,
        actions: &[rexlit_pdf::PdfRedactionAction],
    ) -> Result<u32> {
        rexlit_pdf::apply_redactions(input, output, actions)
    }

    fn get_page_count(&self, path: &Path) -> Result<u32> {
        let preview = rexlit_pdf::dry_run(path, &rexlit_pdf::StampRequest::default())?;
        Ok(preview.page_count)
    }
}

/// Lexical/dense search index lifecycle (C14).
pub trait Index {
    fn build(&mut self, index_dir: &Path, records: &[DocumentRecord]) -> Result<usize>;
    fn search(&self, index_dir: &Path, query: &str, limit: usize) -> Result<Vec<rexlit_search::SearchResult>>;
    fn commit(&mut self) -> Result<()>;
}

/// Text embedding for dense search, reporting call latency/usage so
/// callers can budget online-mode spend.
pub trait Embedder {
    fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Privilege/concept classification over a document or raw text (C15).
pub trait Concept {
    fn analyze_text(&self, text: &str) -> rexlit_classifier::PolicyDecision;
    fn analyze_document(&self, record: &DocumentRecord, text: &str) -> rexlit_classifier::PolicyDecision;
    fn refine_findings(&self, findings: Vec<Highlight>) -> Result<Vec<Highlight>>;
}

/// Privilege-specific classification call (C15), distinct from the general
/// concept port so a caller can wire a dedicated privilege model.
pub trait PrivilegeReasoning {
    fn classify_privilege(&self, text: &str) -> rexlit_classifier::PolicyDecision;
}

/// Append-only audit trail (C7).
pub trait Ledger {
    fn append(
        &mut self,
        operation: &str,
        inputs: Vec<String>,
        outputs: Vec<String>,
        args: HashMap<String, serde_json::Value>,
    ) -> Result<()>;
}

impl Ledger for rexlit_ledger::AuditLedger {
    fn append(
        &mut self,
        operation: &str,
        inputs: Vec<String>,
        outputs: Vec<String>,
        args: HashMap<String, serde_json::Value>,
    ) -> Result<()> {
        self.append(operation, inputs, outputs, args, HashMap::new())?;
        Ok(())
    }
}

/// HMAC signing for ledger entries and bates/pack manifests (C2).
pub trait Signer {
    fn sign(&self, data: &[u8]) -> Result<String>;
    fn verify(&self, data: &[u8], signature: &str) -> Result<bool>;
}

impl Signer for rexlit_crypto::KeyMaterial {
    fn sign(&self, data: &[u8]) -> Result<String> {
        rexlit_crypto::hmac_sign::sign(self, data)
    }

    fn verify(&self, data: &[u8], signature: &str) -> Result<bool> {
        rexlit_crypto::hmac_sign::verify(self, data, signature)
    }
}

/// Deterministic ZIP packaging and load-file export (C17).
pub trait Packager {
    fn create_pack(
        &self,
        input: &Path,
        output: &Path,
        options: &rexlit_pack::PackOptions,
    ) -> Result<rexlit_pack::PackManifest>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPackager;

impl Packager for DefaultPackager {
    fn create_pack(
        &self,
        input: &Path,
        output: &Path,
        options: &rexlit_pack::PackOptions,
    ) -> Result<rexlit_pack::PackManifest> {
        rexlit_pack::create_pack(input, output, options)
    }
}
