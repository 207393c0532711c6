//! The explicit bootstrap container (§4.14) that replaces any process-wide
//! settings singleton. Constructed once by the caller (the out-of-scope CLI
//! or embedding application) and threaded by reference into every
//! component; nothing in this crate family reads environment variables or a
//! global static directly.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Ambient configuration shared by every pipeline component.
///
/// Crypto key material is deliberately *not* stored here: components that
/// need it (the ledger, the redaction engine, the classifier vault) take a
/// key reference explicitly, so this container stays a plain data value
/// with no dependency on the crypto crate.
#[derive(Debug, Clone)]
pub struct RexlitContext {
    allowed_roots: Vec<PathBuf>,
    online: bool,
    producer: String,
}

impl RexlitContext {
    pub fn builder() -> RexlitContextBuilder {
        RexlitContextBuilder::default()
    }

    pub fn allowed_roots(&self) -> &[PathBuf] {
        &self.allowed_roots
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn producer(&self) -> &str {
        &self.producer
    }

    /// Resolve `path` (following symlinks) and verify containment in at
    /// least one allowed root (§4.3). Returns the canonicalized path.
    pub fn resolve_contained(&self, path: &Path) -> Result<PathBuf> {
        let resolved = path.canonicalize().map_err(Error::Io)?;
        let contained = self
            .allowed_roots
            .iter()
            .filter_map(|root| root.canonicalize().ok())
            .any(|root| resolved.starts_with(&root));
        if !contained {
            return Err(Error::PathTraversal {
                path: path.display().to_string(),
            });
        }
        Ok(resolved)
    }

    /// Process-wide online/offline gate (§4.3). Returns
    /// `OfflineFeatureRequired` when `feature` needs online mode but the
    /// context is offline.
    pub fn require_online(&self, feature: &str) -> Result<()> {
        if self.online {
            Ok(())
        } else {
            Err(Error::OfflineFeatureRequired {
                feature: feature.to_string(),
            })
        }
    }
}

/// Builder for [`RexlitContext`]; validated once at `build()`.
#[derive(Debug, Default)]
pub struct RexlitContextBuilder {
    allowed_roots: Vec<PathBuf>,
    online: bool,
    producer: Option<String>,
}

impl RexlitContextBuilder {
    pub fn allowed_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.allowed_roots.push(root.into());
        self
    }

    pub fn online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    pub fn producer(mut self, producer: impl Into<String>) -> Self {
        self.producer = Some(producer.into());
        self
    }

    pub fn build(self) -> Result<RexlitContext> {
        if self.allowed_roots.is_empty() {
            return Err(Error::NotFound("no allowed roots configured".to_string()));
        }
        Ok(RexlitContext {
            allowed_roots: self.allowed_roots,
            online: self.online,
            producer: self.producer.unwrap_or_else(|| "rexlit-0.1.0".to_string()),
        })
    }
}
