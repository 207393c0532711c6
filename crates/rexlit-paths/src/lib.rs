//! Symlink-safe recursive directory traversal (C5/C8) underlying document
//! discovery. Single-path containment checks against a bootstrap context
//! live on `RexlitContext` in `rexlit-common`; this crate owns only the
//! walk itself.

pub mod walk;

pub use walk::{walk_tree, ExtensionFilter};
