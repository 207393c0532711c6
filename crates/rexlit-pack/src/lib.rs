//! Deterministic production packaging (§4.13): assemble a `natives/` +
//! `text/` + `metadata/` package from processed documents, validate it
//! later, and render DAT/Opticon load files from it or directly from a
//! Bates-stamping manifest.

pub mod create;
pub mod loadfile;
pub mod manifest;
pub mod production;
pub mod validate;

pub use create::{create_pack, PackOptions};
pub use loadfile::export_load_file;
pub use manifest::PackManifest;
pub use production::{create_production, ProductionResult};
pub use validate::{validate_pack, validate_pack_report};
