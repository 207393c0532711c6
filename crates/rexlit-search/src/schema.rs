//! Tantivy schema for the lexical index (§4.10).

use tantivy::schema::{Schema, SchemaBuilder, STORED, STRING, TEXT};

pub const FIELD_PATH: &str = "path";
pub const FIELD_SHA256: &str = "sha256";
pub const FIELD_CUSTODIAN: &str = "custodian";
pub const FIELD_DOCTYPE: &str = "doctype";
pub const FIELD_BODY: &str = "body";
pub const FIELD_METADATA: &str = "metadata";

/// `path`, `sha256`, `custodian`, `doctype`, `metadata` are stored; `body`
/// is indexed full-text but never stored, since raw document content has no
/// business living inside the index snapshot.
pub fn build_schema() -> Schema {
    let mut builder: SchemaBuilder = Schema::builder();
    builder.add_text_field(FIELD_PATH, STRING | STORED);
    builder.add_text_field(FIELD_SHA256, STRING | STORED);
    builder.add_text_field(FIELD_CUSTODIAN, STRING | STORED);
    builder.add_text_field(FIELD_DOCTYPE, STRING | STORED);
    builder.add_text_field(FIELD_BODY, TEXT);
    builder.add_text_field(FIELD_METADATA, STRING | STORED);
    builder.build()
}

/// A single document destined for the lexical index.
#[derive(Debug, Clone)]
pub struct SearchDocument {
    pub path: String,
    pub sha256: String,
    pub custodian: String,
    pub doctype: String,
    pub body: String,
    pub metadata_blob: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_has_expected_fields() {
        let schema = build_schema();
        for name in [
            FIELD_PATH,
            FIELD_SHA256,
            FIELD_CUSTODIAN,
            FIELD_DOCTYPE,
            FIELD_BODY,
            FIELD_METADATA,
        ] {
            assert!(schema.get_field(name).is_ok(), "missing field {name}");
        }
    }
}
