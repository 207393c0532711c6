//! Canonical JSON serialization and the sorted-join fingerprint primitive
//! used by plan_id computation and content-hash stamping.

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::hash::sha256_bytes;

/// Serialize `value` as canonical JSON: object keys sorted, compact
/// separators, UTF-8, no trailing whitespace.
///
/// Relies on `serde_json::Value`'s map being a `BTreeMap` (the default
/// without the `preserve_order` feature), so round-tripping any
/// `Serialize` type through `Value` yields alphabetically sorted keys.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let as_value: Value = serde_json::to_value(value).map_err(Error::Json)?;
    serde_json::to_string(&as_value).map_err(Error::Json)
}

/// SHA-256 fingerprint over a set of string components: the components are
/// sorted lexicographically, newline-joined, then hashed. This ordering is
/// load-bearing — it is what makes `plan_id` stable regardless of the
/// order components happen to be assembled in.
pub fn sorted_join_hash(components: &[String]) -> String {
    let mut sorted = components.to_vec();
    sorted.sort();
    let joined = sorted.join("\n");
    sha256_bytes(joined.as_bytes())
}
