//! Deterministic document ordering and family grouping (§4.4).

use std::collections::BTreeMap;

/// Anything that can report the two keys canonical ordering sorts on.
pub trait Ordered {
    fn sha256(&self) -> &str;
    fn path(&self) -> &str;
    /// `thread_id`/`family_id`/`conversation_id`, falling back to the
    /// document's own `sha256` when none is present.
    fn family_key(&self) -> String;
}

/// Sort `records` ascending by `(sha256, path)`. Stable: records comparing
/// equal on both keys keep their relative input order.
pub fn canonical_order<T: Ordered>(mut records: Vec<T>) -> Vec<T> {
    records.sort_by(|a, b| a.sha256().cmp(b.sha256()).then_with(|| a.path().cmp(b.path())));
    records
}

/// Partition `records` by family key, sort family keys ascending, and within
/// each family apply canonical ordering. Returns families in that order as
/// `(family_key, members)` pairs.
pub fn family_grouped_order<T: Ordered>(records: Vec<T>) -> Vec<(String, Vec<T>)> {
    let mut families: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for record in records {
        families.entry(record.family_key()).or_default().push(record);
    }
    families
        .into_iter()
        .map(|(key, members)| (key, canonical_order(members)))
        .collect()
}
