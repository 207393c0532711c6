//! Atomic persistence of a `BatesPlan` as `bates_map` JSONL (§4.8 step 4).

use std::path::Path;

use rexlit_common::error::Result;
use rexlit_jsonl::write_jsonl_atomic;

use crate::plan::{BatesAssignment, BatesPlan};

/// Write every assignment as one JSONL line. There is no partial plan on
/// disk: the whole plan is computed and validated before this is called.
pub fn write_bates_plan(path: &Path, plan: &BatesPlan) -> Result<()> {
    write_jsonl_atomic(path, &plan.assignments)
}

pub fn read_bates_plan(path: &Path) -> Result<Vec<BatesAssignment>> {
    rexlit_jsonl::read_lines(path)?
        .into_iter()
        .map(|line| serde_json::from_str(&line).map_err(rexlit_common::error::Error::Json))
        .collect()
}
