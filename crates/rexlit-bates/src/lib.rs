//! Sequential Bates numbering (C11).

pub mod plan;
pub mod store;

pub use plan::{format_bates_id, plan, plan_with_families, BatesAssignment, BatesPlan};
pub use store::{read_bates_plan, write_bates_plan};
