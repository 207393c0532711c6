//! Atomic JSONL writer (C4): the substrate every stamped artifact is
//! persisted through.

pub mod writer;

pub use writer::{append_line_fsync, read_lines, write_json_atomic, write_jsonl_atomic};
