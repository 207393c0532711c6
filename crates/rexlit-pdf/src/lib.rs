//! Bates stamp layout math and PDF content-stream edits (C13).

pub mod layout;
pub mod redact;
pub mod stamp;

pub use layout::{label_box, label_box_size, safe_area, Corner, Rect, SAFE_AREA_INSET_PT};
pub use redact::{apply_redactions, PdfRedactionAction};
pub use stamp::{dry_run, stamp, PageStamp, StampPreview, StampRequest, StampResult};
