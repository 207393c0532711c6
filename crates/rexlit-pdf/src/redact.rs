//! Apply redactions over glyph positions in a PDF (§4.9 `apply_redactions`).
//!
//! Text position tracking here is a deliberately approximate reconstruction
//! from `Td` translations since the last `BT`: good enough to place an
//! opaque box over a matched run of text, not a full text-layout engine.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object};

use rexlit_common::error::{Error, Result};

/// A transient, never-persisted redaction request resolved at apply time:
/// the plan on disk never carries raw text (§4.7), so callers re-extract
/// `text` from the source document just before calling this.
#[derive(Debug, Clone)]
pub struct PdfRedactionAction {
    pub page: Option<u32>,
    pub text: String,
}

const DEFAULT_FONT_SIZE: f64 = 10.0;

/// Overwrite the bounding box of each matched run of text with an opaque
/// black rectangle. Actions with an explicit `page` are applied only
/// there; others scan every page for the first match. Actions naming a
/// page outside the document are skipped and excluded from the count.
/// `output` is always written, even if no action matched.
pub fn apply_redactions(input: &Path, output: &Path, actions: &[PdfRedactionAction]) -> Result<u32> {
    let mut doc = Document::load(input).map_err(|e| Error::InvalidFormat(e.to_string()))?;
    let pages = doc.get_pages();
    let max_page = pages.keys().copied().max().unwrap_or(0);

    let mut applied = 0u32;
    for action in actions {
        if let Some(requested) = action.page {
            if requested == 0 || requested > max_page {
                continue; // invalid page, skipped
            }
        }

        let candidate_pages: Vec<u32> = match action.page {
            Some(p) => vec![p],
            None => pages.keys().copied().collect(),
        };

        for page_num in candidate_pages {
            let Some(&page_id) = pages.get(&page_num) else { continue };
            let Ok(existing) = doc.get_page_content(page_id) else { continue };
            let Ok(mut content) = Content::decode(&existing) else { continue };

            if let Some(rect) = find_and_mask(&mut content, &action.text) {
                let _ = rect;
                if let Ok(encoded) = content.encode() {
                    if doc.change_page_content(page_id, encoded).is_ok() {
                        applied += 1;
                        break; // first match only, per action
                    }
                }
            }
        }
    }

    doc.save(output).map_err(Error::Io)?;
    Ok(applied)
}

/// Walk `content`'s operations tracking an approximate text-insertion point
/// since the last `BT`; on finding `needle` in a `Tj`/`TJ` operand, insert a
/// black-fill rectangle covering the estimated run immediately after it.
/// Returns the estimated rectangle `(x, y, w, h)` on success.
fn find_and_mask(content: &mut Content, needle: &str) -> Option<(f64, f64, f64, f64)> {
    let mut cursor_x = 0.0;
    let mut cursor_y = 0.0;
    let mut insert_at: Option<usize> = None;
    let mut rect = None;

    for (idx, op) in content.operations.iter().enumerate() {
        match op.operator.as_str() {
            "BT" => {
                cursor_x = 0.0;
                cursor_y = 0.0;
            }
            "Td" | "TD" => {
                if let (Some(tx), Some(ty)) = (operand_f64(op, 0), operand_f64(op, 1)) {
                    cursor_x += tx;
                    cursor_y += ty;
                }
            }
            "Tj" => {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    let text = String::from_utf8_lossy(bytes);
                    if text.contains(needle) {
                        let width = DEFAULT_FONT_SIZE * 0.5 * needle.chars().count() as f64;
                        rect = Some((cursor_x, cursor_y, width, DEFAULT_FONT_SIZE * 1.2));
                        insert_at = Some(idx + 1);
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    let (x, y, w, h) = rect?;
    let insertion = insert_at?;
    let mask_ops = vec![
        Operation::new("q", vec![]),
        Operation::new("0 0 0 rg", vec![]),
        Operation::new("re", vec![x.into(), y.into(), w.into(), h.into()]),
        Operation::new("f", vec![]),
        Operation::new("Q", vec![]),
    ];
    for (offset, op) in mask_ops.into_iter().enumerate() {
        content.operations.insert(insertion + offset, op);
    }
    Some((x, y, w, h))
}

fn operand_f64(op: &Operation, index: usize) -> Option<f64> {
    op.operands.get(index).and_then(|o| match o {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(*f as f64),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Dictionary, Stream};

    fn pdf_with_text(text: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut page_dict = Dictionary::new();
        page_dict.set("Type", Object::Name(b"Page".to_vec()));
        page_dict.set("Parent", Object::Reference(pages_id));
        page_dict.set(
            "MediaBox",
            Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
        );

        let mut content = Content { operations: vec![] };
        content.operations.push(Operation::new("BT", vec![]));
        content.operations.push(Operation::new("Td", vec![72.into(), 700.into()]));
        content
            .operations
            .push(Operation::new("Tj", vec![Object::string_literal(text)]));
        content.operations.push(Operation::new("ET", vec![]));
        let encoded = content.encode().unwrap();

        let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));
        page_dict.set("Contents", Object::Reference(content_id));
        let page_id = doc.add_object(Object::Dictionary(page_dict));

        let mut pages_dict = Dictionary::new();
        pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
        pages_dict.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
        pages_dict.set("Count", Object::Integer(1));
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let mut catalog_dict = Dictionary::new();
        catalog_dict.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog_dict.set("Pages", Object::Reference(pages_id));
        let catalog_id = doc.add_object(Object::Dictionary(catalog_dict));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).expect("save pdf with text");
        bytes
    }

    #[test]
    fn applies_redaction_for_matching_text() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        let output = dir.path().join("out.pdf");
        std::fs::write(&input, pdf_with_text("SSN 123-45-6789 on file")).unwrap();

        let actions = vec![PdfRedactionAction {
            page: Some(1),
            text: "123-45-6789".to_string(),
        }];
        let count = apply_redactions(&input, &output, &actions).unwrap();
        assert_eq!(count, 1);
        assert!(output.exists());
    }

    #[test]
    fn invalid_page_is_skipped_not_counted() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        let output = dir.path().join("out.pdf");
        std::fs::write(&input, pdf_with_text("nothing sensitive")).unwrap();

        let actions = vec![PdfRedactionAction {
            page: Some(99),
            text: "anything".to_string(),
        }];
        let count = apply_redactions(&input, &output, &actions).unwrap();
        assert_eq!(count, 0);
        assert!(output.exists());
    }

    #[test]
    fn no_match_produces_zero_count_but_still_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        let output = dir.path().join("out.pdf");
        std::fs::write(&input, pdf_with_text("hello world")).unwrap();

        let actions = vec![PdfRedactionAction {
            page: Some(1),
            text: "not present".to_string(),
        }];
        let count = apply_redactions(&input, &output, &actions).unwrap();
        assert_eq!(count, 0);
        assert!(output.exists());
    }
}
