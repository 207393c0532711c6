//! Bates stamping over a PDF's pages (§4.9 `stamp`/`dry_run`).

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId};

use rexlit_bates::format_bates_id;
use rexlit_common::error::{Error, Result};

use crate::layout::{label_box, safe_area, Corner, Rect};

const DEFAULT_PAGE_WIDTH: f64 = 612.0;
const DEFAULT_PAGE_HEIGHT: f64 = 792.0;
const STAMP_FONT_RESOURCE: &str = "RXStamp";
const BG_PADDING_PT: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct StampRequest {
    pub prefix: String,
    pub width: usize,
    pub separator: String,
    pub start_index: u64,
    pub font_size: f64,
    pub corner: Corner,
    pub background: bool,
}

impl Default for StampRequest {
    fn default() -> Self {
        StampRequest {
            prefix: "BATES".to_string(),
            width: 6,
            separator: "-".to_string(),
            start_index: 1,
            font_size: 10.0,
            corner: Corner::BottomRight,
            background: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageStamp {
    pub page: u32,
    pub label: String,
    pub rect: Rect,
}

#[derive(Debug, Clone)]
pub struct StampResult {
    pub start_label: String,
    pub end_label: String,
    pub page_count: u32,
    pub pages: Vec<PageStamp>,
}

#[derive(Debug, Clone)]
pub struct StampPreview {
    pub page_count: u32,
    pub labels: Vec<String>,
}

/// Preview the labels and page count a `stamp` call would produce, without
/// touching the file (§4.9 `dry_run`).
pub fn dry_run(path: &Path, request: &StampRequest) -> Result<StampPreview> {
    let doc = Document::load(path).map_err(|e| Error::InvalidFormat(e.to_string()))?;
    let pages = doc.get_pages();
    let page_count = pages.len() as u32;
    let preview_count = page_count.min(5) as u64;
    let labels = (0..preview_count)
        .map(|i| format_bates_id(&request.prefix, &request.separator, request.width, request.start_index + i))
        .collect();
    Ok(StampPreview { page_count, labels })
}

/// Stamp every page of `input`, writing the result to `output`.
pub fn stamp(input: &Path, output: &Path, request: &StampRequest) -> Result<StampResult> {
    let mut doc = Document::load(input).map_err(|e| Error::InvalidFormat(e.to_string()))?;
    let pages: BTreeMap<u32, ObjectId> = doc.get_pages();

    let font_id = ensure_stamp_font(&mut doc);
    let mut page_stamps = Vec::with_capacity(pages.len());

    for (offset, (&page_num, &page_id)) in pages.iter().enumerate() {
        let label = format_bates_id(
            &request.prefix,
            &request.separator,
            request.width,
            request.start_index + offset as u64,
        );
        let (page_width, page_height) = page_dimensions(&doc, page_id);
        let safe = safe_area(page_width, page_height);
        let rect = label_box(&safe, request.corner, request.font_size, label.chars().count());

        ensure_font_resource(&mut doc, page_id, font_id);
        append_stamp_operations(&mut doc, page_id, &label, &rect, request)?;

        page_stamps.push(PageStamp {
            page: page_num,
            label,
            rect,
        });
    }

    doc.save(output).map_err(Error::Io)?;

    let start_label = page_stamps.first().map(|p| p.label.clone()).unwrap_or_default();
    let end_label = page_stamps.last().map(|p| p.label.clone()).unwrap_or_default();
    let page_count = page_stamps.len() as u32;

    tracing::info!(start_label = %start_label, end_label = %end_label, page_count, "bates stamping complete");

    Ok(StampResult {
        start_label,
        end_label,
        page_count,
        pages: page_stamps,
    })
}

/// Resolve a page's effective `MediaBox`, walking the `Parent` chain since
/// the box is commonly inherited from the page tree root. Falls back to US
/// Letter when neither the page nor any ancestor declares one.
fn page_dimensions(doc: &Document, page_id: ObjectId) -> (f64, f64) {
    let mut current = Some(page_id);
    let mut guard = 0;
    while let Some(id) = current {
        guard += 1;
        if guard > 32 {
            break;
        }
        let Ok(object) = doc.get_object(id) else { break };
        let Ok(dict) = object.as_dict() else { break };
        if let Ok(media_box) = dict.get(b"MediaBox").and_then(Object::as_array) {
            if media_box.len() == 4 {
                let nums: Vec<f64> = media_box.iter().filter_map(|o| o.as_float().ok().map(f64::from)).collect();
                if nums.len() == 4 {
                    return ((nums[2] - nums[0]).abs(), (nums[3] - nums[1]).abs());
                }
            }
        }
        current = dict
            .get(b"Parent")
            .ok()
            .and_then(|o| o.as_reference().ok());
    }
    (DEFAULT_PAGE_WIDTH, DEFAULT_PAGE_HEIGHT)
}

fn ensure_stamp_font(doc: &mut Document) -> ObjectId {
    let mut font_dict = Dictionary::new();
    font_dict.set("Type", Object::Name(b"Font".to_vec()));
    font_dict.set("Subtype", Object::Name(b"Type1".to_vec()));
    font_dict.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    doc.add_object(Object::Dictionary(font_dict))
}

/// Bind the stamp font under `STAMP_FONT_RESOURCE` in the page's (possibly
/// inherited, possibly indirect) `/Resources /Font` dictionary.
fn ensure_font_resource(doc: &mut Document, page_id: ObjectId, font_id: ObjectId) {
    let resources_id = match resolve_resources_id(doc, page_id) {
        Some(id) => id,
        None => return,
    };

    if let Some(Object::Dictionary(resources)) = doc.objects.get_mut(&resources_id) {
        let mut fonts = resources
            .get(b"Font")
            .ok()
            .and_then(|o| o.as_dict().ok())
            .cloned()
            .unwrap_or_default();
        fonts.set(STAMP_FONT_RESOURCE, Object::Reference(font_id));
        resources.set("Font", Object::Dictionary(fonts));
    }
}

/// Return the object id holding the page's `/Resources` dictionary,
/// creating one on the page itself if neither it nor any ancestor has one.
fn resolve_resources_id(doc: &mut Document, page_id: ObjectId) -> Option<ObjectId> {
    let mut current = Some(page_id);
    let mut guard = 0;
    while let Some(id) = current {
        guard += 1;
        if guard > 32 {
            break;
        }
        let dict = doc.get_object(id).ok()?.as_dict().ok()?.clone();
        match dict.get(b"Resources") {
            Ok(Object::Reference(r)) => return Some(*r),
            Ok(Object::Dictionary(_)) => {
                // Embedded directly in the page; promote to an indirect
                // object so we can mutate it through `doc.objects`.
                let resources = dict.get(b"Resources").unwrap().as_dict().ok()?.clone();
                let new_id = doc.add_object(Object::Dictionary(resources));
                if let Some(Object::Dictionary(page_dict)) = doc.objects.get_mut(&id) {
                    page_dict.set("Resources", Object::Reference(new_id));
                }
                return Some(new_id);
            }
            _ => {
                current = dict.get(b"Parent").ok().and_then(|o| o.as_reference().ok());
            }
        }
    }

    let new_id = doc.add_object(Object::Dictionary(Dictionary::new()));
    if let Some(Object::Dictionary(page_dict)) = doc.objects.get_mut(&page_id) {
        page_dict.set("Resources", Object::Reference(new_id));
    }
    Some(new_id)
}

fn append_stamp_operations(
    doc: &mut Document,
    page_id: ObjectId,
    label: &str,
    rect: &Rect,
    request: &StampRequest,
) -> Result<()> {
    let existing = doc
        .get_page_content(page_id)
        .map_err(|e| Error::InvalidFormat(e.to_string()))?;
    let mut content = Content::decode(&existing).unwrap_or(Content { operations: Vec::new() });

    content.operations.push(Operation::new("q", vec![]));

    if request.background {
        content.operations.push(Operation::new("1 1 1 rg", vec![]));
        content.operations.push(Operation::new(
            "re",
            vec![
                (rect.x0 - BG_PADDING_PT).into(),
                (rect.y0 - BG_PADDING_PT).into(),
                (rect.width() + 2.0 * BG_PADDING_PT).into(),
                (rect.height() + 2.0 * BG_PADDING_PT).into(),
            ],
        ));
        content.operations.push(Operation::new("f", vec![]));
    }

    content.operations.push(Operation::new("0 0 0 rg", vec![]));
    content.operations.push(Operation::new("BT", vec![]));
    content.operations.push(Operation::new(
        "Tf",
        vec![format!("/{STAMP_FONT_RESOURCE}").into(), request.font_size.into()],
    ));
    content
        .operations
        .push(Operation::new("Td", vec![rect.x0.into(), rect.y0.into()]));
    content
        .operations
        .push(Operation::new("Tj", vec![Object::string_literal(label)]));
    content.operations.push(Operation::new("ET", vec![]));
    content.operations.push(Operation::new("Q", vec![]));

    let encoded = content
        .encode()
        .map_err(|e| Error::InvalidFormat(e.to_string()))?;
    doc.change_page_content(page_id, encoded)
        .map_err(|e| Error::InvalidFormat(e.to_string()))
}
