// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Built-in MODIFY handlers (§4.6): page selection, row limiting, rotation,
//! cropping, and the `morph` step that turns a downloaded `Response` into
//! something the extension-based loaders can pick up.

use attachments_domain::services::{HandlerRegistration, ParamKind, ParamSpec, VerbKind};
use attachments_domain::value_objects::DispatchDescriptor;
use attachments_domain::{Attachment, AttachmentError, LoadedObject, MetadataValue};

use crate::application::services::registry::{HandlerRegistry, ModifierEntry};
use crate::infrastructure::handlers::extension_of;

pub fn register(registry: &mut HandlerRegistry) {
    registry.register_modifier(ModifierEntry {
        registration: HandlerRegistration {
            dispatch_type: Some(DispatchDescriptor::subtype("document")),
            params: PAGES_PARAMS,
            ..HandlerRegistration::new(VerbKind::Modify, "pages")
        },
        modify: modify_pages,
    });
    registry.register_modifier(ModifierEntry {
        registration: HandlerRegistration {
            dispatch_type: Some(DispatchDescriptor::subtype("table")),
            params: LIMIT_PARAMS,
            ..HandlerRegistration::new(VerbKind::Modify, "limit_rows")
        },
        modify: modify_limit_rows,
    });
    registry.register_modifier(ModifierEntry {
        registration: HandlerRegistration {
            dispatch_type: Some(DispatchDescriptor::subtype("image")),
            params: ROTATE_PARAMS,
            ..HandlerRegistration::new(VerbKind::Modify, "rotate")
        },
        modify: modify_rotate,
    });
    registry.register_modifier(ModifierEntry {
        registration: HandlerRegistration {
            dispatch_type: Some(DispatchDescriptor::subtype("image")),
            params: CROP_PARAMS,
            ..HandlerRegistration::new(VerbKind::Modify, "crop")
        },
        modify: modify_crop,
    });
    registry.register_modifier(ModifierEntry {
        registration: HandlerRegistration { dispatch_type: Some(DispatchDescriptor::subtype("response")), ..HandlerRegistration::new(VerbKind::Modify, "morph") },
        modify: modify_morph,
    });
}

const PAGES_PARAMS: &[ParamSpec] = &[ParamSpec::new("pages", ParamKind::String)];
const LIMIT_PARAMS: &[ParamSpec] = &[ParamSpec::new("limit", ParamKind::Int)];
const ROTATE_PARAMS: &[ParamSpec] = &[ParamSpec::new("rotate", ParamKind::Int)];
const CROP_PARAMS: &[ParamSpec] = &[ParamSpec::new("crop", ParamKind::String)];

fn modify_pages(att: &mut Attachment) -> Result<(), AttachmentError> {
    let Some(expr) = att.commands.get("pages").map(str::to_string) else { return Ok(()) };
    let Some(LoadedObject::Document { page_count, pages }) = &att.obj else { return Ok(()) };

    let selected = attachments_domain::value_objects::parse_page_ranges(&expr, *page_count)
        .map_err(|e| AttachmentError::HandlerFailure { step: "modify.pages".to_string(), message: e.to_string() })?;
    let selected_pages: Vec<String> = selected.iter().filter_map(|&n| pages.get(n - 1).cloned()).collect();

    att.metadata.insert("pages_selected".to_string(), MetadataValue::List(selected.iter().map(|&n| MetadataValue::Int(n as i64)).collect()));
    let new_count = selected_pages.len();
    att.obj = Some(LoadedObject::Document { page_count: new_count, pages: selected_pages });
    Ok(())
}

fn modify_limit_rows(att: &mut Attachment) -> Result<(), AttachmentError> {
    let Some(limit) = att.commands.get_int("limit") else { return Ok(()) };
    let Some(LoadedObject::Table { header, rows }) = att.obj.clone() else { return Ok(()) };

    let kept = (limit.max(0) as usize).min(rows.len());
    let trimmed: Vec<Vec<String>> = rows.into_iter().take(kept).collect();
    att.metadata.insert("csv_rows_kept".to_string(), MetadataValue::Int(kept as i64));
    att.obj = Some(LoadedObject::Table { header, rows: trimmed });
    Ok(())
}

fn modify_rotate(att: &mut Attachment) -> Result<(), AttachmentError> {
    let Some(degrees) = att.commands.get_int("rotate") else { return Ok(()) };
    let Some(LoadedObject::Image { format, width, height, bytes }) = att.obj.clone() else { return Ok(()) };

    // Real pixel rotation is out of scope (byte-exact image reproduction is
    // an explicit non-goal); the metadata this records is what downstream
    // consumers and the dispatch-by-extension scenario actually depend on.
    let (width, height) = if degrees == 90 || degrees == 270 { (height, width) } else { (width, height) };
    att.metadata.insert("rotation".to_string(), MetadataValue::Int(degrees));
    att.metadata.insert("image_format".to_string(), MetadataValue::Str(format.to_uppercase()));
    att.obj = Some(LoadedObject::Image { format, width, height, bytes });
    Ok(())
}

fn modify_crop(att: &mut Attachment) -> Result<(), AttachmentError> {
    let Some(region) = att.commands.get("crop").map(str::to_string) else { return Ok(()) };
    att.metadata.insert("crop".to_string(), MetadataValue::Str(region));
    Ok(())
}

/// Sniffs content-type/magic-bytes/URL-path extension to replace `att.path`
/// with a canonical filename, enabling the next `LoadAuto` pass to pick a
/// content-specific loader by extension (§4.5).
fn modify_morph(att: &mut Attachment) -> Result<(), AttachmentError> {
    let Some(LoadedObject::Response { content_type, body, .. }) = &att.obj else { return Ok(()) };

    let detected_ext = content_type
        .as_deref()
        .and_then(extension_from_content_type)
        .or_else(|| sniff_extension(body))
        .unwrap_or_else(|| {
            let from_url = extension_of(&att.path);
            if from_url.is_empty() { "bin".to_string() } else { from_url }
        });

    let stem = att.path.rsplit('/').next().unwrap_or(&att.path).split('?').next().unwrap_or("downloaded");
    let stem = if stem.is_empty() { "downloaded" } else { stem };
    let canonical = format!("{stem}.{detected_ext}");

    att.metadata.insert("detected_extension".to_string(), MetadataValue::Str(detected_ext));
    att.path = canonical;
    Ok(())
}

fn extension_from_content_type(content_type: &str) -> Option<String> {
    let mime = content_type.split(';').next().unwrap_or(content_type).trim();
    let ext = match mime {
        "application/pdf" => "pdf",
        "text/csv" => "csv",
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "text/plain" | "text/markdown" => "txt",
        _ => return None,
    };
    Some(ext.to_string())
}

fn sniff_extension(body: &[u8]) -> Option<String> {
    if body.starts_with(b"%PDF") {
        Some("pdf".to_string())
    } else if body.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg".to_string())
    } else if body.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        Some("png".to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(pages: &[&str]) -> LoadedObject {
        LoadedObject::Document { page_count: pages.len(), pages: pages.iter().map(|s| s.to_string()).collect() }
    }

    #[test]
    fn pages_selects_and_records_metadata() {
        let mut att = Attachment::new("report.pdf[pages:1-3]").unwrap();
        att.obj = Some(document(&["p1", "p2", "p3", "p4", "p5"]));
        modify_pages(&mut att).unwrap();
        let selected = att.metadata.get("pages_selected").and_then(MetadataValue::as_list).unwrap();
        assert_eq!(selected.iter().filter_map(MetadataValue::as_int).collect::<Vec<_>>(), vec![1, 2, 3]);
        match att.obj {
            Some(LoadedObject::Document { page_count, .. }) => assert_eq!(page_count, 3),
            _ => panic!("expected Document"),
        }
    }

    #[test]
    fn limit_rows_caps_at_available_rows() {
        let mut att = Attachment::new("data.csv[limit:2]").unwrap();
        att.obj = Some(LoadedObject::Table { header: vec!["a".into()], rows: vec![vec!["1".into()], vec!["2".into()], vec!["3".into()]] });
        modify_limit_rows(&mut att).unwrap();
        assert_eq!(att.metadata.get("csv_rows_kept").and_then(MetadataValue::as_int), Some(2));
    }

    #[test]
    fn rotate_swaps_dimensions_for_quarter_turns() {
        let mut att = Attachment::new("photo.jpg[rotate:90]").unwrap();
        att.obj = Some(LoadedObject::Image { format: "jpeg".into(), width: 200, height: 100, bytes: vec![] });
        modify_rotate(&mut att).unwrap();
        assert_eq!(att.metadata.get("image_format").and_then(MetadataValue::as_str), Some("JPEG"));
        match att.obj {
            Some(LoadedObject::Image { width, height, .. }) => {
                assert_eq!(width, 100);
                assert_eq!(height, 200);
            }
            _ => panic!("expected Image"),
        }
    }

    #[test]
    fn morph_derives_extension_from_content_type() {
        let mut att = Attachment::new("https://example.com/download?id=7").unwrap();
        att.obj = Some(LoadedObject::Response { status: 200, content_type: Some("application/pdf".into()), headers: Default::default(), body: vec![] });
        modify_morph(&mut att).unwrap();
        assert!(att.path.ends_with(".pdf"));
        assert_eq!(att.metadata.get("detected_extension").and_then(MetadataValue::as_str), Some("pdf"));
    }
}
