// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Built-in PRESENT handlers (§4.8). Every one of these appends to
//! `text`/`images`, never overwrites, so the universal pipeline's additive
//! PRESENT group stays composable regardless of which subset of presenters
//! a given object's dispatch actually matches.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use attachments_domain::services::{HandlerRegistration, PresenterCategory, VerbKind};
use attachments_domain::value_objects::DispatchDescriptor;
use attachments_domain::{Attachment, AttachmentError, DataUrlImage, LoadedObject, MetadataValue};

use crate::application::services::registry::{HandlerRegistry, PresenterEntry};
use crate::infrastructure::handlers::extension_of;

pub fn register(registry: &mut HandlerRegistry) {
    registry.register_presenter(PresenterEntry {
        registration: HandlerRegistration { dispatch_type: Some(DispatchDescriptor::subtype("text")), category: Some(PresenterCategory::Text), ..HandlerRegistration::new(VerbKind::Present, "text") },
        present: present_text,
    });
    registry.register_presenter(PresenterEntry {
        registration: HandlerRegistration {
            dispatch_type: Some(DispatchDescriptor::subtype("document")),
            category: Some(PresenterCategory::Text),
            ..HandlerRegistration::new(VerbKind::Present, "document_markdown")
        },
        present: present_document_markdown,
    });
    registry.register_presenter(PresenterEntry {
        registration: HandlerRegistration {
            dispatch_type: Some(DispatchDescriptor::subtype("table")),
            category: Some(PresenterCategory::Text),
            ..HandlerRegistration::new(VerbKind::Present, "table_markdown")
        },
        present: present_table_markdown,
    });
    registry.register_presenter(PresenterEntry {
        registration: HandlerRegistration {
            dispatch_type: Some(DispatchDescriptor::subtype("image")),
            category: Some(PresenterCategory::Image),
            ..HandlerRegistration::new(VerbKind::Present, "image_passthrough")
        },
        present: present_image_passthrough,
    });
    registry.register_presenter(PresenterEntry {
        registration: HandlerRegistration {
            dispatch_type: Some(DispatchDescriptor::regex(".*").unwrap_or(DispatchDescriptor::subtype("*"))),
            category: Some(PresenterCategory::Metadata),
            ..HandlerRegistration::new(VerbKind::Present, "metadata_summary")
        },
        present: present_metadata_summary,
    });
}

fn present_text(att: &mut Attachment) -> Result<(), AttachmentError> {
    if let Some(LoadedObject::Text(s)) = &att.obj {
        att.append_text(s.clone().as_str());
    }
    Ok(())
}

fn present_document_markdown(att: &mut Attachment) -> Result<(), AttachmentError> {
    let Some(LoadedObject::Document { pages, .. }) = att.obj.clone() else { return Ok(()) };
    let heading = match extension_of(&att.path).as_str() {
        "pdf" => format!("# PDF Document: {}", att.path),
        "pptx" => format!("# Slide Deck: {}", att.path),
        _ => format!("# Document: {}", att.path),
    };
    let body = pages.join("\n\n");
    att.append_text(&format!("{heading}\n\n{body}"));
    Ok(())
}

fn present_table_markdown(att: &mut Attachment) -> Result<(), AttachmentError> {
    let Some(LoadedObject::Table { header, rows }) = att.obj.clone() else { return Ok(()) };
    let mut out = String::new();
    out.push_str(&format!("| {} |\n", header.join(" | ")));
    out.push_str(&format!("|{}|\n", "---|".repeat(header.len())));
    for row in &rows {
        out.push_str(&format!("| {} |\n", row.join(" | ")));
    }
    att.append_text(out.trim_end());
    Ok(())
}

fn present_image_passthrough(att: &mut Attachment) -> Result<(), AttachmentError> {
    let Some(LoadedObject::Image { format, bytes, .. }) = att.obj.clone() else { return Ok(()) };
    let mime = format!("image/{}", format.to_ascii_lowercase());
    let payload = BASE64.encode(&bytes);
    att.push_image(DataUrlImage::new(&mime, &payload));
    Ok(())
}

fn present_metadata_summary(att: &mut Attachment) -> Result<(), AttachmentError> {
    let Some(obj) = &att.obj else { return Ok(()) };
    att.metadata.insert("summary".to_string(), MetadataValue::Str(format!("{} ({})", obj.class_name(), obj.family())));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_presenter_appends_raw_text() {
        let mut att = Attachment::new("a.txt").unwrap();
        att.obj = Some(LoadedObject::Text("hello".to_string()));
        present_text(&mut att).unwrap();
        assert_eq!(att.text, "hello");
    }

    #[test]
    fn document_markdown_begins_with_pdf_heading() {
        let mut att = Attachment::new("report.pdf").unwrap();
        att.obj = Some(LoadedObject::Document { page_count: 2, pages: vec!["one".into(), "two".into()] });
        present_document_markdown(&mut att).unwrap();
        assert!(att.text.starts_with("# PDF Document: report.pdf"));
    }

    #[test]
    fn table_markdown_includes_header_and_rows() {
        let mut att = Attachment::new("data.csv").unwrap();
        att.obj = Some(LoadedObject::Table { header: vec!["a".into(), "b".into()], rows: vec![vec!["1".into(), "2".into()]] });
        present_table_markdown(&mut att).unwrap();
        assert!(att.text.contains("| a | b |"));
        assert!(att.text.contains("| 1 | 2 |"));
    }

    #[test]
    fn image_passthrough_produces_a_data_url() {
        let mut att = Attachment::new("photo.png").unwrap();
        att.obj = Some(LoadedObject::Image { format: "PNG".into(), width: 1, height: 1, bytes: vec![1, 2, 3] });
        present_image_passthrough(&mut att).unwrap();
        assert_eq!(att.images.len(), 1);
        assert!(att.images[0].as_str().starts_with("data:image/png;base64,"));
    }
}
