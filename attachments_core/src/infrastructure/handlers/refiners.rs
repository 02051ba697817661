// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Built-in REFINE handlers (§4.9): header prefixing, truncation, basic
//! whitespace cleaning, and the one reducer in the built-in set, image
//! tiling. REFINE handlers carry no DSL parameters (the dispatcher always
//! validates them against an empty parameter list, §4.9's "no dispatch-type
//! concept"), so anything configurable here comes from `AppConfig`.

use attachments_domain::services::VerbKind;
use attachments_domain::{Attachment, AttachmentCollection, AttachmentError, HandlerRegistration};

use crate::application::services::registry::{HandlerRegistry, RefinerEntry, RefinerImpl};
use crate::infrastructure::handlers::active_config;

pub fn register(registry: &mut HandlerRegistry) {
    registry.register_refiner(RefinerEntry { registration: HandlerRegistration::new(VerbKind::Refine, "header"), implementation: RefinerImpl::Single(refine_header) });
    registry.register_refiner(RefinerEntry { registration: HandlerRegistration::new(VerbKind::Refine, "truncate"), implementation: RefinerImpl::Single(refine_truncate) });
    registry.register_refiner(RefinerEntry { registration: HandlerRegistration::new(VerbKind::Refine, "clean"), implementation: RefinerImpl::Single(refine_clean) });
    registry.register_refiner(RefinerEntry {
        registration: HandlerRegistration { is_reducer: true, ..HandlerRegistration::new(VerbKind::Refine, "tile") },
        implementation: RefinerImpl::Reduce(refine_tile),
    });
}

/// Skipped when `text` already opens with a Markdown heading - the
/// document/table presenters already stamp one (`# PDF Document: ...`,
/// e.g.) identifying the source more specifically than a generic
/// "Source: path" line would.
fn refine_header(att: &mut Attachment) -> Result<(), AttachmentError> {
    if att.text.is_empty() || att.text.starts_with('#') {
        return Ok(());
    }
    att.text = format!("Source: {}\n\n{}", att.path, att.text);
    Ok(())
}

fn refine_truncate(att: &mut Attachment) -> Result<(), AttachmentError> {
    let budget = active_config().truncation_chars;
    if att.text.chars().count() <= budget {
        return Ok(());
    }
    let truncated: String = att.text.chars().take(budget).collect();
    att.text = format!("{truncated}\n\n[truncated at {budget} characters]");
    Ok(())
}

fn refine_clean(att: &mut Attachment) -> Result<(), AttachmentError> {
    let collapsed: Vec<&str> = att.text.split('\n').collect();
    let mut out: Vec<&str> = Vec::with_capacity(collapsed.len());
    let mut last_blank = false;
    for line in collapsed {
        let trimmed = line.trim_end();
        let blank = trimmed.is_empty();
        if blank && last_blank {
            continue;
        }
        out.push(trimmed);
        last_blank = blank;
    }
    att.text = out.join("\n").trim().to_string();
    Ok(())
}

/// Folds a collection into one `Attachment`, concatenating text with a
/// chunk header and flattening images in order. Real grid composition of
/// the images themselves is out of scope (byte-exact rendered-image
/// reproducibility is an explicit non-goal); this reducer only merges the
/// already-extracted content.
///
/// A single-chunk collection - the common case when this runs as part of
/// the universal pipeline against an Attachment that was never SPLIT -
/// passes its one chunk through unchanged rather than wrapping it in a
/// one-element "chunk 1" header, so including `refine.tile` unconditionally
/// in that pipeline is harmless.
fn refine_tile(collection: &AttachmentCollection) -> Result<Attachment, AttachmentError> {
    if collection.len() <= 1 {
        return Ok(collection.iter().next().cloned().unwrap_or(Attachment::new("(empty collection)")?));
    }
    let first_path = collection.iter().next().map(|c| c.path.clone()).unwrap_or_else(|| "(empty collection)".to_string());
    let mut merged = Attachment::new(first_path)?;
    for (index, chunk) in collection.iter().enumerate() {
        if !chunk.text.is_empty() {
            merged.append_text(&format!("--- chunk {} ---\n{}", index + 1, chunk.text));
        }
    }
    for image in collection.flattened_images() {
        merged.push_image(image);
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_prefixes_source_path() {
        let mut att = Attachment::new("x.txt").unwrap();
        att.append_text("body");
        refine_header(&mut att).unwrap();
        assert_eq!(att.text, "Source: x.txt\n\nbody");
    }

    #[test]
    fn header_is_a_no_op_on_empty_text() {
        let mut att = Attachment::new("x.txt").unwrap();
        refine_header(&mut att).unwrap();
        assert_eq!(att.text, "");
    }

    #[test]
    fn header_is_a_no_op_when_text_already_has_a_markdown_heading() {
        let mut att = Attachment::new("report.pdf").unwrap();
        att.append_text("# PDF Document: report.pdf\n\nbody");
        refine_header(&mut att).unwrap();
        assert!(att.text.starts_with("# PDF Document: report.pdf"));
    }

    #[test]
    fn clean_collapses_consecutive_blank_lines() {
        let mut att = Attachment::new("x.txt").unwrap();
        att.append_text("a\n\n\n\nb");
        refine_clean(&mut att).unwrap();
        assert_eq!(att.text, "a\n\nb");
    }

    #[test]
    fn tile_reducer_merges_chunk_text_with_headers() {
        let mut a = Attachment::new("doc.txt#page-1").unwrap();
        a.append_text("first");
        let mut b = Attachment::new("doc.txt#page-2").unwrap();
        b.append_text("second");
        let collection = AttachmentCollection::new(vec![a, b]);
        let merged = refine_tile(&collection).unwrap();
        assert!(merged.text.contains("chunk 1"));
        assert!(merged.text.contains("first"));
        assert!(merged.text.contains("second"));
    }
}
