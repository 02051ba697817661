// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Built-in LOAD handlers (§4.5). Registration order matters here: the
//! text-fallback loader is pushed last with a catch-all `match`, which is
//! what guarantees `load_auto`'s search always terminates.

use std::collections::HashMap;

use attachments_domain::services::{HandlerRegistration, VerbKind};
use attachments_domain::{Attachment, AttachmentError, LoadedObject};

use crate::application::services::registry::{HandlerRegistry, LoaderEntry};
use crate::infrastructure::handlers::{active_config, extension_of};

pub fn register(registry: &mut HandlerRegistry) {
    registry.register_loader(LoaderEntry { registration: HandlerRegistration::new(VerbKind::Load, "url"), matcher: matches_url, load: load_url });
    registry.register_loader(LoaderEntry { registration: HandlerRegistration::new(VerbKind::Load, "repository"), matcher: matches_repository, load: load_repository });
    registry.register_loader(LoaderEntry { registration: HandlerRegistration::new(VerbKind::Load, "document"), matcher: matches_document, load: load_document });
    registry.register_loader(LoaderEntry { registration: HandlerRegistration::new(VerbKind::Load, "docx"), matcher: matches_docx, load: load_docx });
    registry.register_loader(LoaderEntry { registration: HandlerRegistration::new(VerbKind::Load, "table"), matcher: matches_table, load: load_table });
    registry.register_loader(LoaderEntry { registration: HandlerRegistration::new(VerbKind::Load, "image"), matcher: matches_image, load: load_image });
    registry.register_loader(LoaderEntry { registration: HandlerRegistration::new(VerbKind::Load, "text"), matcher: matches_text, load: load_text });
}

fn io_failure(step: &str, err: std::io::Error) -> AttachmentError {
    AttachmentError::HandlerFailure { step: step.to_string(), message: err.to_string() }
}

/// Reads content from a previously-downloaded `Response` body if `morph`
/// has already run, otherwise from the filesystem - lets every
/// content-specific loader below work the same whether it is seeing a
/// local path or a downloaded-then-morphed URL.
fn source_bytes(att: &Attachment, step: &str) -> Result<Vec<u8>, AttachmentError> {
    match &att.obj {
        Some(LoadedObject::Response { body, .. }) => Ok(body.clone()),
        _ => std::fs::read(&att.path).map_err(|e| io_failure(step, e)),
    }
}

// ---------------------------------------------------------------------
// load.url
// ---------------------------------------------------------------------

fn matches_url(att: &Attachment) -> bool {
    att.obj.is_none() && (att.path.starts_with("http://") || att.path.starts_with("https://"))
}

fn load_url(att: &mut Attachment) -> Result<(), AttachmentError> {
    let response = reqwest::blocking::get(&att.path).map_err(|e| AttachmentError::HandlerFailure { step: "load.url".to_string(), message: e.to_string() })?;
    let status = response.status().as_u16();
    let content_type = response.headers().get(reqwest::header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).map(str::to_string);
    let headers: HashMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
        .collect();
    let body = response.bytes().map_err(|e| AttachmentError::HandlerFailure { step: "load.url".to_string(), message: e.to_string() })?.to_vec();

    let budget = active_config().size_budget_bytes;
    if (body.len() as u64) > budget && att.commands.get_bool("force") != Some(true) {
        return Err(AttachmentError::SizeBudgetExceeded { discovered_bytes: body.len() as u64, budget_bytes: budget });
    }

    att.obj = Some(LoadedObject::Response { status, content_type, headers, body });
    Ok(())
}

// ---------------------------------------------------------------------
// load.repository - eager size probe over a directory (§5)
// ---------------------------------------------------------------------

fn matches_repository(att: &Attachment) -> bool {
    std::path::Path::new(&att.path).is_dir()
}

fn load_repository(att: &mut Attachment) -> Result<(), AttachmentError> {
    let entries: Vec<walkdir::DirEntry> = walkdir::WalkDir::new(&att.path).into_iter().filter_map(Result::ok).filter(|e| e.file_type().is_file()).collect();
    let total_bytes: u64 = entries.iter().filter_map(|e| e.metadata().ok()).map(|m| m.len()).sum();

    let budget = active_config().size_budget_bytes;
    if total_bytes > budget && att.commands.get_bool("force") != Some(true) {
        return Err(AttachmentError::SizeBudgetExceeded { discovered_bytes: total_bytes, budget_bytes: budget });
    }

    let mut combined = String::new();
    for entry in &entries {
        if let Ok(contents) = std::fs::read_to_string(entry.path()) {
            if !combined.is_empty() {
                combined.push_str("\n\n");
            }
            combined.push_str(&format!("--- {} ---\n{}", entry.path().display(), contents));
        }
    }
    att.obj = Some(LoadedObject::Text(combined));
    att.metadata.insert("repository_file_count".to_string(), attachments_domain::MetadataValue::Int(entries.len() as i64));
    Ok(())
}

// ---------------------------------------------------------------------
// load.document - paginated text formats (§4.5's "specialized by extension")
// ---------------------------------------------------------------------

/// `.pdf`/`.pptx` are accepted as a stand-in paginated-text convention:
/// the form-feed character (`\x0C`) separates pages, matching how simple
/// plain-text fixtures denote page breaks. This does not parse real PDF
/// or OOXML bytes - that fidelity is explicitly out of scope.
fn matches_document(att: &Attachment) -> bool {
    matches!(extension_of(&att.path).as_str(), "pdf" | "pptx")
}

fn load_document(att: &mut Attachment) -> Result<(), AttachmentError> {
    let bytes = source_bytes(att, "load.document")?;
    let content = String::from_utf8_lossy(&bytes).into_owned();
    let pages: Vec<String> = content.split('\u{000C}').map(str::to_string).collect();
    att.obj = Some(LoadedObject::Document { page_count: pages.len(), pages });
    Ok(())
}

/// `.docx` is a zip-based OOXML container; reading it as plain text would
/// silently produce garbage rather than a helpful error, so this loader
/// always reports the missing backend honestly instead of pretending to
/// support it.
fn matches_docx(att: &Attachment) -> bool {
    extension_of(&att.path) == "docx"
}

fn load_docx(_att: &mut Attachment) -> Result<(), AttachmentError> {
    Err(AttachmentError::DependencyMissing {
        handler: "load.docx".to_string(),
        install_hint: "install a DOCX/OOXML parsing backend to read .docx content".to_string(),
    })
}

// ---------------------------------------------------------------------
// load.table - minimal, unquoted CSV
// ---------------------------------------------------------------------

fn matches_table(att: &Attachment) -> bool {
    extension_of(&att.path) == "csv"
}

fn load_table(att: &mut Attachment) -> Result<(), AttachmentError> {
    let bytes = source_bytes(att, "load.table")?;
    let content = String::from_utf8_lossy(&bytes).into_owned();
    let mut lines = content.lines();
    let header = lines.next().map(|l| l.split(',').map(str::trim).map(str::to_string).collect()).unwrap_or_default();
    let rows: Vec<Vec<String>> = lines.filter(|l| !l.is_empty()).map(|l| l.split(',').map(str::trim).map(str::to_string).collect()).collect();
    att.obj = Some(LoadedObject::Table { header, rows });
    Ok(())
}

// ---------------------------------------------------------------------
// load.image - magic-byte format sniffing, no pixel decode
// ---------------------------------------------------------------------

fn matches_image(att: &Attachment) -> bool {
    matches!(extension_of(&att.path).as_str(), "jpg" | "jpeg" | "png")
}

fn load_image(att: &mut Attachment) -> Result<(), AttachmentError> {
    let bytes = source_bytes(att, "load.image")?;
    let format = sniff_image_format(&bytes).unwrap_or_else(|| extension_of(&att.path).to_uppercase());
    att.obj = Some(LoadedObject::Image { format, width: 0, height: 0, bytes });
    Ok(())
}

fn sniff_image_format(bytes: &[u8]) -> Option<String> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("JPEG".to_string())
    } else if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        Some("PNG".to_string())
    } else {
        None
    }
}

// ---------------------------------------------------------------------
// load.text - catch-all fallback, always matches
// ---------------------------------------------------------------------

fn matches_text(_att: &Attachment) -> bool {
    true
}

/// The terminal fallback loader (§4.5): always matches, so `load_auto`
/// always terminates. If an earlier loader in this attempt already
/// recorded a `DependencyMissing`, the install hint and the loader's own
/// name are folded into the returned text so the caller sees both the
/// raw content and why a more specific loader didn't run.
fn load_text(att: &mut Attachment) -> Result<(), AttachmentError> {
    let bytes = source_bytes(att, "load.text")?;
    let content = String::from_utf8_lossy(&bytes).into_owned();

    for entry in att.errors() {
        let attachments_domain::MetadataValue::Map(map) = entry else { continue };
        if map.get("kind").and_then(attachments_domain::MetadataValue::as_str) == Some("DependencyMissing") {
            let step = map.get("step").and_then(attachments_domain::MetadataValue::as_str).unwrap_or("load");
            let message = map.get("message").and_then(attachments_domain::MetadataValue::as_str).unwrap_or("");
            att.append_text(&format!("[DependencyMissing] `{step}` reported a missing dependency ({message}); falling back to plain-text reading."));
        }
    }

    att.obj = Some(LoadedObject::Text(content));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_matcher_requires_scheme_and_no_prior_object() {
        let att = Attachment::new("https://example.com/a.pdf").unwrap();
        assert!(matches_url(&att));
        let plain = Attachment::new("a.pdf").unwrap();
        assert!(!matches_url(&plain));
    }

    #[test]
    fn document_loader_splits_on_form_feed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        std::fs::write(&path, "page one\u{000C}page two\u{000C}page three").unwrap();
        let mut att = Attachment::new(path.to_string_lossy().to_string()).unwrap();
        load_document(&mut att).unwrap();
        match att.obj {
            Some(LoadedObject::Document { page_count, pages }) => {
                assert_eq!(page_count, 3);
                assert_eq!(pages[0], "page one");
            }
            other => panic!("expected Document, got {other:?}"),
        }
    }

    #[test]
    fn docx_loader_always_reports_dependency_missing() {
        let mut att = Attachment::new("report.docx").unwrap();
        let err = load_docx(&mut att).unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(err.classification_keyword(), "DependencyMissing");
    }

    #[test]
    fn table_loader_parses_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "name,age\nAda,36\nGrace,85\n").unwrap();
        let mut att = Attachment::new(path.to_string_lossy().to_string()).unwrap();
        load_table(&mut att).unwrap();
        match att.obj {
            Some(LoadedObject::Table { header, rows }) => {
                assert_eq!(header, vec!["name".to_string(), "age".to_string()]);
                assert_eq!(rows.len(), 2);
            }
            other => panic!("expected Table, got {other:?}"),
        }
    }

    #[test]
    fn image_loader_sniffs_jpeg_magic_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]).unwrap();
        let mut att = Attachment::new(path.to_string_lossy().to_string()).unwrap();
        load_image(&mut att).unwrap();
        match att.obj {
            Some(LoadedObject::Image { format, .. }) => assert_eq!(format, "JPEG"),
            other => panic!("expected Image, got {other:?}"),
        }
    }

    #[test]
    fn text_loader_always_matches_and_reads_raw_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello world").unwrap();
        let mut att = Attachment::new(path.to_string_lossy().to_string()).unwrap();
        assert!(matches_text(&att));
        load_text(&mut att).unwrap();
        assert_eq!(att.obj.as_ref().and_then(attachments_domain::services::as_readable_text), Some("hello world"));
    }
}
