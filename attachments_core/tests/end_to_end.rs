// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end scenarios exercising the universal pipeline and the
//! hand-composed pipeline algebra through the public `Attachments` API
//! and `Pipeline`/`VerbStep` directly.

use attachments_core::application::services::pipeline_engine::{ExecutionContext, Item, Pipeline, VerbStep};
use attachments_core::application::services::registry::Engine;
use attachments_core::infrastructure::config::AppConfig;
use attachments_core::{build_engine, Attachments};
use attachments_domain::{Attachment, MetadataValue};

fn engine() -> Engine {
    build_engine(AppConfig::default())
}

fn write(dir: &std::path::Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().into_owned()
}

/// Scenario 1: page selection plus a suppressed image category, through
/// the universal pipeline.
#[test]
fn scenario_1_page_selection_and_image_suppression() {
    let dir = tempfile::tempdir().unwrap();
    let pages = "page one\u{000C}page two\u{000C}page three\u{000C}page four\u{000C}page five";
    let path = write(dir.path(), "report.pdf", pages);
    let source = format!("{path}[pages:1-3,images:false]");

    let engine = engine();
    let attachments = Attachments::process([source], &engine).unwrap();
    assert_eq!(attachments.len(), 1);

    let Item::Single(att) = &attachments.items()[0] else { panic!("expected a single attachment") };
    let selected = att.metadata.get("pages_selected").and_then(MetadataValue::as_list).unwrap();
    assert_eq!(selected.iter().filter_map(MetadataValue::as_int).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert!(att.images.is_empty());
    assert!(att.text.starts_with(&format!("# PDF Document: {path}")));
}

/// Scenario 2: rotation records the swapped dimensions and format in
/// metadata. Real pixel rotation is out of scope, so this asserts the
/// metadata contract only.
#[test]
fn scenario_2_rotation_records_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "photo.jpg", "");
    std::fs::write(&path, [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]).unwrap();
    let source = format!("{path}[rotate:90]");

    let engine = engine();
    let attachments = Attachments::process([source], &engine).unwrap();
    let Item::Single(att) = &attachments.items()[0] else { panic!("expected a single attachment") };
    assert_eq!(att.metadata.get("rotation").and_then(MetadataValue::as_int), Some(90));
    assert_eq!(att.metadata.get("image_format").and_then(MetadataValue::as_str), Some("JPEG"));
    assert_eq!(att.images.len(), 1);
}

/// Scenario 3: row limiting over a CSV, through the universal pipeline.
#[test]
fn scenario_3_row_limiting() {
    let dir = tempfile::tempdir().unwrap();
    let mut csv = String::from("name,age\n");
    for i in 0..100 {
        csv.push_str(&format!("person{i},{}\n", 20 + i % 50));
    }
    let path = write(dir.path(), "data.csv", &csv);
    let source = format!("{path}[limit:2]");

    let engine = engine();
    let attachments = Attachments::process([source], &engine).unwrap();
    let Item::Single(att) = &attachments.items()[0] else { panic!("expected a single attachment") };
    assert_eq!(att.metadata.get("csv_rows_kept").and_then(MetadataValue::as_int), Some(2));
    assert!(att.text.contains("| name | age |"));
    assert!(att.text.contains("person0"));
    assert!(att.text.contains("person1"));
    assert!(!att.text.contains("person2 |"));
}

/// Scenario 4: an explicitly composed `load.text >> split.paragraphs`
/// pipeline preserves chunk order and stamps the required metadata.
#[test]
fn scenario_4_paragraph_split_preserves_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "doc.txt", "A\n\nB\n\nC");

    let engine = engine();
    let ctx = ExecutionContext::new();
    let pipeline = Pipeline::verb(VerbStep::Load("text")) >> Pipeline::verb(VerbStep::Split("paragraphs"));
    let att = Attachment::new(path).unwrap();
    let result = pipeline.run(Item::Single(att), &engine, &ctx).unwrap();

    let Item::Collection(collection) = result else { panic!("expected a collection") };
    assert_eq!(collection.len(), 3);
    let texts: Vec<&str> = collection.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["A", "B", "C"]);
    for (index, chunk) in collection.iter().enumerate() {
        assert_eq!(chunk.metadata.get("chunk_index").and_then(MetadataValue::as_int), Some(index as i64));
        assert_eq!(chunk.metadata.get("total_chunks").and_then(MetadataValue::as_int), Some(3));
    }
}

/// Scenario 5: the chat adapter envelope shape for text plus one image.
/// Driven directly through the registered adapter entry (rather than
/// `Attachments::process`, which would also run a LOAD against a
/// nonexistent path) since only a hand-built `Attachment` carries exactly
/// the fixture text/image this scenario specifies.
#[test]
fn scenario_5_chat_adapter_envelope() {
    let engine = engine();
    let mut att = Attachment::new("note.txt").unwrap();
    att.append_text("hello");
    att.push_image(attachments_domain::DataUrlImage::new("image/png", "AAAA"));

    let adapter = engine.registry.find_adapter("chat").unwrap();
    let envelope = (adapter.single)(&att, "caption?");

    assert_eq!(
        envelope,
        serde_json::json!([{
            "role": "user",
            "content": [
                {"type": "text", "text": "caption?\n\nhello"},
                {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
            ]
        }])
    );
}

/// Scenario 6: a `.docx` source's `DependencyMissing` loader falls back to
/// the text-fallback loader, which folds the install hint and primary
/// loader name into `text`, and records the error kind in metadata.
#[test]
fn scenario_6_docx_falls_back_to_text_with_install_hint() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "report.docx", "raw docx bytes stand-in");

    let engine = engine();
    let attachments = Attachments::process([path], &engine).unwrap();
    let Item::Single(att) = &attachments.items()[0] else { panic!("expected a single attachment") };

    let kind = att
        .errors()
        .iter()
        .find_map(|e| match e {
            MetadataValue::Map(map) => map.get("kind").and_then(MetadataValue::as_str),
            _ => None,
        })
        .unwrap();
    assert_eq!(kind, "DependencyMissing");
    assert!(att.text.contains("load.docx"));
    assert!(att.text.contains("DOCX/OOXML parsing backend"));
}
