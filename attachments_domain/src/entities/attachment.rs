// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Attachment
//!
//! The single unit that flows through a pipeline (§3). Construction only
//! runs the DSL parser; everything else (`obj`, `text`, `images`, most of
//! `metadata`) is populated by handlers as the pipeline executes.

use indexmap::IndexMap;
use std::path::PathBuf;

use crate::error::AttachmentError;
use crate::value_objects::{parse_source, Commands, DuplicateKeyWarning, MetadataValue};
use crate::LoadedObject;

/// One base64 data-URL image (`data:<mime>;base64,<payload>`), fully
/// self-contained per the `images` invariant in §3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrlImage(pub String);

impl DataUrlImage {
    pub fn new(mime: &str, base64_payload: &str) -> Self {
        Self(format!("data:{mime};base64,{base64_payload}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct Attachment {
    /// Original source string, including any DSL brackets.
    pub input: String,
    /// `input` with the DSL stripped: a file path, URL, or chunk id.
    pub path: String,
    /// Parsed DSL commands, key-unique, last-write-wins.
    pub commands: Commands,
    /// The loaded in-memory object, once a LOAD handler has run.
    pub obj: Option<LoadedObject>,
    /// Extracted text, UTF-8, append-only under additive composition.
    pub text: String,
    /// Base64 data-URL images, in producer order.
    pub images: Vec<DataUrlImage>,
    /// Free-form metadata populated by any stage.
    pub metadata: IndexMap<String, MetadataValue>,
    /// Append-only trace of handler names applied, in execution order.
    pipeline_trace: Vec<String>,
    /// Temporary files created while loading this attachment (e.g. URL
    /// downloads), released on drop or explicit `cleanup()` (§5).
    temp_paths: Vec<PathBuf>,
}

impl Attachment {
    /// Parses `source` and constructs a fresh `Attachment` with no loaded
    /// object, no text, and no images. Fails only for `AttachmentError::DslSyntax`
    /// - the one fatal condition construction itself can hit.
    pub fn new(source: impl Into<String>) -> Result<Self, AttachmentError> {
        let input = source.into();
        let (path, commands, warnings) = parse_source(&input)?;
        let mut metadata = IndexMap::new();
        if !warnings.is_empty() {
            metadata.insert(
                "dsl_warnings".to_string(),
                MetadataValue::List(warnings.iter().map(duplicate_warning_to_metadata).collect()),
            );
        }
        Ok(Self {
            input,
            path,
            commands,
            obj: None,
            text: String::new(),
            images: Vec::new(),
            metadata,
            pipeline_trace: Vec::new(),
            temp_paths: Vec::new(),
        })
    }

    /// Appends `step` to the pipeline trace. Only the pipeline engine should
    /// call this - it is the sole mutator of `pipeline_trace`, keeping the
    /// append-only invariant in §3 enforceable without a public setter.
    pub fn record_step(&mut self, step: impl Into<String>) {
        self.pipeline_trace.push(step.into());
    }

    pub fn trace(&self) -> &[String] {
        &self.pipeline_trace
    }

    pub fn track_temp_path(&mut self, path: PathBuf) {
        self.temp_paths.push(path);
    }

    pub fn temp_paths(&self) -> &[PathBuf] {
        &self.temp_paths
    }

    /// Appends a structured entry to `metadata.errors[]`, per the
    /// per-step error capture contract in §4.3.
    pub fn record_error(&mut self, step: &str, error: &AttachmentError) {
        let entry = MetadataValue::Map(IndexMap::from([
            ("step".to_string(), MetadataValue::Str(step.to_string())),
            ("kind".to_string(), MetadataValue::Str(error.classification_keyword().to_string())),
            ("message".to_string(), MetadataValue::Str(error.to_string())),
        ]));
        match self.metadata.get_mut("errors") {
            Some(MetadataValue::List(list)) => list.push(entry),
            _ => {
                self.metadata.insert("errors".to_string(), MetadataValue::List(vec![entry]));
            }
        }
    }

    pub fn errors(&self) -> &[MetadataValue] {
        match self.metadata.get("errors") {
            Some(MetadataValue::List(list)) => list.as_slice(),
            _ => &[],
        }
    }

    /// Appends `more` to `text` (blank-line separated if both are
    /// non-empty), the behavior additive-safe presenters must use (§4.3,
    /// §4.8).
    pub fn append_text(&mut self, more: &str) {
        if more.is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push_str("\n\n");
        }
        self.text.push_str(more);
    }

    pub fn push_image(&mut self, image: DataUrlImage) {
        self.images.push(image);
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        for path in &self.temp_paths {
            let _ = std::fs::remove_file(path);
        }
    }
}

fn duplicate_warning_to_metadata(w: &DuplicateKeyWarning) -> MetadataValue {
    MetadataValue::Map(IndexMap::from([
        ("key".to_string(), MetadataValue::Str(w.key.clone())),
        ("previous_value".to_string(), MetadataValue::Str(w.previous_value.clone())),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_strips_dsl_from_path() {
        let att = Attachment::new("report.pdf[pages:1-3]").unwrap();
        assert_eq!(att.path, "report.pdf");
        assert_eq!(att.commands.get("pages"), Some("1-3"));
        assert!(att.obj.is_none());
    }

    #[test]
    fn append_text_joins_with_blank_line() {
        let mut att = Attachment::new("x.txt").unwrap();
        att.append_text("first");
        att.append_text("second");
        assert_eq!(att.text, "first\n\nsecond");
    }

    #[test]
    fn append_text_of_empty_string_is_a_no_op() {
        let mut att = Attachment::new("x.txt").unwrap();
        att.append_text("first");
        att.append_text("");
        assert_eq!(att.text, "first");
    }

    #[test]
    fn record_error_accumulates_structured_entries() {
        let mut att = Attachment::new("x.pdf").unwrap();
        att.record_error(
            "load.pdf",
            &AttachmentError::DependencyMissing {
                handler: "load.pdf".into(),
                install_hint: "pip install pymupdf".into(),
            },
        );
        assert_eq!(att.errors().len(), 1);
    }

    #[test]
    fn fatal_dsl_syntax_error_surfaces_from_constructor() {
        let err = Attachment::new("x[pages:1").unwrap_err();
        assert!(err.is_fatal());
    }
}
