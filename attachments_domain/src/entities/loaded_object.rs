// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Loaded Object
//!
//! `Attachment::obj` models Design Note §9's "Attachment ownership graph":
//! an exclusively-owned sum type over concrete loaded-object variants,
//! rather than a shared trait-object handle. Dispatch (`DispatchDescriptor`)
//! matches against a variant's class name, family, or a regex over the
//! qualified class name - never against a live type hierarchy.

use std::collections::HashMap;

/// One loaded, in-memory representation of a source's content.
///
/// `Other` is the escape hatch for user-registered loaders that produce a
/// kind of object the core doesn't know about; it still participates in
/// dispatch via its declared `type_name`, per the "fallback regex for
/// user-extended types" design note.
#[derive(Debug, Clone)]
pub enum LoadedObject {
    /// A paged document (PDF, slide deck, ...). `page_count` drives the
    /// page-range grammar; `pages` holds per-page extracted text, present
    /// once a PRESENT handler has run.
    Document { page_count: usize, pages: Vec<String> },
    /// Tabular data: header row plus data rows, both as raw strings.
    Table { header: Vec<String>, rows: Vec<Vec<String>> },
    /// A decoded raster image.
    Image { format: String, width: u32, height: u32, bytes: Vec<u8> },
    /// A downloaded HTTP response awaiting `morph` (§4.5).
    Response { status: u16, content_type: Option<String>, headers: HashMap<String, String>, body: Vec<u8> },
    /// Raw bytes with no further structure (binary fallback).
    Bytes(Vec<u8>),
    /// Already-decoded text (the common case for `.txt`/`.md`/source files).
    Text(String),
    /// A user-extended object kind. `type_name` is the qualified class name
    /// dispatch descriptors match against.
    Other { type_name: String, data: serde_json::Value },
}

impl LoadedObject {
    /// The unqualified class name used for exact-identity and class-name
    /// dispatch (precedence levels 1 and 2 in §4.2).
    pub fn class_name(&self) -> &str {
        match self {
            LoadedObject::Document { .. } => "Document",
            LoadedObject::Table { .. } => "Table",
            LoadedObject::Image { .. } => "Image",
            LoadedObject::Response { .. } => "Response",
            LoadedObject::Bytes(_) => "Bytes",
            LoadedObject::Text(_) => "Text",
            LoadedObject::Other { type_name, .. } => type_name.as_str(),
        }
    }

    /// The qualified class name (`family.ClassName`) used for regex dispatch
    /// (precedence level 4 in §4.2), and for subtype checks (level 3).
    pub fn qualified_class_name(&self) -> String {
        format!("{}.{}", self.family(), self.class_name())
    }

    /// The broader family a variant belongs to, used for "subtype of"
    /// dispatch without relying on a runtime class hierarchy (§9).
    pub fn family(&self) -> &str {
        match self {
            LoadedObject::Document { .. } => "document",
            LoadedObject::Table { .. } => "table",
            LoadedObject::Image { .. } => "image",
            LoadedObject::Response { .. } => "response",
            LoadedObject::Bytes(_) => "bytes",
            LoadedObject::Text(_) => "text",
            LoadedObject::Other { .. } => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_class_name_combines_family_and_class() {
        let obj = LoadedObject::Image { format: "PNG".into(), width: 1, height: 1, bytes: vec![] };
        assert_eq!(obj.qualified_class_name(), "image.Image");
    }
}
