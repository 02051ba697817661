// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Built-in SPLIT handlers (§4.7): text splitters that chunk a loaded
//! `Text` object (falling back to `att.text` when a PRESENT has already
//! run instead), document splitters that chunk an already-loaded
//! `Document`'s pages, and
//! data splitters that chunk a `Table`'s rows or columns. Every handler
//! here is read-only over its input `Attachment` - `AttachmentCollection::
//! from_split` is what actually stamps `original_path`/`chunk_index`/
//! `total_chunks` and copies `commands` into each chunk.

use once_cell::sync::Lazy;
use regex::Regex;

use attachments_domain::services::{as_readable_text, HandlerRegistration, ParamKind, ParamSpec, VerbKind};
use attachments_domain::value_objects::DispatchDescriptor;
use attachments_domain::{Attachment, AttachmentCollection, AttachmentError, LoadedObject};

use crate::application::services::registry::{HandlerRegistry, SplitterEntry};

pub fn register(registry: &mut HandlerRegistry) {
    registry.register_splitter(SplitterEntry {
        registration: HandlerRegistration { dispatch_type: Some(DispatchDescriptor::subtype("text")), ..HandlerRegistration::new(VerbKind::Split, "paragraphs") },
        split: split_paragraphs,
    });
    registry.register_splitter(SplitterEntry {
        registration: HandlerRegistration { dispatch_type: Some(DispatchDescriptor::subtype("text")), ..HandlerRegistration::new(VerbKind::Split, "sentences") },
        split: split_sentences,
    });
    registry.register_splitter(SplitterEntry {
        registration: HandlerRegistration {
            dispatch_type: Some(DispatchDescriptor::subtype("text")),
            params: TOKENS_PARAMS,
            ..HandlerRegistration::new(VerbKind::Split, "tokens")
        },
        split: split_tokens,
    });
    registry.register_splitter(SplitterEntry {
        registration: HandlerRegistration {
            dispatch_type: Some(DispatchDescriptor::subtype("text")),
            params: WIDTH_PARAMS,
            ..HandlerRegistration::new(VerbKind::Split, "characters")
        },
        split: split_characters,
    });
    registry.register_splitter(SplitterEntry {
        registration: HandlerRegistration { dispatch_type: Some(DispatchDescriptor::subtype("text")), ..HandlerRegistration::new(VerbKind::Split, "lines") },
        split: split_lines,
    });
    registry.register_splitter(SplitterEntry {
        registration: HandlerRegistration {
            dispatch_type: Some(DispatchDescriptor::subtype("text")),
            params: SEPARATOR_PARAMS,
            ..HandlerRegistration::new(VerbKind::Split, "custom")
        },
        split: split_custom,
    });
    registry.register_splitter(SplitterEntry {
        registration: HandlerRegistration { dispatch_type: Some(DispatchDescriptor::subtype("document")), ..HandlerRegistration::new(VerbKind::Split, "pages") },
        split: split_pages,
    });
    registry.register_splitter(SplitterEntry {
        registration: HandlerRegistration { dispatch_type: Some(DispatchDescriptor::subtype("document")), ..HandlerRegistration::new(VerbKind::Split, "slides") },
        split: split_slides,
    });
    registry.register_splitter(SplitterEntry {
        registration: HandlerRegistration { dispatch_type: Some(DispatchDescriptor::subtype("text")), ..HandlerRegistration::new(VerbKind::Split, "sections") },
        split: split_sections,
    });
    registry.register_splitter(SplitterEntry {
        registration: HandlerRegistration {
            dispatch_type: Some(DispatchDescriptor::subtype("table")),
            params: ROWS_PARAMS,
            ..HandlerRegistration::new(VerbKind::Split, "rows")
        },
        split: split_rows,
    });
    registry.register_splitter(SplitterEntry {
        registration: HandlerRegistration { dispatch_type: Some(DispatchDescriptor::subtype("table")), ..HandlerRegistration::new(VerbKind::Split, "columns") },
        split: split_columns,
    });
}

const TOKENS_PARAMS: &[ParamSpec] = &[ParamSpec::new("tokens", ParamKind::Int).with_default("256")];
const WIDTH_PARAMS: &[ParamSpec] = &[ParamSpec::new("width", ParamKind::Int).with_default("1000")];
const SEPARATOR_PARAMS: &[ParamSpec] = &[ParamSpec::new("separator", ParamKind::String).with_default(",")];
const ROWS_PARAMS: &[ParamSpec] = &[ParamSpec::new("size", ParamKind::Int).with_default("100")];

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").expect("static regex is valid"));
static HEADING_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s+.*$").expect("static regex is valid"));

/// The payload a text splitter chunks: the loaded object's text when a
/// LOAD produced one directly (e.g. `load.text >> split.paragraphs`, with
/// no intervening PRESENT to populate `att.text`), falling back to
/// whatever `att.text` already holds otherwise.
fn source_text(att: &Attachment) -> &str {
    att.obj.as_ref().and_then(as_readable_text).unwrap_or(att.text.as_str())
}

fn text_chunks(att: &Attachment, kind: &str, pieces: Vec<String>) -> Result<AttachmentCollection, AttachmentError> {
    let chunks: Result<Vec<Attachment>, AttachmentError> = pieces
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .map(|piece| {
            let mut chunk = Attachment::new(&att.path)?;
            chunk.append_text(piece.trim());
            Ok(chunk)
        })
        .collect();
    Ok(AttachmentCollection::from_split(att, kind, chunks?))
}

fn split_paragraphs(att: &Attachment) -> Result<AttachmentCollection, AttachmentError> {
    let pieces = PARAGRAPH_BREAK.split(source_text(att)).map(str::to_string).collect();
    text_chunks(att, "paragraph", pieces)
}

/// Splits after `.`/`!`/`?` followed by whitespace (or end of input). The
/// `regex` crate has no look-behind, so this walks characters directly
/// rather than trying to express the rule as one pattern; it operates on
/// `char`s throughout, so it never splits a multi-byte Unicode letter.
fn split_sentences(att: &Attachment) -> Result<AttachmentCollection, AttachmentError> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut chars = source_text(att).chars().peekable();
    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().is_none_or(|next| next.is_whitespace()) {
            pieces.push(std::mem::take(&mut current));
        }
    }
    if !current.trim().is_empty() {
        pieces.push(current);
    }
    text_chunks(att, "sentence", pieces)
}

/// Chunk size approximated as `chars ÷ 4` per token, matching the
/// spec's own rule of thumb rather than a real tokenizer.
fn split_tokens(att: &Attachment) -> Result<AttachmentCollection, AttachmentError> {
    let tokens = att.commands.get_int("tokens").unwrap_or(256).max(1) as usize;
    let chars_per_chunk = tokens.saturating_mul(4).max(1);
    let pieces: Vec<String> = source_text(att).chars().collect::<Vec<_>>().chunks(chars_per_chunk).map(|c| c.iter().collect()).collect();
    text_chunks(att, "token", pieces)
}

fn split_characters(att: &Attachment) -> Result<AttachmentCollection, AttachmentError> {
    let width = att.commands.get_int("width").unwrap_or(1000).max(1) as usize;
    let pieces: Vec<String> = source_text(att).chars().collect::<Vec<_>>().chunks(width).map(|c| c.iter().collect()).collect();
    text_chunks(att, "character", pieces)
}

fn split_lines(att: &Attachment) -> Result<AttachmentCollection, AttachmentError> {
    let pieces = source_text(att).lines().map(str::to_string).collect();
    text_chunks(att, "line", pieces)
}

fn split_custom(att: &Attachment) -> Result<AttachmentCollection, AttachmentError> {
    let separator = att.commands.get("separator").unwrap_or(",").to_string();
    let pieces = source_text(att).split(separator.as_str()).map(str::to_string).collect();
    text_chunks(att, "custom", pieces)
}

/// Splits on markdown-style heading lines (`#`.. `######`) as an honest
/// stand-in for "HTML by heading levels" - no HTML parser is part of this
/// crate's dependency stack, and the source text is already plain text by
/// the time a splitter runs.
fn split_sections(att: &Attachment) -> Result<AttachmentCollection, AttachmentError> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for line in source_text(att).lines() {
        if HEADING_LINE.is_match(line) && !current.trim().is_empty() {
            pieces.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    if !current.trim().is_empty() {
        pieces.push(current);
    }
    text_chunks(att, "section", pieces)
}

fn split_pages(att: &Attachment) -> Result<AttachmentCollection, AttachmentError> {
    split_document_by(att, "page")
}

fn split_slides(att: &Attachment) -> Result<AttachmentCollection, AttachmentError> {
    split_document_by(att, "slide")
}

fn split_document_by(att: &Attachment, kind: &str) -> Result<AttachmentCollection, AttachmentError> {
    let Some(LoadedObject::Document { pages, .. }) = &att.obj else {
        return Ok(AttachmentCollection::from_split(att, kind, Vec::new()));
    };
    let chunks: Result<Vec<Attachment>, AttachmentError> = pages
        .iter()
        .map(|page| {
            let mut chunk = Attachment::new(&att.path)?;
            chunk.append_text(page);
            Ok(chunk)
        })
        .collect();
    Ok(AttachmentCollection::from_split(att, kind, chunks?))
}

fn split_rows(att: &Attachment) -> Result<AttachmentCollection, AttachmentError> {
    let Some(LoadedObject::Table { header, rows }) = &att.obj else {
        return Ok(AttachmentCollection::from_split(att, "row", Vec::new()));
    };
    let size = att.commands.get_int("size").unwrap_or(100).max(1) as usize;
    let chunks: Result<Vec<Attachment>, AttachmentError> = rows
        .chunks(size)
        .map(|group| {
            let mut chunk = Attachment::new(&att.path)?;
            chunk.obj = Some(LoadedObject::Table { header: header.clone(), rows: group.to_vec() });
            Ok(chunk)
        })
        .collect();
    Ok(AttachmentCollection::from_split(att, "row", chunks?))
}

fn split_columns(att: &Attachment) -> Result<AttachmentCollection, AttachmentError> {
    let Some(LoadedObject::Table { header, rows }) = &att.obj else {
        return Ok(AttachmentCollection::from_split(att, "column", Vec::new()));
    };
    let chunks: Result<Vec<Attachment>, AttachmentError> = header
        .iter()
        .enumerate()
        .map(|(index, column_name)| {
            let mut chunk = Attachment::new(&att.path)?;
            let column_values: Vec<Vec<String>> = rows.iter().map(|row| vec![row.get(index).cloned().unwrap_or_default()]).collect();
            chunk.obj = Some(LoadedObject::Table { header: vec![column_name.clone()], rows: column_values });
            Ok(chunk)
        })
        .collect();
    Ok(AttachmentCollection::from_split(att, "column", chunks?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let mut att = Attachment::new("a.txt").unwrap();
        att.append_text("first\n\nsecond\n\nthird");
        let collection = split_paragraphs(&att).unwrap();
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.iter().next().unwrap().text, "first");
    }

    #[test]
    fn sentences_split_on_terminal_punctuation() {
        let mut att = Attachment::new("a.txt").unwrap();
        att.append_text("Hello world. How are you? Fine!");
        let collection = split_sentences(&att).unwrap();
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn tokens_uses_the_chars_over_four_approximation() {
        let mut att = Attachment::new("a.txt").unwrap();
        att.commands.insert("tokens", "2");
        att.append_text("12345678");
        let collection = split_tokens(&att).unwrap();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.iter().next().unwrap().text, "12345678");
    }

    #[test]
    fn pages_produces_one_chunk_per_document_page() {
        let mut att = Attachment::new("report.pdf").unwrap();
        att.obj = Some(LoadedObject::Document { page_count: 2, pages: vec!["p1".into(), "p2".into()] });
        let collection = split_pages(&att).unwrap();
        assert_eq!(collection.len(), 2);
        assert!(collection.iter().next().unwrap().path.ends_with("#page-1"));
    }

    #[test]
    fn rows_chunks_by_the_declared_size() {
        let mut att = Attachment::new("data.csv").unwrap();
        att.commands.insert("size", "2");
        att.obj = Some(LoadedObject::Table {
            header: vec!["a".into()],
            rows: vec![vec!["1".into()], vec!["2".into()], vec!["3".into()]],
        });
        let collection = split_rows(&att).unwrap();
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn columns_produces_one_chunk_per_header_entry() {
        let mut att = Attachment::new("data.csv").unwrap();
        att.obj = Some(LoadedObject::Table {
            header: vec!["a".into(), "b".into()],
            rows: vec![vec!["1".into(), "2".into()]],
        });
        let collection = split_columns(&att).unwrap();
        assert_eq!(collection.len(), 2);
    }
}
