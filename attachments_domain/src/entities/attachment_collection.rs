// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # AttachmentCollection
//!
//! The ordered sequence of `Attachment`s a SPLIT handler produces (§3, §4.7).
//! Order is producer-defined (page order, paragraph order, ...) and is
//! preserved by every elementwise operation performed over the collection
//! (§4.4, §8's "order preservation" property).

use crate::entities::attachment::Attachment;
use crate::value_objects::MetadataValue;

#[derive(Debug, Clone)]
pub struct AttachmentCollection {
    chunks: Vec<Attachment>,
}

impl AttachmentCollection {
    /// Builds a collection from chunks already carrying `original_path`,
    /// `chunk_index`, and `total_chunks` metadata and copied `commands`
    /// (the invariants a SPLIT handler must establish, §3).
    pub fn new(chunks: Vec<Attachment>) -> Self {
        Self { chunks }
    }

    /// Convenience constructor that stamps the three required metadata keys
    /// and copies `commands` from `source` into each chunk, so SPLIT
    /// handlers only need to supply path/obj/text.
    pub fn from_split(source: &Attachment, kind: &str, mut chunks: Vec<Attachment>) -> Self {
        let total = chunks.len();
        for (index, chunk) in chunks.iter_mut().enumerate() {
            chunk.path = format!("{}#{kind}-{}", source.path, index + 1);
            chunk.commands = source.commands.clone();
            chunk.metadata.insert("original_path".to_string(), MetadataValue::Str(source.path.clone()));
            chunk.metadata.insert("chunk_index".to_string(), MetadataValue::Int(index as i64));
            chunk.metadata.insert("total_chunks".to_string(), MetadataValue::Int(total as i64));
        }
        Self { chunks }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
        self.chunks.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Attachment> {
        self.chunks.iter_mut()
    }

    pub fn into_vec(self) -> Vec<Attachment> {
        self.chunks
    }

    pub fn as_slice(&self) -> &[Attachment] {
        &self.chunks
    }

    /// Concatenates every chunk's text with a chunk-boundary header, in
    /// chunk order - used by adapters (§4.10: "concatenate `text` (with
    /// chunk headers)") and the high-level API's `.text`. Header format
    /// matches `refine.tile`'s `--- chunk N ---`.
    pub fn concatenated_text(&self) -> String {
        self.chunks
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.text.is_empty())
            .map(|(index, c)| format!("--- chunk {} ---\n{}", index + 1, c.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn flattened_images(&self) -> Vec<crate::entities::attachment::DataUrlImage> {
        self.chunks.iter().flat_map(|c| c.images.iter().cloned()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_split_stamps_required_metadata_in_order() {
        let source = Attachment::new("doc.txt").unwrap();
        let mut a = Attachment::new("doc.txt#paragraph-1").unwrap();
        a.append_text("A");
        let mut b = Attachment::new("doc.txt#paragraph-2").unwrap();
        b.append_text("B");
        let collection = AttachmentCollection::from_split(&source, "paragraph", vec![a, b]);

        assert_eq!(collection.len(), 2);
        let texts: Vec<&str> = collection.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "B"]);

        for (i, chunk) in collection.iter().enumerate() {
            assert_eq!(chunk.metadata.get("chunk_index").unwrap().as_int(), Some(i as i64));
            assert_eq!(chunk.metadata.get("total_chunks").unwrap().as_int(), Some(2));
            assert_eq!(chunk.metadata.get("original_path").unwrap().as_str(), Some("doc.txt"));
        }
    }
}
