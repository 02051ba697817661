// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # High-Level API (C9)
//!
//! `Attachments::process(sources, engine)` is the one call most callers
//! ever make: for each source, pick a processor (§4.6), run its
//! fallback-guarded pipeline, and collect the results. `.text()`/`.images()`
//! aggregate across every source in order; the `.chat()`/`.responses()`/
//! `.claude()` convenience methods are thin wrappers over the generic
//! `.adapt(name, prompt)` for the three built-in ADAPT handlers (§4.10) - a
//! plugin-provided adapter is still reachable through `.adapt`, just without
//! its own dedicated method, since those can't be generated at compile time.

use attachments_domain::{Attachment, AttachmentError, DataUrlImage};

use crate::application::services::pipeline_engine::{carries_blocking_error, ExecutionContext, Item};
use crate::application::services::registry::Engine;

/// The result of running one or more sources through their resolved
/// processors. Each member is independently either a single `Attachment`
/// or the `AttachmentCollection` a SPLIT produced.
pub struct Attachments {
    items: Vec<Item>,
}

impl Attachments {
    /// Runs every source through its resolved processor's fallback
    /// pipeline (§4.6), using a fresh `ExecutionContext` with no
    /// cancellation flag attached.
    pub fn process<S: AsRef<str>>(sources: impl IntoIterator<Item = S>, engine: &Engine) -> Result<Self, AttachmentError> {
        Self::process_with(sources, engine, &ExecutionContext::new())
    }

    /// Same as `process`, but threading a caller-supplied `ExecutionContext`
    /// (so a long-running batch can be cancelled cooperatively, §5).
    pub fn process_with<S: AsRef<str>>(sources: impl IntoIterator<Item = S>, engine: &Engine, ctx: &ExecutionContext) -> Result<Self, AttachmentError> {
        let mut items = Vec::new();
        for source in sources {
            let att = Attachment::new(source.as_ref())?;
            let processor = engine.processors.resolve(&att);
            let pipeline = (processor.build)();
            items.push(pipeline.run(Item::Single(att), engine, ctx)?);
        }
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Concatenates the extracted text of every source/chunk in order,
    /// separated by a blank line (the same join rule `Attachment::append_text`
    /// uses internally, §4.1).
    pub fn text(&self) -> String {
        let mut out = String::new();
        for item in &self.items {
            let piece = match item {
                Item::Single(att) => att.text.clone(),
                Item::Collection(collection) => collection.concatenated_text(),
            };
            if piece.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push_str("\n\n");
            }
            out.push_str(&piece);
        }
        out
    }

    /// Every image extracted across every source/chunk, in order.
    pub fn images(&self) -> Vec<DataUrlImage> {
        let mut out = Vec::new();
        for item in &self.items {
            match item {
                Item::Single(att) => out.extend(att.images.iter().cloned()),
                Item::Collection(collection) => out.extend(collection.flattened_images()),
            }
        }
        out
    }

    /// Runs the named ADAPT handler (§4.10) against every source/chunk and
    /// returns one envelope per item, in order. A reducer adapter (every
    /// built-in one is) collapses an `Item::Collection` into one envelope.
    pub fn adapt(&self, name: &str, prompt: &str, engine: &Engine) -> Vec<serde_json::Value> {
        let mut out = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let envelope = match engine.registry.find_adapter(name) {
                Some(entry) => match item {
                    Item::Single(att) => (entry.single)(att, prompt),
                    Item::Collection(collection) => (entry.collection)(collection, prompt),
                },
                None => serde_json::json!({ "error": format!("no adapter named `{name}` is registered") }),
            };
            out.push(envelope);
        }
        out
    }

    pub fn chat(&self, prompt: &str, engine: &Engine) -> Vec<serde_json::Value> {
        self.adapt("chat", prompt, engine)
    }

    pub fn responses(&self, prompt: &str, engine: &Engine) -> Vec<serde_json::Value> {
        self.adapt("responses", prompt, engine)
    }

    pub fn claude(&self, prompt: &str, engine: &Engine) -> Vec<serde_json::Value> {
        self.adapt("claude", prompt, engine)
    }

    /// Whether any source still carries a `LoaderUnavailable`/`DependencyMissing`
    /// error after every fallback was exhausted (§6, exit code 1).
    pub fn has_blocking_errors(&self) -> bool {
        self.items.iter().any(carries_blocking_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::AppConfig;
    use crate::bootstrap::build_engine;

    #[test]
    fn processing_a_source_resolves_a_processor_and_runs_to_completion() {
        let engine = build_engine(AppConfig::default());
        let attachments = Attachments::process(["nonexistent-notes.txt"], &engine).unwrap();
        assert_eq!(attachments.len(), 1);
    }

    #[test]
    fn empty_source_list_yields_empty_aggregation() {
        let engine = build_engine(AppConfig::default());
        let attachments = Attachments::process(Vec::<&str>::new(), &engine).unwrap();
        assert!(attachments.is_empty());
        assert_eq!(attachments.text(), "");
        assert!(attachments.images().is_empty());
    }
}
