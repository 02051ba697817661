// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Processor Registry (C8)
//!
//! Precomposed pipelines bound to a match predicate (§4.6): a processor
//! decides whether it applies to a given source by inspecting the raw
//! `input`/`path`/DSL commands before any loader runs, not by dispatching
//! on a `LoadedObject` (that happens once LOAD has actually run, one layer
//! down in `dispatch_service`). Exactly one processor may be marked
//! `primary`; it is the one `Attachments::new` falls back to when nothing
//! more specific matches.

use attachments_domain::Attachment;

use crate::application::services::pipeline_engine::FallbackPipeline;

/// A source-matching predicate evaluated against the still-unloaded
/// `Attachment` (its `input`, `path`, and parsed DSL `commands`).
pub type ProcessorMatchFn = fn(&Attachment) -> bool;

pub struct ProcessorRecord {
    pub name: &'static str,
    pub is_primary: bool,
    pub matches: ProcessorMatchFn,
    pub build: fn() -> FallbackPipeline,
}

#[derive(Default)]
pub struct ProcessorRegistry {
    records: Vec<ProcessorRecord>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a processor. Re-registering under the same `name` replaces
    /// the existing record, mirroring `HandlerRegistry`'s replace-by-name
    /// semantics (§5).
    pub fn register(&mut self, record: ProcessorRecord) {
        self.records.retain(|r| r.name != record.name);
        self.records.push(record);
    }

    /// The first non-primary processor (in registration order) whose
    /// `matches` predicate accepts `att`, per §4.6's "most specific first"
    /// resolution - primaries are only ever consulted as the final resort.
    pub fn resolve(&self, att: &Attachment) -> &ProcessorRecord {
        self.records
            .iter()
            .find(|r| !r.is_primary && (r.matches)(att))
            .or_else(|| self.records.iter().find(|r| r.is_primary))
            .unwrap_or_else(|| &self.records[0])
    }

    pub fn find(&self, name: &str) -> Option<&ProcessorRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::pipeline_engine::{Pipeline, VerbStep};

    fn always(_: &Attachment) -> bool {
        true
    }

    fn never(_: &Attachment) -> bool {
        false
    }

    fn trivial_pipeline() -> FallbackPipeline {
        FallbackPipeline::new(Pipeline::verb(VerbStep::LoadAuto))
    }

    #[test]
    fn falls_back_to_primary_when_nothing_specific_matches() {
        let mut registry = ProcessorRegistry::new();
        registry.register(ProcessorRecord { name: "specific", is_primary: false, matches: never, build: trivial_pipeline });
        registry.register(ProcessorRecord { name: "universal", is_primary: true, matches: always, build: trivial_pipeline });
        let att = Attachment::new("a.txt").unwrap();
        assert_eq!(registry.resolve(&att).name, "universal");
    }

    #[test]
    fn prefers_specific_match_over_primary() {
        let mut registry = ProcessorRegistry::new();
        registry.register(ProcessorRecord { name: "universal", is_primary: true, matches: always, build: trivial_pipeline });
        registry.register(ProcessorRecord { name: "specific", is_primary: false, matches: always, build: trivial_pipeline });
        let att = Attachment::new("a.txt").unwrap();
        assert_eq!(registry.resolve(&att).name, "specific");
    }
}
