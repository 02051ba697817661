// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Engine Construction
//!
//! `build_engine` is the one place that turns an `AppConfig` into a ready
//! `Engine`: a fresh `HandlerRegistry` populated with every built-in
//! handler (§C11), any plugins discovered under `config.plugin_dir`
//! (§C16), and a `ProcessorRegistry` carrying the universal fallback
//! pipeline (§4.11) as its sole, primary processor.
//!
//! This is distinct from the `attachments_bootstrap` crate, which wraps
//! this function in a process entry point (CLI parsing, signal handling,
//! platform glue); everything in this module is plain library code with
//! no knowledge of `std::env::args` or stdio.

use attachments_domain::Attachment;

use crate::application::services::pipeline_engine::{FallbackPipeline, Pipeline, VerbStep};
use crate::application::services::processor_registry::{ProcessorRecord, ProcessorRegistry};
use crate::application::services::registry::{Engine, HandlerRegistry};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::handlers;
use crate::infrastructure::registry::discover_plugins;

/// Builds the process-wide `Engine`: registry, processors, and the
/// resolved configuration, ready to hand to `Attachments::process`.
pub fn build_engine(config: AppConfig) -> Engine {
    let mut registry = HandlerRegistry::new();
    handlers::register_all(&mut registry);

    if let Some(plugin_dir) = &config.plugin_dir {
        match discover_plugins(plugin_dir, &mut registry) {
            Ok(count) => tracing::info!(plugin_dir = %plugin_dir, count, "discovered plugins"),
            Err(err) => tracing::warn!(plugin_dir = %plugin_dir, %err, "plugin discovery failed"),
        }
    }

    // Handler bodies are plain function pointers with no captured state
    // (attachments_domain's verb contracts), so the resolved config is
    // published through a process-wide cell rather than threaded as an
    // argument every handler would otherwise have to accept.
    handlers::set_active_config(config.clone());

    let mut processors = ProcessorRegistry::new();
    processors.register(ProcessorRecord { name: "universal", is_primary: true, matches: matches_everything, build: universal_pipeline });

    Engine { registry, processors, config }
}

fn matches_everything(_: &Attachment) -> bool {
    true
}

/// §4.11's universal pipeline: load, apply DSL-driven MODIFY, then a
/// category-aware additive PRESENT group, then REFINE. `present.
/// metadata_summary` always runs alongside whatever type-specific
/// presenter dispatch picked, which is what makes the PRESENT stage
/// "additive" rather than a single resolved handler.
fn universal_pipeline() -> FallbackPipeline {
    let present = Pipeline::verb(VerbStep::PresentAuto) + Pipeline::verb(VerbStep::Present("metadata_summary"));
    let primary = Pipeline::verb(VerbStep::LoadAuto)
        >> Pipeline::verb(VerbStep::ModifyAuto)
        >> present
        >> Pipeline::verb(VerbStep::Refine("tile"))
        >> Pipeline::verb(VerbStep::Refine("header"))
        >> Pipeline::verb(VerbStep::Refine("truncate"));
    FallbackPipeline::new(primary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_engine_registers_every_built_in_handler_kind() {
        let engine = build_engine(AppConfig::default());
        assert!(!engine.registry.loaders.is_empty());
        assert!(!engine.registry.modifiers.is_empty());
        assert!(!engine.registry.splitters.is_empty());
        assert!(!engine.registry.presenters.is_empty());
        assert!(!engine.registry.refiners.is_empty());
        assert!(!engine.registry.adapters.is_empty());
        assert!(!engine.processors.is_empty());
    }

    #[test]
    fn universal_processor_is_the_primary_and_matches_any_source() {
        let engine = build_engine(AppConfig::default());
        let att = Attachment::new("anything.xyz").unwrap();
        assert_eq!(engine.processors.resolve(&att).name, "universal");
    }
}
