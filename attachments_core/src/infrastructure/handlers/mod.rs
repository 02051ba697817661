// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Built-in Handlers (C11)
//!
//! The "minimal adapters exposing LOAD/MODIFY/SPLIT/PRESENT/REFINE/ADAPT to
//! external format code" the component table calls for. Concrete format
//! fidelity (real PDF/DOCX/CSV parsing) is explicitly out of scope; each
//! loader below is an honest, minimal stand-in sufficient to exercise the
//! rest of the engine end to end, not a commitment to format correctness.
//! `register_all` wires every one of them into a fresh `HandlerRegistry` in
//! the order `bootstrap::build_engine` needs.

mod adapters;
mod loaders;
mod modifiers;
mod presenters;
mod refiners;
mod splitters;

use once_cell::sync::OnceCell;

use crate::application::services::registry::HandlerRegistry;
use crate::infrastructure::config::AppConfig;

static ACTIVE_CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// Publishes the resolved configuration for handlers that need a value no
/// DSL parameter carries (the REFINE truncation default, §9 Open Questions).
/// Handler bodies are plain function pointers with no captured state, so
/// this is the one place a process-wide, write-once cell stands in for
/// what would otherwise be a closure - set once by `build_engine`, read
/// many times, never mutated afterward.
pub(crate) fn set_active_config(config: AppConfig) {
    let _ = ACTIVE_CONFIG.set(config);
}

/// Falls back to `AppConfig::default()` for handler unit tests that invoke
/// a handler directly without going through `build_engine`.
pub(crate) fn active_config() -> AppConfig {
    ACTIVE_CONFIG.get().cloned().unwrap_or_default()
}

pub fn register_all(registry: &mut HandlerRegistry) {
    loaders::register(registry);
    modifiers::register(registry);
    splitters::register(registry);
    presenters::register(registry);
    refiners::register(registry);
    adapters::register(registry);
}

/// Lowercased file extension, without the leading dot, or the empty string.
pub(crate) fn extension_of(path: &str) -> String {
    std::path::Path::new(path)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("")
        .to_ascii_lowercase()
}
