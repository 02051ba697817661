// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Registry (C3)
//!
//! The six keyed tables from §3/§4.2: one `Vec` per verb kind, each entry
//! pairing a `HandlerRegistration` with the concrete function pointer that
//! implements it. This module owns only the *shape* of the registry;
//! `attachments_core::bootstrap::build_engine` is what actually populates
//! one with the built-in handlers and any discovered plugins.
//!
//! Re-registration under the same `(kind, name)` replaces the existing
//! entry atomically (§5, "intended only for test scaffolding") - `register_*`
//! methods remove any same-named entry before pushing the new one, so a
//! test can rebind `present.markdown` without restarting the process.

use attachments_domain::services::{AdaptCollectionFn, AdaptSingleFn, HandlerRegistration, LoadFn, MatchFn, ModifyFn, PresentFn, RefineFn, ReduceRefineFn, SplitFn};

use crate::infrastructure::config::AppConfig;

pub struct LoaderEntry {
    pub registration: HandlerRegistration,
    pub matcher: MatchFn,
    pub load: LoadFn,
}

pub struct ModifierEntry {
    pub registration: HandlerRegistration,
    pub modify: ModifyFn,
}

pub struct SplitterEntry {
    pub registration: HandlerRegistration,
    pub split: SplitFn,
}

pub struct PresenterEntry {
    pub registration: HandlerRegistration,
    pub present: PresentFn,
}

/// A refiner is either a plain per-`Attachment` step or a reducer that
/// folds a whole collection into one (§4.9, image tiling being the
/// motivating example). Both live in the same table; `is_reducer` on the
/// registration is what the collection engine actually branches on.
pub enum RefinerImpl {
    Single(RefineFn),
    Reduce(ReduceRefineFn),
}

pub struct RefinerEntry {
    pub registration: HandlerRegistration,
    pub implementation: RefinerImpl,
}

/// Adapters implement both the singular and collection forms (§4.10).
pub struct AdapterEntry {
    pub registration: HandlerRegistration,
    pub single: AdaptSingleFn,
    pub collection: AdaptCollectionFn,
}

#[derive(Default)]
pub struct HandlerRegistry {
    pub loaders: Vec<LoaderEntry>,
    pub modifiers: Vec<ModifierEntry>,
    pub splitters: Vec<SplitterEntry>,
    pub presenters: Vec<PresenterEntry>,
    pub refiners: Vec<RefinerEntry>,
    pub adapters: Vec<AdapterEntry>,
}

macro_rules! register_method {
    ($method:ident, $table:ident, $entry:ty) => {
        pub fn $method(&mut self, entry: $entry) {
            let name = entry.registration.name;
            self.$table.retain(|e| e.registration.name != name);
            self.$table.push(entry);
        }
    };
}

macro_rules! find_method {
    ($method:ident, $table:ident, $entry:ty) => {
        pub fn $method(&self, name: &str) -> Option<&$entry> {
            self.$table.iter().find(|e| e.registration.name == name)
        }
    };
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    register_method!(register_loader, loaders, LoaderEntry);
    register_method!(register_modifier, modifiers, ModifierEntry);
    register_method!(register_splitter, splitters, SplitterEntry);
    register_method!(register_presenter, presenters, PresenterEntry);
    register_method!(register_refiner, refiners, RefinerEntry);
    register_method!(register_adapter, adapters, AdapterEntry);

    find_method!(find_loader, loaders, LoaderEntry);
    find_method!(find_modifier, modifiers, ModifierEntry);
    find_method!(find_splitter, splitters, SplitterEntry);
    find_method!(find_presenter, presenters, PresenterEntry);
    find_method!(find_refiner, refiners, RefinerEntry);
    find_method!(find_adapter, adapters, AdapterEntry);
}

/// The immutable, process-wide handle Design Note §9 calls for: a
/// registry, a processor registry, and the resolved configuration, built
/// once and shared behind an `Arc` (no mutable globals in production
/// paths).
pub struct Engine {
    pub registry: HandlerRegistry,
    pub processors: super::processor_registry::ProcessorRegistry,
    pub config: AppConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use attachments_domain::services::VerbKind;
    use attachments_domain::{Attachment, AttachmentError};

    fn noop_match(_: &Attachment) -> bool {
        true
    }

    fn noop_load(_: &mut Attachment) -> Result<(), AttachmentError> {
        Ok(())
    }

    #[test]
    fn re_registration_replaces_by_name() {
        let mut registry = HandlerRegistry::new();
        registry.register_loader(LoaderEntry {
            registration: HandlerRegistration::new(VerbKind::Load, "text"),
            matcher: noop_match,
            load: noop_load,
        });
        registry.register_loader(LoaderEntry {
            registration: HandlerRegistration::new(VerbKind::Load, "text"),
            matcher: noop_match,
            load: noop_load,
        });
        assert_eq!(registry.loaders.len(), 1);
    }

    #[test]
    fn find_by_name_after_registration() {
        let mut registry = HandlerRegistry::new();
        registry.register_loader(LoaderEntry {
            registration: HandlerRegistration::new(VerbKind::Load, "text"),
            matcher: noop_match,
            load: noop_load,
        });
        assert!(registry.find_loader("text").is_some());
        assert!(registry.find_loader("pdf").is_none());
    }
}
