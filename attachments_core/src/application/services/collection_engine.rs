// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Collection Semantics (C7) and Verb Invocation
//!
//! Where a `VerbStep` actually meets the registry: resolves a handler
//! (object-type dispatch for MODIFY/SPLIT/PRESENT, direct name lookup for
//! LOAD/REFINE/ADAPT - only the first three carry a `dispatch_type` per
//! §3's handler-registration table), validates its declared DSL params,
//! invokes it with the clone-then-commit-or-revert pattern that makes
//! non-fatal failures a no-op on the attachment's prior state (§4.3 "Per-
//! step error capture"), and implements the elementwise-vs-reducer lift
//! over `AttachmentCollection` (§4.4).

use attachments_domain::services::{HandlerRegistration, RefineFn};
use attachments_domain::{Attachment, AttachmentCollection, AttachmentError, MetadataValue};

use crate::application::services::dispatch_service;
use crate::application::services::pipeline_engine::{ExecutionContext, Item, Pipeline, VerbStep};
use crate::application::services::registry::{Engine, RefinerImpl};

/// Runs `f` against a clone of `att`, committing the mutation on success
/// and reverting to `att`'s own state (plus a recorded, content-carrying
/// error) on a non-fatal failure - the systems realization of "previous
/// value flows forward" (§4.3).
fn run_mutating(att: &Attachment, step_name: &str, f: impl FnOnce(&mut Attachment) -> Result<(), AttachmentError>) -> Result<Attachment, AttachmentError> {
    let mut candidate = att.clone();
    match f(&mut candidate) {
        Ok(()) => {
            candidate.record_step(step_name);
            Ok(candidate)
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            let mut degraded = att.clone();
            degraded.record_error(step_name, &e);
            degraded.append_text(&format!("[{}] {}", e.classification_keyword(), e));
            degraded.record_step(step_name);
            Ok(degraded)
        }
    }
}

fn record_dispatch_miss(att: &mut Attachment, verb: &str) {
    let note = MetadataValue::Str(format!("{verb}: no handler matched object type"));
    match att.metadata.get_mut("dispatch_notes") {
        Some(MetadataValue::List(list)) => list.push(note),
        _ => {
            att.metadata.insert("dispatch_notes".to_string(), MetadataValue::List(vec![note]));
        }
    }
}

/// Skips a presenter/refiner whose declared category is turned off by the
/// content-filter DSL (`[text:false]`, `[images:false]`, §4.8).
fn category_disabled(registration: &HandlerRegistration, att: &Attachment) -> bool {
    match registration.category {
        Some(category) => att.commands.get_bool(category.dsl_key()) == Some(false),
        None => false,
    }
}

pub fn apply(step: &VerbStep, item: Item, engine: &Engine) -> Result<Item, AttachmentError> {
    match step {
        VerbStep::LoadAuto => Ok(Item::Single(load_auto(item_into_single(item)?, engine)?)),
        VerbStep::Load(name) => Ok(Item::Single(load_named(item_into_single(item)?, name, engine)?)),
        VerbStep::ModifyAuto => apply_modify(item, engine, None),
        VerbStep::Modify(name) => apply_modify(item, engine, Some(name)),
        VerbStep::SplitAuto => apply_split(item, engine, None),
        VerbStep::Split(name) => apply_split(item, engine, Some(name)),
        VerbStep::PresentAuto => apply_present(item, engine, None),
        VerbStep::Present(name) => apply_present(item, engine, Some(name)),
        VerbStep::Refine(name) => apply_refine(item, engine, name),
        VerbStep::Adapt { name, prompt } => apply_adapt(item, engine, name, prompt),
    }
}

fn item_into_single(item: Item) -> Result<Attachment, AttachmentError> {
    match item {
        Item::Single(att) => Ok(att),
        // LOAD only makes sense before a SPLIT has happened; applying it to an
        // already-split collection is a pipeline authoring error we degrade
        // rather than panic on, by loading each chunk independently.
        Item::Collection(_) => Err(AttachmentError::HandlerFailure {
            step: "load".to_string(),
            message: "cannot LOAD into an already-split AttachmentCollection".to_string(),
        }),
    }
}

/// §4.5: tries loaders in registration order; a `DependencyMissing` loader
/// is skipped in favor of the next matching one instead of aborting the
/// search (the text-fallback loader, registered last with a catch-all
/// matcher, is what eventually guarantees this terminates).
///
/// "URL → morph → specialized by extension → text fallback" (§4.11) is one
/// loader-resolution phase, not three pipeline steps: once a loader leaves
/// behind a `Response` object (only `load.url` does), this immediately
/// applies the registered `morph` modifier - which rewrites `path` to a
/// canonical, extension-bearing filename - and searches the loader list
/// again so a specialized-by-extension loader (or, failing that, the text
/// fallback) picks up the downloaded bytes. The search runs at most twice:
/// a second `Response` could only come from `load.url` matching again,
/// which `matches_url`'s `obj.is_none()` guard rules out once morph has run.
fn load_auto(mut att: Attachment, engine: &Engine) -> Result<Attachment, AttachmentError> {
    loop {
        let mut loaded = None;
        for entry in &engine.registry.loaders {
            if !(entry.matcher)(&att) {
                continue;
            }
            let mut candidate = att.clone();
            match (entry.load)(&mut candidate) {
                Ok(()) => {
                    candidate.record_step(format!("load.{}", entry.registration.name));
                    loaded = Some(candidate);
                    break;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => att.record_error(&format!("load.{}", entry.registration.name), &e),
            }
        }
        let Some(loaded) = loaded else {
            let err = AttachmentError::LoaderUnavailable { path: att.path.clone(), reason: "no loader produced a usable object".to_string() };
            att.append_text(&format!("[{}] {}", err.classification_keyword(), err));
            att.record_error("load.auto", &err);
            att.record_step("load.auto");
            return Ok(att);
        };
        let is_response = matches!(loaded.obj, Some(attachments_domain::LoadedObject::Response { .. }));
        match (is_response, engine.registry.find_modifier("morph")) {
            (true, Some(morph)) => att = run_mutating(&loaded, "modify.morph", morph.modify)?,
            _ => return Ok(loaded),
        }
    }
}

fn load_named(att: Attachment, name: &str, engine: &Engine) -> Result<Attachment, AttachmentError> {
    let Some(entry) = engine.registry.find_loader(name) else {
        let mut out = att;
        let err = AttachmentError::LoaderUnavailable { path: out.path.clone(), reason: format!("no loader named `{name}` is registered") };
        out.append_text(&format!("[{}] {}", err.classification_keyword(), err));
        out.record_error("load", &err);
        return Ok(out);
    };
    run_mutating(&att, &format!("load.{name}"), entry.load)
}

/// Resolves a MODIFY handler either by explicit name (gated by its own
/// `dispatch_type`, if any) or, when `name` is `None`, by full
/// object-type dispatch precedence (§4.2) over every registered
/// modifier - how the universal pipeline's unnamed "MODIFY (DSL-driven)"
/// step (§4.11) picks a handler without knowing in advance what `obj`
/// will hold.
fn resolve_modifier<'a>(engine: &'a Engine, name: Option<&str>, obj: &attachments_domain::LoadedObject) -> Option<&'a crate::application::services::registry::ModifierEntry> {
    match name {
        Some(n) => engine.registry.find_modifier(n).filter(|e| e.registration.dispatch_type.as_ref().is_none_or(|d| d.matches(obj))),
        None => dispatch_service::resolve_by_obj(&engine.registry.modifiers, obj, |e| &e.registration),
    }
}

fn resolve_presenter<'a>(engine: &'a Engine, name: Option<&str>, obj: &attachments_domain::LoadedObject) -> Option<&'a crate::application::services::registry::PresenterEntry> {
    match name {
        Some(n) => engine.registry.find_presenter(n).filter(|e| e.registration.dispatch_type.as_ref().is_none_or(|d| d.matches(obj))),
        None => dispatch_service::resolve_by_obj(&engine.registry.presenters, obj, |e| &e.registration),
    }
}

fn resolve_splitter<'a>(engine: &'a Engine, name: Option<&str>, obj: &attachments_domain::LoadedObject) -> Option<&'a crate::application::services::registry::SplitterEntry> {
    match name {
        Some(n) => engine.registry.find_splitter(n).filter(|e| e.registration.dispatch_type.as_ref().is_none_or(|d| d.matches(obj))),
        None => dispatch_service::resolve_by_obj(&engine.registry.splitters, obj, |e| &e.registration),
    }
}

fn apply_modify(item: Item, engine: &Engine, name: Option<&str>) -> Result<Item, AttachmentError> {
    match item {
        Item::Single(att) => Ok(Item::Single(modify_single(att, engine, name)?)),
        Item::Collection(collection) => {
            let mut chunks = Vec::with_capacity(collection.len());
            for chunk in collection.into_vec() {
                chunks.push(modify_single(chunk, engine, name)?);
            }
            Ok(Item::Collection(AttachmentCollection::new(chunks)))
        }
    }
}

fn modify_single(mut att: Attachment, engine: &Engine, name: Option<&str>) -> Result<Attachment, AttachmentError> {
    let label = name.unwrap_or("auto");
    let Some(obj) = att.obj.clone() else {
        record_dispatch_miss(&mut att, &format!("modify.{label}"));
        return Ok(att);
    };
    let Some(entry) = resolve_modifier(engine, name, &obj) else {
        record_dispatch_miss(&mut att, &format!("modify.{label}"));
        return Ok(att);
    };
    dispatch_service::validate_params(entry.registration.params, &att.commands)?;
    run_mutating(&att, &format!("modify.{}", entry.registration.name), entry.modify)
}

fn apply_present(item: Item, engine: &Engine, name: Option<&str>) -> Result<Item, AttachmentError> {
    match item {
        Item::Single(att) => Ok(Item::Single(present_single(att, engine, name)?)),
        Item::Collection(collection) => {
            let mut chunks = Vec::with_capacity(collection.len());
            for chunk in collection.into_vec() {
                chunks.push(present_single(chunk, engine, name)?);
            }
            Ok(Item::Collection(AttachmentCollection::new(chunks)))
        }
    }
}

fn present_single(mut att: Attachment, engine: &Engine, name: Option<&str>) -> Result<Attachment, AttachmentError> {
    let label = name.unwrap_or("auto");
    let Some(obj) = att.obj.clone() else {
        record_dispatch_miss(&mut att, &format!("present.{label}"));
        return Ok(att);
    };
    let Some(entry) = resolve_presenter(engine, name, &obj) else {
        record_dispatch_miss(&mut att, &format!("present.{label}"));
        return Ok(att);
    };
    if category_disabled(&entry.registration, &att) {
        return Ok(att);
    }
    dispatch_service::validate_params(entry.registration.params, &att.commands)?;
    run_mutating(&att, &format!("present.{}", entry.registration.name), entry.present)
}

fn apply_split(item: Item, engine: &Engine, name: Option<&str>) -> Result<Item, AttachmentError> {
    let Item::Single(mut att) = item else {
        // Splitting an already-split collection further is out of scope
        // (§1 non-goals territory); pass it through unchanged.
        return Ok(item);
    };
    let label = name.unwrap_or("auto");
    let Some(obj) = att.obj.clone() else {
        record_dispatch_miss(&mut att, &format!("split.{label}"));
        return Ok(Item::Single(att));
    };
    let Some(entry) = resolve_splitter(engine, name, &obj) else {
        record_dispatch_miss(&mut att, &format!("split.{label}"));
        return Ok(Item::Single(att));
    };
    dispatch_service::validate_params(entry.registration.params, &att.commands)?;
    let handler_name = entry.registration.name;
    match (entry.split)(&att) {
        Ok(collection) => Ok(Item::Collection(collection)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            att.record_error(&format!("split.{handler_name}"), &e);
            att.append_text(&format!("[{}] {}", e.classification_keyword(), e));
            Ok(Item::Single(att))
        }
    }
}

/// REFINE handlers are looked up by name (not object-type dispatch -
/// they act on already-extracted `text`/`images`, not on `obj`). A
/// reducer refiner (tiling) ignores the elementwise/reducer distinction
/// drawn for a plain presenter: applied to a collection it is always
/// invoked once with the whole collection (§4.4 "Reducer short-circuit").
fn apply_refine(item: Item, engine: &Engine, name: &str) -> Result<Item, AttachmentError> {
    let Some(entry) = engine.registry.find_refiner(name) else {
        return Ok(item);
    };
    match (&entry.implementation, item) {
        (RefinerImpl::Single(f), Item::Single(att)) => Ok(Item::Single(run_refine(&att, name, *f)?)),
        (RefinerImpl::Single(f), Item::Collection(collection)) => {
            let mut chunks = Vec::with_capacity(collection.len());
            for chunk in collection.into_vec() {
                chunks.push(run_refine(&chunk, name, *f)?);
            }
            Ok(Item::Collection(AttachmentCollection::new(chunks)))
        }
        (RefinerImpl::Reduce(f), Item::Collection(collection)) => Ok(Item::Single(run_reduce(&collection, name, *f)?)),
        (RefinerImpl::Reduce(f), Item::Single(att)) => {
            let singleton = AttachmentCollection::new(vec![att]);
            Ok(Item::Single(run_reduce(&singleton, name, *f)?))
        }
    }
}

fn run_refine(att: &Attachment, name: &str, f: RefineFn) -> Result<Attachment, AttachmentError> {
    dispatch_service::validate_params(&[], &att.commands)?;
    run_mutating(att, &format!("refine.{name}"), f)
}

fn run_reduce(collection: &AttachmentCollection, name: &str, f: attachments_domain::services::ReduceRefineFn) -> Result<Attachment, AttachmentError> {
    match f(collection) {
        Ok(mut result) => {
            result.record_step(format!("refine.{name}"));
            Ok(result)
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            // No sensible "previous attachment" exists for a reducer with no
            // single input; synthesize one from the first chunk, if any.
            let mut degraded = collection.iter().next().cloned().unwrap_or(Attachment::new("(empty collection)")?);
            degraded.record_error(&format!("refine.{name}"), &e);
            degraded.append_text(&format!("[{}] {}", e.classification_keyword(), e));
            Ok(degraded)
        }
    }
}

fn apply_adapt(item: Item, engine: &Engine, name: &str, prompt: &str) -> Result<Item, AttachmentError> {
    let Some(entry) = engine.registry.find_adapter(name) else {
        return Err(AttachmentError::HandlerFailure { step: format!("adapt.{name}"), message: format!("no adapter named `{name}` is registered") });
    };
    let envelope = match item {
        Item::Single(ref att) => (entry.single)(att, prompt),
        Item::Collection(ref collection) => (entry.collection)(collection, prompt),
    };
    let mut result = match item {
        Item::Single(att) => att,
        Item::Collection(collection) => {
            let mut merged = Attachment::new(collection.iter().next().map(|c| c.path.clone()).unwrap_or_default())?;
            merged.append_text(&collection.concatenated_text());
            merged
        }
    };
    result.metadata.insert("envelope".to_string(), MetadataValue::Str(envelope.to_string()));
    result.record_step(format!("adapt.{name}"));
    Ok(Item::Single(result))
}

/// `AttachmentCollection ++ op`: elementwise additive for non-reducers;
/// a reducer in the group is invoked once with the whole collection,
/// independent of the `++`/`>>` distinction (§4.4).
pub fn apply_additive(steps: &[Pipeline], item: Item, engine: &Engine, ctx: &ExecutionContext) -> Result<Item, AttachmentError> {
    match item {
        Item::Single(base) => {
            let mut merged = base.clone();
            for step in steps {
                let result = step.run(Item::Single(base.clone()), engine, ctx)?;
                if let Some(result_att) = result.into_single() {
                    merge_into(&mut merged, &base, result_att);
                }
                // A SPLIT inside an additive group can't be merged back into a
                // single Attachment; it is skipped here rather than silently
                // dropping the rest of the group.
            }
            Ok(Item::Single(merged))
        }
        Item::Collection(collection) => {
            let mut chunks = Vec::with_capacity(collection.len());
            for chunk in collection.into_vec() {
                if let Some(merged) = apply_additive(steps, Item::Single(chunk), engine, ctx)?.into_single() {
                    chunks.push(merged);
                }
            }
            Ok(Item::Collection(AttachmentCollection::new(chunks)))
        }
    }
}

/// Folds `result` (one member of an additive group, run against a fresh
/// clone of `base`) into `merged`: appends whatever text/images `result`
/// added beyond `base`'s own, and lets later metadata/obj values win.
fn merge_into(merged: &mut Attachment, base: &Attachment, result: Attachment) {
    let delta = delta_text(&base.text, &result.text);
    merged.append_text(delta);

    if result.images.len() > base.images.len() {
        for image in &result.images[base.images.len()..] {
            merged.push_image(image.clone());
        }
    }

    let base_error_count = base.errors().len();
    for (key, value) in result.metadata.iter() {
        if key == "errors" {
            if let MetadataValue::List(list) = value {
                for entry in list.iter().skip(base_error_count) {
                    match merged.metadata.get_mut("errors") {
                        Some(MetadataValue::List(existing)) => existing.push(entry.clone()),
                        _ => {
                            merged.metadata.insert("errors".to_string(), MetadataValue::List(vec![entry.clone()]));
                        }
                    }
                }
            }
            continue;
        }
        merged.metadata.insert(key.clone(), value.clone());
    }

    if result.obj.is_some() {
        merged.obj = result.obj.clone();
    }

    for step in result.trace().iter().skip(base.trace().len()) {
        merged.record_step(step.clone());
    }
}

fn delta_text<'a>(base: &str, result: &'a str) -> &'a str {
    match result.strip_prefix(base) {
        Some(rest) => rest.trim_start_matches("\n\n"),
        None => result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::AppConfig;
    use crate::bootstrap::build_engine;

    #[test]
    fn load_auto_falls_back_to_text_loader_for_plain_text_path() {
        let engine = build_engine(AppConfig::default());
        let att = Attachment::new("nonexistent-file.txt").unwrap();
        let result = load_auto(att, &engine).unwrap();
        // the built-in text loader always matches; a missing file degrades
        // to a content-carrying error rather than panicking.
        assert!(!result.trace().is_empty());
    }

    #[test]
    fn additive_merge_appends_without_duplicating_base_text() {
        let mut base = Attachment::new("x.txt").unwrap();
        base.append_text("base");
        let mut a = base.clone();
        a.append_text("from-a");
        let mut merged = base.clone();
        merge_into(&mut merged, &base, a);
        assert_eq!(merged.text, "base\n\nfrom-a");
    }
}
