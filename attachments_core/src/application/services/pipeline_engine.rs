// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Engine (C6)
//!
//! The two-operator algebra of §4.3, realized as an expression tree over
//! `Item = Attachment | AttachmentCollection` (Design Note §9, "Collection
//! vs single"). Rust has no `++` operator, so the additive composition of
//! the spec is realized with `+` (`std::ops::Add`); sequential composition
//! (`>>`) is realized with `std::ops::Shr`, matching the spec's own choice
//! of `>>` exactly.
//!
//! `a + b` flattens into a single `Pipeline::Additive` group regardless of
//! how deeply `a` or `b` are themselves sums, which is what makes
//! left-associativity (§4.3) free: `(a + b) + c` and `a + (b + c)` build
//! the identical three-element group.

use std::ops::{Add, Shr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use attachments_domain::{Attachment, AttachmentCollection, AttachmentError, MetadataValue};

use crate::application::services::collection_engine;
use crate::application::services::registry::Engine;

/// Polymorphic pipeline input/output per Design Note §9: either a single
/// `Attachment` or the `AttachmentCollection` a SPLIT produced.
#[derive(Debug, Clone)]
pub enum Item {
    Single(Attachment),
    Collection(AttachmentCollection),
}

impl Item {
    pub fn into_single(self) -> Option<Attachment> {
        match self {
            Item::Single(a) => Some(a),
            Item::Collection(_) => None,
        }
    }

    pub fn into_collection(self) -> Option<AttachmentCollection> {
        match self {
            Item::Collection(c) => Some(c),
            Item::Single(_) => None,
        }
    }

    fn mark_cancelled(self) -> Item {
        match self {
            Item::Single(mut att) => {
                att.metadata.insert("cancelled".to_string(), MetadataValue::Bool(true));
                Item::Single(att)
            }
            Item::Collection(collection) => {
                let chunks = collection
                    .into_vec()
                    .into_iter()
                    .map(|mut c| {
                        c.metadata.insert("cancelled".to_string(), MetadataValue::Bool(true));
                        c
                    })
                    .collect();
                Item::Collection(AttachmentCollection::new(chunks))
            }
        }
    }
}

/// One verb invocation, resolved against the `Engine`'s registry at
/// execution time (not at construction time) so a `Pipeline` value is
/// cheap, `Clone`, and independent of which `Engine` eventually runs it.
#[derive(Debug, Clone)]
pub enum VerbStep {
    /// Tries loaders in registration (preference) order, per §4.11.
    LoadAuto,
    Load(&'static str),
    /// Resolves the best-matching handler by object-type dispatch
    /// precedence (§4.2) rather than by an explicit name - how the
    /// universal pipeline's "MODIFY (DSL-driven)" step (§4.11) is built,
    /// since it doesn't know in advance what kind of object was loaded.
    ModifyAuto,
    Modify(&'static str),
    SplitAuto,
    Split(&'static str),
    PresentAuto,
    Present(&'static str),
    /// REFINE handlers act on already-extracted `text`/`images`, not on
    /// `obj` (§4.9); they have no dispatch-type concept, so unlike the
    /// other three verbs there is no `RefineAuto` - a refiner is always
    /// named explicitly.
    Refine(&'static str),
    Adapt { name: &'static str, prompt: String },
}

/// A pipeline expression: one verb step, a sequential composition, or a
/// flattened additive group.
#[derive(Debug, Clone)]
pub enum Pipeline {
    Verb(VerbStep),
    Seq(Box<Pipeline>, Box<Pipeline>),
    Additive(Vec<Pipeline>),
}

impl Pipeline {
    pub fn verb(step: VerbStep) -> Self {
        Pipeline::Verb(step)
    }
}

impl Shr for Pipeline {
    type Output = Pipeline;

    /// `a >> b`: sequential composition (§4.3).
    fn shr(self, rhs: Pipeline) -> Pipeline {
        Pipeline::Seq(Box::new(self), Box::new(rhs))
    }
}

impl Add for Pipeline {
    type Output = Pipeline;

    /// `a + b` stands in for the spec's `a ++ b`: additive composition
    /// (§4.3). Flattens so a chain of `+` builds one group, not a
    /// right-leaning tree of two-element groups.
    fn add(self, rhs: Pipeline) -> Pipeline {
        let mut steps = match self {
            Pipeline::Additive(existing) => existing,
            other => vec![other],
        };
        match rhs {
            Pipeline::Additive(more) => steps.extend(more),
            other => steps.push(other),
        }
        Pipeline::Additive(steps)
    }
}

/// Cooperative cancellation flag threaded through `Attachments::process`
/// (§5): checked between handlers, never inside one.
#[derive(Clone, Default)]
pub struct ExecutionContext {
    cancellation: Option<Arc<AtomicBool>>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancellation(flag: Arc<AtomicBool>) -> Self {
        Self { cancellation: Some(flag) }
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation.as_ref().is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}

impl Pipeline {
    /// Evaluates this pipeline against `item`. Only the two fatal DSL
    /// error kinds ever surface as `Err` (§7); every other failure is
    /// captured into `metadata.errors` by the collection engine and the
    /// previous value flows forward as `Ok`.
    pub fn run(&self, item: Item, engine: &Engine, ctx: &ExecutionContext) -> Result<Item, AttachmentError> {
        if ctx.is_cancelled() {
            return Ok(item.mark_cancelled());
        }
        match self {
            Pipeline::Verb(step) => collection_engine::apply(step, item, engine),
            Pipeline::Seq(first, second) => {
                let mid = first.run(item, engine, ctx)?;
                second.run(mid, engine, ctx)
            }
            Pipeline::Additive(steps) => collection_engine::apply_additive(steps, item, engine, ctx),
        }
    }
}

/// A `Pipeline` plus an ordered list of alternative pipelines tried, each
/// against the *original* input, if the primary fails or yields a
/// flagged error attachment (§4.3 "Fallback chains").
pub struct FallbackPipeline {
    pub primary: Pipeline,
    pub fallbacks: Vec<Pipeline>,
}

impl FallbackPipeline {
    pub fn new(primary: Pipeline) -> Self {
        Self { primary, fallbacks: Vec::new() }
    }

    pub fn with_fallback(mut self, fallback: Pipeline) -> Self {
        self.fallbacks.push(fallback);
        self
    }

    pub fn run(&self, original: Item, engine: &Engine, ctx: &ExecutionContext) -> Result<Item, AttachmentError> {
        match self.primary.run(original.clone(), engine, ctx) {
            Ok(result) if !carries_blocking_error(&result) => Ok(result),
            primary_outcome => {
                for fallback in &self.fallbacks {
                    if let Ok(result) = fallback.run(original.clone(), engine, ctx) {
                        if !carries_blocking_error(&result) {
                            return Ok(result);
                        }
                    }
                }
                primary_outcome
            }
        }
    }
}

/// Whether `item` carries a recorded, non-fatal failure serious enough to
/// try the next fallback (§4.3). `LoaderUnavailable`/`DependencyMissing`
/// both qualify; a `HandlerFailure` recorded deep in an otherwise-successful
/// pipeline does not, since most of the content is still usable.
pub(crate) fn carries_blocking_error(item: &Item) -> bool {
    let is_blocking = |att: &Attachment| {
        att.errors().iter().any(|entry| {
            matches!(
                entry,
                MetadataValue::Map(map)
                    if map.get("kind").and_then(MetadataValue::as_str) == Some("LoaderUnavailable")
                        || map.get("kind").and_then(MetadataValue::as_str) == Some("DependencyMissing")
            )
        })
    };
    match item {
        Item::Single(att) => is_blocking(att),
        Item::Collection(collection) => collection.iter().any(is_blocking),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn additive_operator_flattens_left_associative_chain() {
        let p = Pipeline::Verb(VerbStep::Present("a")) + Pipeline::Verb(VerbStep::Present("b")) + Pipeline::Verb(VerbStep::Present("c"));
        match p {
            Pipeline::Additive(steps) => assert_eq!(steps.len(), 3),
            _ => panic!("expected a flattened additive group"),
        }
    }

    #[test]
    fn sequential_operator_nests_right() {
        let p = Pipeline::Verb(VerbStep::Load("text")) >> Pipeline::Verb(VerbStep::Present("markdown"));
        match p {
            Pipeline::Seq(_, _) => {}
            _ => panic!("expected a Seq node"),
        }
    }
}
