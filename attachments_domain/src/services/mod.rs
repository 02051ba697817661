// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Verb Contracts
//!
//! The six verb kinds (§3's "Handler registration record") as plain traits,
//! plus the shape a registration entry takes. This crate only declares the
//! contracts - the registry that stores implementations, resolves dispatch,
//! and actually invokes a handler lives in `attachments_core`.
//!
//! Handlers are function pointers rather than closures: the registry is a
//! write-once table of static data (Design Note §9, "no mutable globals"),
//! and every built-in handler is a free function with no captured state.
//! Parameters a handler needs come from the DSL via auto-extraction, not
//! from closure capture.

mod handler_record;
mod verb_kind;

pub use handler_record::{HandlerRegistration, ParamKind, ParamSpec, PresenterCategory};
pub use verb_kind::VerbKind;

use crate::entities::{Attachment, AttachmentCollection, LoadedObject};
use crate::error::AttachmentError;

/// Populates `obj` (and possibly `text`/`metadata`) in place, §4.5.
/// Selection is by `match`, not by object-type dispatch - at LOAD time
/// `obj` is still absent. Mutating in place (rather than consuming and
/// rebuilding the `Attachment`) lets the dispatcher clone-before-invoke and
/// cheaply discard a failed attempt, keeping "previous value flows forward"
/// (§4.3) a property of the caller, not every handler author.
pub type LoadFn = fn(&mut Attachment) -> Result<(), AttachmentError>;

/// Predicate a loader or processor registers to claim an `Attachment`.
pub type MatchFn = fn(&Attachment) -> bool;

/// Transforms `obj` in place, §4.6.
pub type ModifyFn = fn(&mut Attachment) -> Result<(), AttachmentError>;

/// `(&Attachment) -> AttachmentCollection`, §4.7. Read-only: the source
/// attachment is left untouched (the pipeline engine decides what to do
/// with it once the split succeeds), and the handler reads whatever it
/// needs out of `obj`/`text` to produce chunks.
pub type SplitFn = fn(&Attachment) -> Result<AttachmentCollection, AttachmentError>;

/// Extracts into `text`/`images`/`metadata` in place, §4.8. Must append,
/// never overwrite, to satisfy the additive-composition contract.
pub type PresentFn = fn(&mut Attachment) -> Result<(), AttachmentError>;

/// Post-processes `text`/`images` in place, §4.9 (non-reducer refiners:
/// header prefixing, truncation, cleaning, resize).
pub type RefineFn = fn(&mut Attachment) -> Result<(), AttachmentError>;

/// Reducer refiner variant: a collection folded into one `Attachment`,
/// e.g. image tiling.
pub type ReduceRefineFn = fn(&AttachmentCollection) -> Result<Attachment, AttachmentError>;

/// `(&Attachment, prompt) -> envelope`, §4.10, singular form.
pub type AdaptSingleFn = fn(&Attachment, &str) -> serde_json::Value;

/// `(&AttachmentCollection, prompt) -> envelope`, §4.10, collection form.
/// Adapters are always reducers and must implement both forms (§4.10:
/// "Accept both singular and collection inputs").
pub type AdaptCollectionFn = fn(&AttachmentCollection, &str) -> serde_json::Value;

/// Whether an `obj` variant can be opened by a particular text-reading
/// strategy; used by the text-fallback loader (§4.5) which must accept any
/// `LoadedObject` and never panic on a variant it doesn't understand.
pub fn as_readable_text(obj: &LoadedObject) -> Option<&str> {
    match obj {
        LoadedObject::Text(s) => Some(s.as_str()),
        _ => None,
    }
}
