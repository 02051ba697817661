// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # Attachments Core
//!
//! The composition engine: everything `attachments_domain` doesn't know how
//! to do. This crate follows the same layering the rest of this codebase's
//! lineage uses:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Application Layer                          │
//! │  registry/dispatch glue, pipeline + collection semantics,   │
//! │  processor registry, suggestion engine, the high-level API  │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Infrastructure Layer                         │
//! │  the registry itself, built-in handlers, config, logging,   │
//! │  plugin discovery                                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! `attachments_domain` supplies the data model (`Attachment`,
//! `AttachmentCollection`) and the verb-handler function-pointer types; this
//! crate supplies the registry that stores handlers under those types, the
//! dispatch algorithm that picks one, the `>>`/`++` pipeline algebra, and
//! the processor-driven high-level API most callers actually use.

pub mod application;
pub mod bootstrap;
pub mod infrastructure;

pub use application::services::attachments_api::Attachments;
pub use application::services::pipeline_engine::{Item, Pipeline};
pub use application::services::registry::Engine;
pub use bootstrap::build_engine;
pub use infrastructure::config::AppConfig;
