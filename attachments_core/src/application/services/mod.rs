// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Application services: dispatch (C5), the pipeline engine (C6), collection
//! semantics (C7), the processor registry (C8), the suggestion engine (C12),
//! and the high-level API (C9) that wraps all of it.

pub mod attachments_api;
pub mod collection_engine;
pub mod dispatch_service;
pub mod pipeline_engine;
pub mod processor_registry;
pub mod registry;
pub mod suggestion_engine;
