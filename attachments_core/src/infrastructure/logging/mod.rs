// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Logging / Observability (C14)
//!
//! Installs a process-global `tracing` subscriber once, matching the
//! level in `AppConfig::log_level` (or `RUST_LOG`, which always wins) and
//! the output format in `AppConfig::log_format` (§6 "Logging output").

mod observability;

pub use observability::init_tracing;
