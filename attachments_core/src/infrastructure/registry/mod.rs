// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Plugin Discovery (C16)
//!
//! `attachments_core::bootstrap::build_engine` is the module that actually
//! constructs an `Engine`; this one only contributes the "discover and
//! call out to plugins" step (§6 "Environment inputs").

mod plugins;

pub use plugins::{discover_plugins, PluginError};
