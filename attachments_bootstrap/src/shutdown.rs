// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Shutdown Coordination (§5 "Cancellation and timeouts")
//!
//! The pipeline engine has no suspension points of its own; it only
//! checks a host-provided flag *between* handlers. This module is that
//! host: it installs a `ctrlc` handler that flips a shared `AtomicBool`,
//! which `attachments_core::application::services::pipeline_engine::
//! ExecutionContext` polls after every step. There is no async runtime
//! anywhere in this crate or its dependents - the core stays synchronous
//! per Design Note §9 ("Coroutines / async").

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Installs a Ctrl-C handler that sets `flag` and returns the same flag
/// for the caller to thread into `ExecutionContext::with_cancellation`.
/// Safe to call at most once per process - a second installation attempt
/// is logged and ignored rather than panicking, since the bootstrap's own
/// `#![deny(clippy::panic)]` rules that out.
pub fn install(flag: Arc<AtomicBool>) {
    let handler_flag = flag.clone();
    if let Err(err) = ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::SeqCst);
    }) {
        tracing::warn!(%err, "failed to install Ctrl-C handler; cooperative cancellation via signal is unavailable");
    }
}

/// A fresh, unset cancellation flag.
pub fn new_flag() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_flag_starts_unset() {
        assert!(!new_flag().load(Ordering::SeqCst));
    }
}
