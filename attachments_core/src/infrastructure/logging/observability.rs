// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use tracing_subscriber::EnvFilter;

use crate::infrastructure::config::AppConfig;

/// Installs the global `tracing` subscriber for the process. `RUST_LOG`
/// overrides `config.log_level` when set, matching how every other
/// `tracing`-based binary in this codebase's lineage resolves the two.
/// Safe to call more than once - later calls are no-ops, since a second
/// global subscriber can never actually be installed.
pub fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if config.log_format == "json" {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}
