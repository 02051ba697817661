// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Surface (C15, §6)
//!
//! `clap`-derived argument parsing for the "processor/adapter selection
//! CLI" §6 describes: zero or more sources (each a bare path/URL or one
//! already carrying bracket-DSL commands), an optional adapter to render
//! through instead of printing plain text, and the handful of process-wide
//! overrides (`--plugin-dir`, `--config`, `--parallel`, `--verbose`) that
//! layer on top of `AppConfig::load()`.

use std::path::PathBuf;

use clap::Parser;

/// Ingests one or more sources and prints either their combined extracted
/// text or a provider envelope from one of the built-in adapters.
#[derive(Parser, Debug)]
#[command(name = "attachments")]
#[command(about = "Content ingestion pipeline: files and URLs in, model-ready text/images/envelopes out")]
#[command(version)]
pub struct Cli {
    /// One or more sources: a file path, a URL, or either with trailing
    /// bracket-DSL commands (e.g. `report.pdf[pages:1-3,images:false]`).
    #[arg(required = true)]
    pub sources: Vec<String>,

    /// Render through a registered ADAPT handler (`chat`, `responses`,
    /// `claude`, or a plugin-provided name) instead of printing plain text.
    #[arg(short, long)]
    pub adapter: Option<String>,

    /// Prompt text passed to `--adapter`'s envelope (ignored otherwise).
    #[arg(short, long, default_value = "")]
    pub prompt: String,

    /// Configuration file path; overrides `ATTACHMENTS_CONFIG`/`attachments.toml`.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory (or OS-path-separator-joined file list) of `cdylib`
    /// plugins to discover at startup; overrides `AppConfig::plugin_dir`.
    #[arg(long)]
    pub plugin_dir: Option<String>,

    /// Process sources concurrently via `rayon`; overrides `AppConfig::parallel`.
    #[arg(long)]
    pub parallel: bool,

    /// Enable debug-level logging regardless of `RUST_LOG`/`log_level`.
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit the combined result as a single JSON object instead of plain
    /// text (ignored when `--adapter` is set - adapter envelopes are
    /// always JSON).
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_a_single_bare_source() {
        let cli = Cli::parse_from(["attachments", "report.pdf"]);
        assert_eq!(cli.sources, vec!["report.pdf".to_string()]);
        assert!(cli.adapter.is_none());
    }

    #[test]
    fn parses_an_adapter_and_prompt() {
        let cli = Cli::parse_from(["attachments", "--adapter", "chat", "--prompt", "caption?", "photo.jpg"]);
        assert_eq!(cli.adapter.as_deref(), Some("chat"));
        assert_eq!(cli.prompt, "caption?");
    }

    #[test]
    fn parses_multiple_sources_with_dsl() {
        let cli = Cli::parse_from(["attachments", "a.txt", "b.pdf[pages:1-2]"]);
        assert_eq!(cli.sources.len(), 2);
    }
}
