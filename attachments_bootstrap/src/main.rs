// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # `attachments` CLI entry point
//!
//! Wires `attachments_bootstrap::cli` into `attachments_core::build_engine`
//! and `attachments_core::Attachments`, then maps the outcome onto the
//! four exit codes of §6. This binary is intentionally thin: parsing,
//! configuration overrides, signal installation, and exit-code mapping are
//! the only things that happen here.

use clap::Parser;

use attachments_bootstrap::cli::Cli;
use attachments_bootstrap::exit_code::ExitCode;
use attachments_bootstrap::platform::create_platform;
use attachments_bootstrap::shutdown;
use attachments_core::application::services::pipeline_engine::ExecutionContext;
use attachments_core::infrastructure::config::AppConfig;
use attachments_core::infrastructure::logging::init_tracing;
use attachments_core::{build_engine, Attachments};

fn main() {
    let cli = Cli::parse();
    std::process::exit(run(cli).as_i32());
}

fn run(cli: Cli) -> ExitCode {
    if let Some(path) = &cli.config {
        // SAFETY: single-threaded at this point in process lifetime - no
        // other thread has been spawned yet, so no other reader can race
        // this write.
        unsafe {
            std::env::set_var("ATTACHMENTS_CONFIG", path);
        }
    }

    let mut config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            return ExitCode::IoError;
        }
    };

    if let Some(plugin_dir) = &cli.plugin_dir {
        config.plugin_dir = Some(plugin_dir.clone());
    }
    if cli.parallel {
        config.parallel = true;
    }
    if cli.verbose {
        config.log_level = "debug".to_string();
    }

    init_tracing(&config);

    let platform = create_platform();
    tracing::debug!(platform = %platform.platform_name(), cpus = %platform.cpu_count(), "starting attachments");

    let engine = build_engine(config);

    let flag = shutdown::new_flag();
    shutdown::install(flag.clone());
    let ctx = ExecutionContext::with_cancellation(flag);

    let attachments = match Attachments::process_with(&cli.sources, &engine, &ctx) {
        Ok(attachments) => attachments,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from_attachment_error(&err);
        }
    };

    if let Some(adapter) = &cli.adapter {
        let envelopes = attachments.adapt(adapter, &cli.prompt, &engine);
        match serde_json::to_string_pretty(&envelopes) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => {
                eprintln!("failed to render `{adapter}` envelope as JSON: {err}");
                return ExitCode::IoError;
            }
        }
    } else if cli.json {
        let payload = serde_json::json!({
            "text": attachments.text(),
            "images": attachments.images().iter().map(|i| i.as_str().to_string()).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&payload) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => {
                eprintln!("failed to render result as JSON: {err}");
                return ExitCode::IoError;
            }
        }
    } else {
        println!("{}", attachments.text());
    }

    if attachments.has_blocking_errors() {
        ExitCode::FallbacksExhausted
    } else {
        ExitCode::Success
    }
}
