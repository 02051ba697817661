// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};
use thiserror::Error;
use walkdir::WalkDir;

use crate::application::services::registry::HandlerRegistry;

/// The single symbol every plugin `cdylib` must export - a narrow,
/// FFI-safe registration function that pushes its own `LoaderEntry`/
/// `ModifierEntry`/etc. onto the registry it's handed. This is the
/// systems equivalent of "self-register at import time" (§6): no ctor
/// tricks, no global registration list, just one call per plugin.
pub type RegisterFn = unsafe extern "C" fn(&mut HandlerRegistry);

const REGISTER_SYMBOL: &[u8] = b"attachments_plugin_register";

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("failed to load plugin {0}: {1}")]
    Load(String, libloading::Error),
    #[error("plugin {0} does not export `attachments_plugin_register`: {1}")]
    MissingSymbol(String, libloading::Error),
}

/// Loads every `cdylib` plugin found under `plugin_dir` - a directory of
/// plugins, or an OS-path-separator-joined list of individual plugin
/// files, per §6 - and calls its registration function against
/// `registry`. The one `unsafe` in this crate (Design Note §9, "Plugin
/// loading is isolated"): loading and calling into an arbitrary dynamic
/// library cannot be made safe by construction, so it stays confined to
/// this single function, gated behind `AppConfig::plugin_dir` being set.
pub fn discover_plugins(plugin_dir: &str, registry: &mut HandlerRegistry) -> Result<usize, PluginError> {
    let mut loaded = 0;
    for candidate in candidate_paths(plugin_dir) {
        let display = candidate.display().to_string();
        // SAFETY: `plugin_dir` comes from operator configuration
        // (`ATTACHMENTS_PLUGIN_DIR`), not from data encountered mid-pipeline;
        // loading and invoking its registration symbol is only as trusted
        // as the binary the operator pointed at, which is the same trust
        // boundary as running it directly.
        unsafe {
            let library = Library::new(&candidate).map_err(|e| PluginError::Load(display.clone(), e))?;
            let register: Symbol<RegisterFn> = library.get(REGISTER_SYMBOL).map_err(|e| PluginError::MissingSymbol(display.clone(), e))?;
            register(registry);
            // The function pointers `register` just pushed into `registry`
            // must stay valid for the rest of the process; unloading the
            // library here would dangle them.
            std::mem::forget(library);
        }
        loaded += 1;
    }
    Ok(loaded)
}

fn candidate_paths(plugin_dir: &str) -> Vec<PathBuf> {
    let path = Path::new(plugin_dir);
    if path.is_dir() {
        WalkDir::new(path)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|p| p.extension().and_then(OsStr::to_str) == Some(std::env::consts::DLL_EXTENSION))
            .collect()
    } else {
        std::env::split_paths(plugin_dir).filter(|p| p.is_file()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonexistent_plugin_dir_yields_no_candidates() {
        assert!(candidate_paths("/nonexistent/attachments-plugins").is_empty());
    }
}
