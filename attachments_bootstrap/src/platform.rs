// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Platform Abstraction
//!
//! The handful of OS facts the bootstrap layer needs before it can hand
//! control to `attachments_core`: how many CPUs are available (to size a
//! `rayon` thread pool when `AppConfig::parallel` is on), where temporary
//! files live, and whether the process is running elevated. Everything
//! downstream of `build_engine` is pure and platform-agnostic; this is
//! the one seam where `cfg(unix)`/`cfg(windows)` is allowed to leak in.

mod unix;
#[cfg(windows)]
mod windows;

use std::path::PathBuf;

/// OS facts the bootstrap layer consults before wiring up the engine.
pub trait Platform: Send + Sync {
    fn platform_name(&self) -> &'static str;
    fn cpu_count(&self) -> usize;
    fn temp_dir(&self) -> PathBuf;
    fn is_elevated(&self) -> bool;
    /// `:` on Unix, `;` on Windows - the `PATH`-style separator `AppConfig
    /// ::plugin_dir` accepts for a list of plugin files (§6).
    fn path_list_separator(&self) -> char;
}

/// Returns the `Platform` implementation for the OS this binary was built
/// for - chosen at compile time, never at runtime.
pub fn create_platform() -> Box<dyn Platform> {
    #[cfg(unix)]
    {
        Box::new(unix::UnixPlatform::new())
    }

    #[cfg(windows)]
    {
        Box::new(windows::WindowsPlatform::new())
    }

    #[cfg(not(any(unix, windows)))]
    {
        compile_error!("attachments_bootstrap supports only unix and windows targets");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_reports_at_least_one_cpu() {
        let platform = create_platform();
        assert!(platform.cpu_count() >= 1);
    }

    #[test]
    fn temp_dir_exists() {
        let platform = create_platform();
        assert!(platform.temp_dir().exists());
    }
}
