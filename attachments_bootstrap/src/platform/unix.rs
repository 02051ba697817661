// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! POSIX implementation of `Platform`, covering Linux and macOS.

use std::path::PathBuf;

use super::Platform;

pub struct UnixPlatform;

impl UnixPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl Default for UnixPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for UnixPlatform {
    fn platform_name(&self) -> &'static str {
        if cfg!(target_os = "macos") {
            "macos"
        } else {
            "linux"
        }
    }

    fn cpu_count(&self) -> usize {
        // SAFETY: `sysconf` with a recognized name is a pure query with no
        // side effects; a negative return means "not available" (rare, but
        // documented in POSIX), handled below rather than propagated.
        let count = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
        if count > 0 {
            count as usize
        } else {
            1
        }
    }

    fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }

    fn is_elevated(&self) -> bool {
        // SAFETY: `geteuid` takes no arguments and cannot fail.
        unsafe { libc::geteuid() == 0 }
    }

    fn path_list_separator(&self) -> char {
        ':'
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_at_least_one_cpu() {
        assert!(UnixPlatform::new().cpu_count() >= 1);
    }

    #[test]
    fn temp_dir_exists() {
        assert!(UnixPlatform::new().temp_dir().exists());
    }

    #[test]
    fn path_list_separator_is_colon() {
        assert_eq!(UnixPlatform::new().path_list_separator(), ':');
    }
}
