// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Windows implementation of `Platform`.

use std::path::PathBuf;

use winapi::um::processthreadsapi::OpenProcessToken;
use winapi::um::securitybaseapi::GetTokenInformation;
use winapi::um::sysinfoapi::GetSystemInfo;
use winapi::um::winnt::{TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY};

use super::Platform;

pub struct WindowsPlatform;

impl WindowsPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WindowsPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for WindowsPlatform {
    fn platform_name(&self) -> &'static str {
        "windows"
    }

    fn cpu_count(&self) -> usize {
        // SAFETY: `GetSystemInfo` writes into a caller-owned, fully zeroed
        // struct of the size the Windows API expects; no pointers escape.
        unsafe {
            let mut info = std::mem::zeroed();
            GetSystemInfo(&mut info);
            info.dwNumberOfProcessors.max(1) as usize
        }
    }

    fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }

    fn is_elevated(&self) -> bool {
        // SAFETY: standard "am I elevated" incantation - open the current
        // process's token read-only, query its elevation state, close it.
        // Every pointer passed is a local, stack-allocated, correctly sized
        // value; failure at any step degrades to "not elevated" rather than
        // propagating, since this is advisory information only.
        unsafe {
            use winapi::um::processthreadsapi::GetCurrentProcess;

            let mut token = std::ptr::null_mut();
            if OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token) == 0 {
                return false;
            }

            let mut elevation = TOKEN_ELEVATION { TokenIsElevated: 0 };
            let mut size = std::mem::size_of::<TOKEN_ELEVATION>() as u32;
            let ok = GetTokenInformation(
                token,
                TokenElevation,
                &mut elevation as *mut _ as *mut _,
                size,
                &mut size,
            );
            winapi::um::handleapi::CloseHandle(token);
            ok != 0 && elevation.TokenIsElevated != 0
        }
    }

    fn path_list_separator(&self) -> char {
        ';'
    }
}
