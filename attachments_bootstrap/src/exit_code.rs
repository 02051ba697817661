// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Codes (§6)
//!
//! The CLI surface's contract is exactly four codes, unlike the larger
//! `sysexits.h`-style enumerations other command-line tools in this
//! lineage use: 0 on success, 1 when every fallback for some source was
//! exhausted and the result still carries a blocking error, 2 for a fatal
//! DSL parse error, and 3 for everything else (configuration load
//! failures, unreadable plugin directories, I/O errors opening a local
//! report file).

use std::fmt;

use attachments_domain::AttachmentError;

/// The four process exit codes §6 defines for the CLI surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ExitCode {
    /// Every source processed cleanly.
    #[default]
    Success = 0,
    /// At least one source still carries `LoaderUnavailable`/
    /// `DependencyMissing` after every fallback ran.
    FallbacksExhausted = 1,
    /// A source's bracket-DSL failed to parse or used an unknown enum
    /// value (`AttachmentError::DslSyntax`/`DslValue`).
    DslError = 2,
    /// An error outside the pipeline's own taxonomy: configuration load
    /// failure, unreadable plugin directory, or any other I/O error the
    /// bootstrap layer itself hit before or after processing.
    IoError = 3,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Maps the two fatal DSL variants to `DslError` and every other
    /// `AttachmentError` to `IoError` - the non-fatal five never reach
    /// here in practice, since `Attachments::process` downgrades them
    /// into content rather than returning them as `Err` (§7 "Surfacing
    /// rule"), but the mapping stays total so a defensive caller never
    /// has to `unwrap`.
    pub fn from_attachment_error(error: &AttachmentError) -> Self {
        if error.is_fatal() {
            ExitCode::DslError
        } else {
            ExitCode::IoError
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "success",
            ExitCode::FallbacksExhausted => "all fallbacks exhausted for at least one source",
            ExitCode::DslError => "DSL syntax or value error",
            ExitCode::IoError => "unrecoverable I/O error",
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code.as_i32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_match_the_documented_contract() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::FallbacksExhausted.as_i32(), 1);
        assert_eq!(ExitCode::DslError.as_i32(), 2);
        assert_eq!(ExitCode::IoError.as_i32(), 3);
    }

    #[test]
    fn fatal_dsl_errors_map_to_dsl_error() {
        let err = AttachmentError::DslSyntax { offset: 4, message: "unterminated bracket".into() };
        assert_eq!(ExitCode::from_attachment_error(&err), ExitCode::DslError);
    }

    #[test]
    fn non_fatal_errors_map_to_io_error() {
        let err = AttachmentError::LoaderUnavailable { path: "x".into(), reason: "no loader".into() };
        assert_eq!(ExitCode::from_attachment_error(&err), ExitCode::IoError);
    }

    #[test]
    fn default_is_success() {
        assert_eq!(ExitCode::default(), ExitCode::Success);
    }
}
