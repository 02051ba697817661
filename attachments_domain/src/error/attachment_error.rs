// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

use thiserror::Error;

/// The seven error kinds from the system's error taxonomy.
///
/// `DslSyntax` and `DslValue` are fatal for the `Attachment` that produced
/// them; every other variant is downgraded by the high-level API into a
/// content-carrying artifact and never escapes as a `Result::Err` from
/// `Attachments::process`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttachmentError {
    /// Unparseable bracket content. Carries the byte offset of the failure.
    #[error("DSL syntax error at offset {offset}: {message}")]
    DslSyntax { offset: usize, message: String },

    /// A known DSL key was given a value outside its enum's value set.
    #[error("DSL value error: key `{key}` has no value `{value}`{}",
        suggestion.as_ref().map(|s| format!(" (did you mean `{s}`?)")).unwrap_or_default())]
    DslValue {
        key: String,
        value: String,
        suggestion: Option<String>,
    },

    /// No registered loader matched the attachment, and the text-fallback
    /// loader also failed.
    #[error("no loader available for `{path}`: {reason}")]
    LoaderUnavailable { path: String, reason: String },

    /// A loader or presenter needs an optional dependency that is not
    /// present. Carries an install hint for the missing dependency.
    #[error("missing dependency for `{handler}`: {install_hint}")]
    DependencyMissing {
        handler: String,
        install_hint: String,
    },

    /// A handler raised during invocation. Captured into
    /// `Attachment::metadata.errors` rather than aborting the pipeline.
    #[error("handler `{step}` failed: {message}")]
    HandlerFailure { step: String, message: String },

    /// A repository walk or HTTP response exceeded the configured byte
    /// budget without `force:true` in the DSL.
    #[error("size budget exceeded: {discovered_bytes} bytes found, budget is {budget_bytes} (pass `force:true` to override)")]
    SizeBudgetExceeded {
        discovered_bytes: u64,
        budget_bytes: u64,
    },

    /// The host's cancellation flag was observed between pipeline steps.
    #[error("cancelled after step `{last_step}`")]
    Cancelled { last_step: String },
}

impl AttachmentError {
    /// `true` for the two kinds that must abort processing of the affected
    /// `Attachment` outright; `false` for everything the high-level API is
    /// required to downgrade into an explanatory artifact.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AttachmentError::DslSyntax { .. } | AttachmentError::DslValue { .. })
    }

    /// The classification keyword each non-fatal kind must contribute to
    /// `Attachment.text` under the graceful-degradation closure property.
    pub fn classification_keyword(&self) -> &'static str {
        match self {
            AttachmentError::DslSyntax { .. } => "DSLSyntaxError",
            AttachmentError::DslValue { .. } => "DSLValueError",
            AttachmentError::LoaderUnavailable { .. } => "LoaderUnavailable",
            AttachmentError::DependencyMissing { .. } => "DependencyMissing",
            AttachmentError::HandlerFailure { .. } => "HandlerFailure",
            AttachmentError::SizeBudgetExceeded { .. } => "SizeBudgetExceeded",
            AttachmentError::Cancelled { .. } => "Cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dsl_syntax_is_fatal() {
        let e = AttachmentError::DslSyntax { offset: 3, message: "unterminated bracket".into() };
        assert!(e.is_fatal());
    }

    #[test]
    fn dependency_missing_is_not_fatal() {
        let e = AttachmentError::DependencyMissing {
            handler: "load.pdf".into(),
            install_hint: "pip install pymupdf".into(),
        };
        assert!(!e.is_fatal());
        assert_eq!(e.classification_keyword(), "DependencyMissing");
    }

    #[test]
    fn dsl_value_error_renders_suggestion() {
        let e = AttachmentError::DslValue {
            key: "format".into(),
            value: "markdwon".into(),
            suggestion: Some("markdown".into()),
        };
        assert!(e.to_string().contains("did you mean `markdown`"));
    }
}
