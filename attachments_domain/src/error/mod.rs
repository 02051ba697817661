// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Error Taxonomy
//!
//! Every failure mode the pipeline can hit is one of the seven kinds below.
//! Two are fatal for the affected `Attachment` (`DslSyntax`, `DslValue`); the
//! other five are always downgraded by the high-level API into a
//! content-carrying artifact rather than propagated (see `attachments_core`'s
//! `attachments_api` module).

mod attachment_error;

pub use attachment_error::AttachmentError;
