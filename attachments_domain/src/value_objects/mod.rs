// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Value objects: immutable, self-validating pieces of the attachments
//! domain with no identity of their own.

mod dispatch_descriptor;
mod dsl_command;
mod dsl_parser;
mod metadata_value;
mod page_range;

pub use dispatch_descriptor::DispatchDescriptor;
pub use dsl_command::{Commands, DslCommand};
pub use dsl_parser::{emit_source, parse_source, DuplicateKeyWarning};
pub use metadata_value::MetadataValue;
pub use page_range::{parse_page_ranges, PageRangeError};
