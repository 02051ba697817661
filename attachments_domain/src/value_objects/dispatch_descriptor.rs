// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Dispatch Descriptor
//!
//! The object-type descriptor a MODIFY/SPLIT/PRESENT/REFINE handler
//! declares at registration. Resolution follows the precedence in §4.2:
//! exact type identity, then unqualified class-name, then subtype
//! (family), then regex over the qualified class name - scanned in
//! registration order within a precedence level.
//!
//! Per Design Note §9, this is a small closed grammar, not reflection: a
//! handler author must pick one of the four variants explicitly.

use regex::Regex;

use crate::entities::LoadedObject;

#[derive(Debug, Clone)]
pub enum DispatchDescriptor {
    /// Precedence 1: matches only this exact `LoadedObject` class name.
    Exact(String),
    /// Precedence 2: matches this unqualified class name (in this model,
    /// equivalent to `Exact`, but kept distinct so corpus-imitating
    /// handler authors can express "any object with this name" without
    /// claiming the stronger "this is the canonical type" guarantee).
    ClassName(String),
    /// Precedence 3: matches any object whose `family()` equals this
    /// string, e.g. `"image"` for "any supported image variant".
    Subtype(String),
    /// Precedence 4: matches if the regex matches `qualified_class_name()`.
    Regex(Regex),
}

impl DispatchDescriptor {
    pub fn exact(name: impl Into<String>) -> Self {
        DispatchDescriptor::Exact(name.into())
    }

    pub fn class_name(name: impl Into<String>) -> Self {
        DispatchDescriptor::ClassName(name.into())
    }

    pub fn subtype(family: impl Into<String>) -> Self {
        DispatchDescriptor::Subtype(family.into())
    }

    pub fn regex(pattern: &str) -> Result<Self, regex::Error> {
        Ok(DispatchDescriptor::Regex(Regex::new(pattern)?))
    }

    /// Precedence index used to order candidate matches (lower wins);
    /// ties within a level are broken by registration order by the caller.
    pub fn precedence(&self) -> u8 {
        match self {
            DispatchDescriptor::Exact(_) => 0,
            DispatchDescriptor::ClassName(_) => 1,
            DispatchDescriptor::Subtype(_) => 2,
            DispatchDescriptor::Regex(_) => 3,
        }
    }

    pub fn matches(&self, obj: &LoadedObject) -> bool {
        match self {
            DispatchDescriptor::Exact(name) => obj.class_name() == name,
            DispatchDescriptor::ClassName(name) => obj.class_name() == name,
            DispatchDescriptor::Subtype(family) => obj.family() == family,
            DispatchDescriptor::Regex(re) => re.is_match(&obj.qualified_class_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> LoadedObject {
        LoadedObject::Image { format: "PNG".into(), width: 1, height: 1, bytes: vec![] }
    }

    #[test]
    fn exact_matches_by_class_name() {
        assert!(DispatchDescriptor::exact("Image").matches(&image()));
        assert!(!DispatchDescriptor::exact("Table").matches(&image()));
    }

    #[test]
    fn subtype_matches_by_family() {
        assert!(DispatchDescriptor::subtype("image").matches(&image()));
    }

    #[test]
    fn regex_matches_qualified_class_name() {
        let d = DispatchDescriptor::regex(r"^image\.").unwrap();
        assert!(d.matches(&image()));
    }

    #[test]
    fn precedence_orders_exact_before_regex() {
        assert!(DispatchDescriptor::exact("Image").precedence() < DispatchDescriptor::regex(".*").unwrap().precedence());
    }
}
