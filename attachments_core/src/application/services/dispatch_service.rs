// /////////////////////////////////////////////////////////////////////////////
// Attachments Ingestion Pipeline
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Dispatch Core (C5)
//!
//! The match-predicate and type-resolution algorithm of §4.2: exact type
//! identity, then unqualified class-name, then subtype, then regex - ties
//! within a precedence level broken by registration order. Also does
//! auto-parameter extraction: for every DSL command present in a matched
//! handler's declared `params`, coerce and validate it, raising
//! `DSLValueError` (with a suggestion) for an unknown enum value.

use attachments_domain::services::{HandlerRegistration, ParamKind};
use attachments_domain::{AttachmentError, Commands, LoadedObject};

use crate::application::services::suggestion_engine;

/// Resolves the best-matching entry in `entries` against `obj`, following
/// the exact/class-name/subtype/regex precedence of §4.2. `registration_of`
/// projects a registry entry (whose concrete shape differs per verb kind)
/// down to its `HandlerRegistration`, so this one function serves every
/// verb's table without needing a shared trait object.
pub fn resolve_by_obj<'a, T>(
    entries: &'a [T],
    obj: &LoadedObject,
    registration_of: impl Fn(&T) -> &HandlerRegistration,
) -> Option<&'a T> {
    let mut best: Option<(&'a T, u8)> = None;
    for entry in entries {
        let registration = registration_of(entry);
        let Some(descriptor) = &registration.dispatch_type else {
            continue;
        };
        if !descriptor.matches(obj) {
            continue;
        }
        let precedence = descriptor.precedence();
        let replace = match best {
            None => true,
            Some((_, current_best)) => precedence < current_best,
        };
        if replace {
            best = Some((entry, precedence));
        }
    }
    best.map(|(entry, _)| entry)
}

/// Auto-parameter extraction and validation (§4.2). For every declared
/// param present in `commands`, coerces to its declared kind; an
/// enum-typed param with a value outside `enum_values` is a fatal
/// `DSLValueError` carrying a suggestion. Unknown command keys (not
/// declared by this handler) are left alone - forward compatible, per
/// §4.12 - so this function never reports on them.
pub fn validate_params(params: &[attachments_domain::services::ParamSpec], commands: &Commands) -> Result<(), AttachmentError> {
    for param in params {
        let Some(raw) = commands.get(param.name) else {
            continue;
        };
        match param.kind {
            ParamKind::Enum => {
                let allowed = param.enum_values.unwrap_or(&[]);
                if !allowed.contains(&raw) {
                    let suggestion = suggestion_engine::suggest(raw, allowed.iter().copied());
                    return Err(AttachmentError::DslValue {
                        key: param.name.to_string(),
                        value: raw.to_string(),
                        suggestion: suggestion.map(str::to_string),
                    });
                }
            }
            ParamKind::Int => {
                if raw.parse::<i64>().is_err() {
                    return Err(AttachmentError::DslValue {
                        key: param.name.to_string(),
                        value: raw.to_string(),
                        suggestion: None,
                    });
                }
            }
            ParamKind::Float => {
                if raw.parse::<f64>().is_err() {
                    return Err(AttachmentError::DslValue {
                        key: param.name.to_string(),
                        value: raw.to_string(),
                        suggestion: None,
                    });
                }
            }
            ParamKind::Bool => {
                if commands.get_bool(param.name).is_none() {
                    return Err(AttachmentError::DslValue {
                        key: param.name.to_string(),
                        value: raw.to_string(),
                        suggestion: Some("true|false".to_string()),
                    });
                }
            }
            ParamKind::String => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use attachments_domain::services::{ParamSpec, VerbKind};
    use attachments_domain::value_objects::DispatchDescriptor;

    struct Entry {
        registration: HandlerRegistration,
    }

    fn image() -> LoadedObject {
        LoadedObject::Image { format: "PNG".into(), width: 1, height: 1, bytes: vec![] }
    }

    #[test]
    fn exact_beats_regex_regardless_of_registration_order() {
        let entries = vec![
            Entry {
                registration: HandlerRegistration {
                    dispatch_type: Some(DispatchDescriptor::regex(".*").unwrap()),
                    ..HandlerRegistration::new(VerbKind::Present, "regexy")
                },
            },
            Entry {
                registration: HandlerRegistration {
                    dispatch_type: Some(DispatchDescriptor::exact("Image")),
                    ..HandlerRegistration::new(VerbKind::Present, "exacty")
                },
            },
        ];
        let winner = resolve_by_obj(&entries, &image(), |e| &e.registration).unwrap();
        assert_eq!(winner.registration.name, "exacty");
    }

    #[test]
    fn first_registered_wins_ties_within_same_precedence() {
        let entries = vec![
            Entry {
                registration: HandlerRegistration {
                    dispatch_type: Some(DispatchDescriptor::exact("Image")),
                    ..HandlerRegistration::new(VerbKind::Present, "first")
                },
            },
            Entry {
                registration: HandlerRegistration {
                    dispatch_type: Some(DispatchDescriptor::exact("Image")),
                    ..HandlerRegistration::new(VerbKind::Present, "second")
                },
            },
        ];
        let winner = resolve_by_obj(&entries, &image(), |e| &e.registration).unwrap();
        assert_eq!(winner.registration.name, "first");
    }

    #[test]
    fn unresolved_dispatch_returns_none() {
        let entries: Vec<Entry> = vec![Entry {
            registration: HandlerRegistration {
                dispatch_type: Some(DispatchDescriptor::exact("Table")),
                ..HandlerRegistration::new(VerbKind::Present, "tabley")
            },
        }];
        assert!(resolve_by_obj(&entries, &image(), |e| &e.registration).is_none());
    }

    #[test]
    fn unknown_enum_value_is_a_dsl_value_error_with_suggestion() {
        const PARAMS: &[ParamSpec] = &[ParamSpec::new("format", ParamKind::Enum).with_enum_values(&["markdown", "text"])];
        let mut commands = Commands::new();
        commands.insert("format", "markdwon");
        let err = validate_params(PARAMS, &commands).unwrap_err();
        match err {
            AttachmentError::DslValue { suggestion, .. } => assert_eq!(suggestion.as_deref(), Some("markdown")),
            other => panic!("expected DslValue, got {other:?}"),
        }
    }

    #[test]
    fn unknown_command_keys_are_ignored() {
        const PARAMS: &[ParamSpec] = &[];
        let mut commands = Commands::new();
        commands.insert("future_key", "whatever");
        assert!(validate_params(PARAMS, &commands).is_ok());
    }
}
