//! Schema consistency checks.
//!
//! [`validate`] collects every violation rather than stopping at the first,
//! so a user can fix a schema in one pass. A schema with any violation
//! produces no output at all.

use std::collections::BTreeSet;

use tracing::debug;

use crate::builder::BuilderRegistry;
use crate::error::ValidationError;
use crate::schema::{Schema, TypeTable, type_references};

/// Returns every violation found in `schema`; empty means valid.
///
/// Output languages are checked against `registry`, so a schema is only
/// valid for the builders that will actually run.
pub fn validate(schema: &Schema, registry: &BuilderRegistry) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if schema.api_path.trim().is_empty() {
        errors.push(empty("apiPath"));
    }

    check_outputs(schema, registry, &mut errors);
    check_definitions(schema, &mut errors);
    check_actions(schema, &mut errors);

    // Names are fully known only now, so types are resolved in a second pass.
    let table = TypeTable::new(schema);
    for (location, raw) in type_references(schema) {
        if raw.trim().is_empty() {
            errors.push(empty(format!("{location}.type")));
        } else if table.resolve(raw).is_none() {
            errors.push(ValidationError::UnresolvedType {
                location,
                type_name: raw.to_string(),
            });
        }
    }

    debug!(violations = errors.len(), "validated schema");
    errors
}

fn empty(location: impl Into<String>) -> ValidationError {
    ValidationError::EmptyField {
        location: location.into(),
    }
}

fn check_outputs(schema: &Schema, registry: &BuilderRegistry, errors: &mut Vec<ValidationError>) {
    if schema.outputs.is_empty() {
        errors.push(ValidationError::NoOutputs);
        return;
    }

    for (index, output) in schema.outputs.iter().enumerate() {
        if output.output_kind().is_none() {
            errors.push(ValidationError::InvalidKind {
                index,
                kind: output.kind.clone(),
            });
        }
        if output.language.trim().is_empty() {
            errors.push(empty(format!("outputs[{index}].language")));
        } else if !registry.contains(&output.language) {
            errors.push(ValidationError::UnknownLanguage {
                index,
                language: output.language.clone(),
            });
        }
        if output.file_path.trim().is_empty() {
            errors.push(empty(format!("outputs[{index}].filePath")));
        }
    }
}

fn check_definitions(schema: &Schema, errors: &mut Vec<ValidationError>) {
    for (name, definition) in &schema.definitions {
        if name.trim().is_empty() {
            errors.push(empty("definitions"));
            continue;
        }

        if let Some(import) = &definition.import {
            if !definition.attributes.is_empty() {
                errors.push(ValidationError::ImportWithAttributes {
                    definition: name.clone(),
                });
            }
            if import.from.trim().is_empty() || import.name.trim().is_empty() {
                errors.push(ValidationError::IncompleteImport {
                    definition: name.clone(),
                });
            }
            continue;
        }

        check_names(
            &format!("definitions.{name}.attributes"),
            definition.attributes.iter().map(|a| a.name.as_str()),
            errors,
        );
    }
}

fn check_actions(schema: &Schema, errors: &mut Vec<ValidationError>) {
    for (name, action) in &schema.actions {
        if name.trim().is_empty() {
            errors.push(empty("actions"));
            continue;
        }

        if action.http_method().is_none() {
            errors.push(ValidationError::InvalidMethod {
                action: name.clone(),
                method: action.method.clone(),
            });
        }

        check_names(
            &format!("actions.{name}.parameters"),
            action.parameters.iter().map(|p| p.name.as_str()),
            errors,
        );
    }
}

/// Flags empty and repeated names in one ordered sequence.
fn check_names<'a>(
    location: &str,
    names: impl Iterator<Item = &'a str>,
    errors: &mut Vec<ValidationError>,
) {
    let mut seen = BTreeSet::new();
    for (index, name) in names.enumerate() {
        if name.trim().is_empty() {
            errors.push(empty(format!("{location}[{index}].name")));
        } else if !seen.insert(name) {
            errors.push(ValidationError::DuplicateName {
                location: location.to_string(),
                name: name.to_string(),
            });
        }
    }
}
