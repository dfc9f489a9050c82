//! Schema validation helpers.
//!
//! Validates a JSON configuration object against a [`Schema`], producing
//! diagnostics with the offending attribute path.
//!
//! # Example
//!
//! ```
//! use hemmer_provider_commercetools::schema::{Attribute, AttributeFlags, Schema};
//! use hemmer_provider_commercetools::validation::validate;
//! use serde_json::json;
//!
//! let schema = Schema::v0()
//!     .with_attribute("key", Attribute::required_string())
//!     .with_attribute("name", Attribute::localized_string(AttributeFlags::optional()));
//!
//! let diagnostics = validate(&schema, &json!({"key": "draft", "name": {"en": "Draft"}}));
//! assert!(diagnostics.is_empty());
//!
//! let diagnostics = validate(&schema, &json!({"key": "draft", "name": {"english": "Draft"}}));
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(diagnostics[0].attribute.as_deref(), Some("name.english"));
//! ```

use serde_json::Value;
use std::collections::HashSet;

use crate::error::Diagnostic;
use crate::schema::{Attribute, AttributeType, Schema, Validator};

/// Validate a JSON value against a schema.
///
/// Returns a list of diagnostics for any validation errors found.
/// An empty list means the value is valid.
///
/// # Validation Rules
///
/// - Required attributes must be present and non-null
/// - Computed-only attributes must not be set
/// - Attributes not in the schema are rejected
/// - Attribute types must match the schema, and set elements must be unique
/// - Attribute validators must accept the value
pub fn validate(schema: &Schema, value: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let obj = match value {
        Value::Object(map) => map,
        Value::Null => {
            check_required(schema, &serde_json::Map::new(), &mut diagnostics);
            return diagnostics;
        }
        _ => {
            diagnostics.push(
                Diagnostic::error("Expected object")
                    .with_detail(format!("Got {}", value_type_name(value))),
            );
            return diagnostics;
        }
    };

    check_required(schema, obj, &mut diagnostics);

    for (name, attr_value) in obj {
        match schema.attribute(name) {
            Some(attr) => validate_attribute(attr, attr_value, name, &mut diagnostics),
            None => diagnostics.push(
                Diagnostic::error(format!("Unsupported attribute '{}'", name))
                    .with_detail("This attribute is not defined by the schema")
                    .with_attribute(name),
            ),
        }
    }

    diagnostics
}

/// Validate a JSON value against a schema, returning Ok if valid or Err with diagnostics.
pub fn validate_result(schema: &Schema, value: &Value) -> Result<(), Vec<Diagnostic>> {
    let diagnostics = validate(schema, value);
    if diagnostics.is_empty() {
        Ok(())
    } else {
        Err(diagnostics)
    }
}

/// Check if a JSON value is valid against a schema.
pub fn is_valid(schema: &Schema, value: &Value) -> bool {
    validate(schema, value).is_empty()
}

/// Whether `tag` looks like a language tag: `de`, `en-US`, `zh-Hant-TW`.
pub fn is_language_tag(tag: &str) -> bool {
    let mut parts = tag.split('-');
    let primary_ok = parts
        .next()
        .is_some_and(|p| (2..=3).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphabetic()));

    primary_ok
        && parts.all(|p| (1..=8).contains(&p.len()) && p.chars().all(|c| c.is_ascii_alphanumeric()))
}

fn check_required(
    schema: &Schema,
    obj: &serde_json::Map<String, Value>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (name, attr) in &schema.attributes {
        let present = obj.get(name).is_some_and(|v| !v.is_null());
        if attr.flags.required && !present {
            diagnostics.push(
                Diagnostic::error(format!("Missing required attribute '{}'", name))
                    .with_detail("This attribute is required and must be provided")
                    .with_attribute(name),
            );
        }
    }
}

fn validate_attribute(
    attr: &Attribute,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if value.is_null() {
        return;
    }

    if attr.flags.is_computed_only() {
        diagnostics.push(
            Diagnostic::error(format!("Attribute '{}' is read-only", path))
                .with_detail("This attribute is set by the provider and cannot be configured")
                .with_attribute(path),
        );
        return;
    }

    let before = diagnostics.len();
    validate_attribute_type(&attr.attr_type, value, path, diagnostics);
    if diagnostics.len() > before {
        return;
    }

    for validator in &attr.validators {
        run_validator(validator, value, path, diagnostics);
    }
}

fn validate_attribute_type(
    attr_type: &AttributeType,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match attr_type {
        AttributeType::String => {
            if !value.is_string() {
                diagnostics.push(type_error(path, "string", value));
            }
        }
        AttributeType::Int64 => {
            if !value.is_i64() {
                diagnostics.push(type_error(path, "int64", value));
            }
        }
        AttributeType::Bool => {
            if !value.is_boolean() {
                diagnostics.push(type_error(path, "bool", value));
            }
        }
        AttributeType::Set(element_type) => match value.as_array() {
            Some(arr) => {
                validate_elements(element_type, arr, path, diagnostics);

                let mut seen = HashSet::new();
                for elem in arr {
                    if !seen.insert(elem.to_string()) {
                        diagnostics.push(
                            Diagnostic::error(format!("Duplicate element in set '{}'", path))
                                .with_detail(format!("{} appears more than once", elem))
                                .with_attribute(path),
                        );
                    }
                }
            }
            None => diagnostics.push(type_error(path, "set", value)),
        },
        AttributeType::Map(value_type) => match value.as_object() {
            Some(obj) => {
                for (key, val) in obj {
                    let key_path = format!("{}.{}", path, key);
                    validate_attribute_type(value_type, val, &key_path, diagnostics);
                }
            }
            None => diagnostics.push(type_error(path, "map", value)),
        },
    }
}

fn validate_elements(
    element_type: &AttributeType,
    arr: &[Value],
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (i, elem) in arr.iter().enumerate() {
        let elem_path = format!("{}.{}", path, i);
        validate_attribute_type(element_type, elem, &elem_path, diagnostics);
    }
}

fn run_validator(
    validator: &Validator,
    value: &Value,
    path: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match validator {
        Validator::LocalizedStringKeys => {
            let Some(obj) = value.as_object() else {
                return;
            };
            for key in obj.keys().filter(|k| !is_language_tag(k)) {
                diagnostics.push(
                    Diagnostic::error(format!("Invalid language tag '{}'", key))
                        .with_detail(
                            "LocalizedString keys must be language tags such as 'en' or 'de-DE'",
                        )
                        .with_attribute(format!("{}.{}", path, key)),
                );
            }
        }
        Validator::OneOf(allowed) => {
            let check = |v: &Value, at: String, diagnostics: &mut Vec<Diagnostic>| {
                if let Some(s) = v.as_str() {
                    if !allowed.iter().any(|a| *a == s) {
                        diagnostics.push(
                            Diagnostic::error(format!("Unsupported value '{}'", s))
                                .with_detail(format!("Expected one of: {}", allowed.join(", ")))
                                .with_attribute(at),
                        );
                    }
                }
            };
            match value {
                Value::Array(arr) => {
                    for (i, elem) in arr.iter().enumerate() {
                        check(elem, format!("{}.{}", path, i), diagnostics);
                    }
                }
                other => check(other, path.to_string(), diagnostics),
            }
        }
    }
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_error(path: &str, expected: &str, got: &Value) -> Diagnostic {
    Diagnostic::error(format!("Invalid type for '{}'", path))
        .with_detail(format!("Expected {}, got {}", expected, value_type_name(got)))
        .with_attribute(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttributeFlags;
    use serde_json::json;

    fn state_like_schema() -> Schema {
        Schema::v0()
            .with_attribute("id", Attribute::computed_string())
            .with_attribute("key", Attribute::required_string())
            .with_attribute(
                "type",
                Attribute::required_string()
                    .with_validator(Validator::OneOf(vec!["ReviewState", "OrderState"])),
            )
            .with_attribute("name", Attribute::localized_string(AttributeFlags::optional()))
            .with_attribute("initial", Attribute::optional_bool())
            .with_attribute(
                "roles",
                Attribute::optional_string_set()
                    .with_validator(Validator::OneOf(vec!["ReviewIncludedInStatistics", "Return"])),
            )
            .with_attribute("transitions", Attribute::optional_string_set())
    }

    #[test]
    fn test_validate_valid_config() {
        let diagnostics = validate(
            &state_like_schema(),
            &json!({
                "key": "state-c",
                "type": "ReviewState",
                "name": {"en": "State C", "nl-NL": "Staat C"},
                "roles": ["ReviewIncludedInStatistics"],
                "transitions": null
            }),
        );
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    }

    #[test]
    fn test_validate_required() {
        let diagnostics = validate(&state_like_schema(), &json!({"type": "ReviewState"}));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("key"));
        assert!(diagnostics[0].summary.contains("Missing required"));

        let diagnostics = validate(&state_like_schema(), &json!(null));
        assert_eq!(diagnostics.len(), 2);
    }

    #[test]
    fn test_validate_computed_rejected() {
        let diagnostics = validate(
            &state_like_schema(),
            &json!({"id": "abc", "key": "k", "type": "ReviewState"}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("read-only"));
    }

    #[test]
    fn test_validate_unknown_attribute() {
        let diagnostics = validate(
            &state_like_schema(),
            &json!({"key": "k", "type": "ReviewState", "colour": "red"}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].attribute.as_deref(), Some("colour"));
    }

    #[test]
    fn test_validate_types() {
        let diagnostics = validate(
            &state_like_schema(),
            &json!({"key": 7, "type": "ReviewState", "initial": "yes", "name": {"en": 1}}),
        );
        let paths: Vec<_> = diagnostics
            .iter()
            .filter_map(|d| d.attribute.as_deref())
            .collect();
        assert_eq!(diagnostics.len(), 3);
        assert!(paths.contains(&"key"));
        assert!(paths.contains(&"initial"));
        assert!(paths.contains(&"name.en"));
    }

    #[test]
    fn test_validate_one_of() {
        let diagnostics = validate(
            &state_like_schema(),
            &json!({"key": "k", "type": "Bogus", "roles": ["Return", "Refund"]}),
        );
        let paths: Vec<_> = diagnostics
            .iter()
            .filter_map(|d| d.attribute.as_deref())
            .collect();
        assert_eq!(paths, vec!["roles.1", "type"]);
    }

    #[test]
    fn test_validate_set_duplicates() {
        let diagnostics = validate(
            &state_like_schema(),
            &json!({"key": "k", "type": "ReviewState", "transitions": ["a", "a"]}),
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].summary.contains("Duplicate"));
    }

    #[test]
    fn test_validate_root_not_object() {
        let diagnostics = validate(&state_like_schema(), &json!("nope"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].summary, "Expected object");
    }

    #[test]
    fn test_language_tags() {
        assert!(is_language_tag("en"));
        assert!(is_language_tag("de-DE"));
        assert!(is_language_tag("zh-Hant-TW"));
        assert!(!is_language_tag(""));
        assert!(!is_language_tag("english"));
        assert!(!is_language_tag("en_US"));
        assert!(!is_language_tag("en-"));
    }

    #[test]
    fn test_result_helpers() {
        let schema = state_like_schema();
        assert!(is_valid(&schema, &json!({"key": "k", "type": "OrderState"})));
        assert!(validate_result(&schema, &json!({})).is_err());
    }
}
