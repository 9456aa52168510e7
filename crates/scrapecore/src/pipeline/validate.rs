//! Validator: rule-based field validation, strict or lenient.

use super::value::Value;
use crate::error::CoreError;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
}

#[derive(Debug, Clone)]
pub struct ValidationRule {
    pub field: String,
    pub field_type: FieldType,
    pub required: bool,
    pub min_len: Option<usize>,
    pub max_len: Option<usize>,
    pub allowed_values: Option<Vec<String>>,
    pub default: Option<Value>,
}

fn type_matches(value: &Value, expected: FieldType) -> bool {
    matches!(
        (value, expected),
        (Value::String(_), FieldType::String) | (Value::Int(_) | Value::Float(_), FieldType::Number) | (Value::Bool(_), FieldType::Boolean)
    )
}

/// Validates `record` against `rules`. In strict mode any violation is a
/// `CoreError::Validation`; in lenient mode violations substitute a default
/// (or remove the field) and are returned alongside the possibly-modified
/// record.
pub fn validate(
    record: &mut BTreeMap<String, Value>,
    rules: &[ValidationRule],
    strict: bool,
) -> Result<Vec<String>, CoreError> {
    let mut warnings = Vec::new();

    for rule in rules {
        match record.get(&rule.field) {
            None => {
                if rule.required {
                    if strict {
                        return Err(CoreError::Validation { field: rule.field.clone(), reason: "required field missing".to_string() });
                    }
                    match &rule.default {
                        Some(default) => {
                            record.insert(rule.field.clone(), default.clone());
                            warnings.push(format!("field '{}' missing, substituted default", rule.field));
                        }
                        None => warnings.push(format!("field '{}' missing, no default available", rule.field)),
                    }
                }
            }
            Some(value) => {
                if let Err(reason) = check_value(value, rule) {
                    if strict {
                        return Err(CoreError::Validation { field: rule.field.clone(), reason });
                    }
                    warnings.push(format!("field '{}': {reason}", rule.field));
                    match &rule.default {
                        Some(default) => {
                            record.insert(rule.field.clone(), default.clone());
                        }
                        None => {
                            record.remove(&rule.field);
                        }
                    }
                }
            }
        }
    }

    Ok(warnings)
}

fn check_value(value: &Value, rule: &ValidationRule) -> Result<(), String> {
    if !type_matches(value, rule.field_type) {
        return Err(format!("expected type {:?}", rule.field_type));
    }
    if let Value::String(s) = value {
        if let Some(min) = rule.min_len {
            if s.len() < min {
                return Err(format!("shorter than min_len {min}"));
            }
        }
        if let Some(max) = rule.max_len {
            if s.len() > max {
                return Err(format!("longer than max_len {max}"));
            }
        }
        if let Some(allowed) = &rule.allowed_values {
            if !allowed.iter().any(|v| v == s) {
                return Err(format!("'{s}' not in allowed values"));
            }
        }
    }
    Ok(())
}
