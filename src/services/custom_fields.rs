//! Validation and normalisation of the custom field values submitted with a
//! new ticket.
//!
//! The caller resolves the active definitions visible at the ticket's
//! category/subcategory scope first; [`validate_submission`] then checks the
//! submitted values against them and produces one [`NormalizedFieldValue`]
//! per value row to persist.

use crate::error::TaxonomyError;
use crate::models::{CustomFieldDefinitionModel, FieldType};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct SubmittedFieldValue {
    pub field_definition_id: i32,
    /// Raw value; `null` or a blank string counts as not submitted.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub value: Value,
}

/// Typed custom field value. `select` fields store the chosen option as text.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl FieldValue {
    /// Canonical string form stored in `value_text`.
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    /// Typed JSON form stored in `value_json`.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Date(_) => Value::String(self.to_text()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFieldValue {
    pub field_definition_id: i32,
    pub value: FieldValue,
}

/// Checks `submitted` against the active `definitions` for a ticket scope.
///
/// Unknown or repeated definition ids are rejected before any value is
/// coerced. Definitions without a submitted value are skipped unless they are
/// required.
pub fn validate_submission(
    definitions: &[CustomFieldDefinitionModel],
    submitted: &[SubmittedFieldValue],
) -> Result<Vec<NormalizedFieldValue>, TaxonomyError> {
    let known: HashSet<i32> = definitions.iter().map(|d| d.id).collect();
    let mut by_id: HashMap<i32, &Value> = HashMap::with_capacity(submitted.len());

    for entry in submitted {
        if !known.contains(&entry.field_definition_id) {
            return Err(TaxonomyError::UnknownField(entry.field_definition_id));
        }
        if by_id.insert(entry.field_definition_id, &entry.value).is_some() {
            return Err(TaxonomyError::DuplicateField(entry.field_definition_id));
        }
    }

    let mut normalized = Vec::new();
    for definition in definitions {
        let raw = by_id
            .get(&definition.id)
            .copied()
            .filter(|v| !is_blank(v));

        match raw {
            None if definition.required => {
                return Err(TaxonomyError::MissingRequiredField {
                    field_id: definition.id,
                    label: definition.label.clone(),
                });
            }
            None => continue,
            Some(raw) => normalized.push(NormalizedFieldValue {
                field_definition_id: definition.id,
                value: coerce(definition, raw)?,
            }),
        }
    }

    Ok(normalized)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn coerce(definition: &CustomFieldDefinitionModel, raw: &Value) -> Result<FieldValue, TaxonomyError> {
    let invalid = |reason: &str| TaxonomyError::InvalidFieldValue {
        field_id: definition.id,
        label: definition.label.clone(),
        reason: reason.to_string(),
    };

    match definition.field_type {
        FieldType::Text => match raw {
            Value::String(s) => Ok(FieldValue::Text(s.trim().to_string())),
            _ => Err(invalid("expected text")),
        },
        FieldType::Number => {
            let number = match raw {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            number
                .filter(|n| n.is_finite())
                .map(FieldValue::Number)
                .ok_or_else(|| invalid("expected a finite number"))
        }
        FieldType::Date => raw
            .as_str()
            .and_then(parse_date)
            .map(FieldValue::Date)
            .ok_or_else(|| invalid("expected an ISO date (YYYY-MM-DD)")),
        FieldType::Checkbox => match raw {
            Value::Bool(b) => Ok(FieldValue::Bool(*b)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(FieldValue::Bool(true)),
                "false" => Ok(FieldValue::Bool(false)),
                _ => Err(invalid("expected true or false")),
            },
            _ => Err(invalid("expected true or false")),
        },
        FieldType::Select => {
            let choice = raw
                .as_str()
                .map(str::trim)
                .ok_or_else(|| invalid("expected one of the listed options"))?;
            if definition.options().iter().any(|o| o == choice) {
                Ok(FieldValue::Text(choice.to_string()))
            } else {
                Err(invalid("expected one of the listed options"))
            }
        }
    }
}

/// Accepts a bare `YYYY-MM-DD` date or an ISO-8601 timestamp and keeps only
/// the calendar date.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}
