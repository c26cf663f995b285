//! Request validation for housing feature records.
//!
//! Checks run in a fixed order and stop at the first violation:
//! 1. payload shape and required fields (declaration order)
//! 2. unexpected fields (unless allowed)
//! 3. per-field bounds (declaration order)
//! 4. cross-field consistency rules

use crate::domain::errors::{ValidationCode, ValidationError};
use crate::domain::housing::features::{FeatureRecord, HousingFeatures, INPUT_FEATURES};
use serde_json::Value;

/// Inclusive domain of one input feature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRule {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
}

impl FieldRule {
    const fn new(name: &'static str, min: f64, max: f64) -> Self {
        Self { name, min, max }
    }

    fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Relationship that must hold between two validated fields
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CrossFieldRule {
    /// `field <= bound`
    NotGreaterThan {
        field: &'static str,
        bound: &'static str,
    },
}

/// California block-group bounds. Index-aligned with `INPUT_FEATURES`.
pub const CALIFORNIA_RULES: [FieldRule; 8] = [
    FieldRule::new("MedInc", 0.0, 15.0),
    FieldRule::new("HouseAge", 0.0, 100.0),
    FieldRule::new("AveRooms", 1.0, 20.0),
    FieldRule::new("AveBedrms", 0.0, 5.0),
    FieldRule::new("Population", 0.0, 50_000.0),
    FieldRule::new("AveOccup", 0.5, 20.0),
    FieldRule::new("Latitude", 32.0, 42.0),
    FieldRule::new("Longitude", -125.0, -114.0),
];

#[derive(Debug, Clone)]
pub struct Validator {
    rules: [FieldRule; 8],
    cross_rules: Vec<CrossFieldRule>,
    allow_unknown_fields: bool,
}

impl Default for Validator {
    fn default() -> Self {
        Self::california()
    }
}

impl Validator {
    pub fn california() -> Self {
        Self {
            rules: CALIFORNIA_RULES,
            cross_rules: vec![CrossFieldRule::NotGreaterThan {
                field: "AveBedrms",
                bound: "AveRooms",
            }],
            allow_unknown_fields: false,
        }
    }

    pub fn allow_unknown_fields(mut self, allow: bool) -> Self {
        self.allow_unknown_fields = allow;
        self
    }

    /// Override the bounds of one field. Unknown names are ignored.
    pub fn with_bounds(mut self, name: &str, min: f64, max: f64) -> Self {
        if let Some(rule) = self.rules.iter_mut().find(|r| r.name == name) {
            rule.min = min;
            rule.max = max;
        }
        self
    }

    /// Validate an arbitrary JSON payload
    pub fn validate_value(&self, payload: &Value) -> Result<HousingFeatures, ValidationError> {
        match payload {
            Value::Object(record) => self.validate(record),
            other => Err(ValidationError::new(
                ValidationCode::InvalidPayload,
                None,
                format!("Expected a JSON object, got {}", json_type_name(other)),
            )),
        }
    }

    pub fn validate(&self, record: &FeatureRecord) -> Result<HousingFeatures, ValidationError> {
        let mut values = [0.0_f64; 8];

        for (slot, name) in values.iter_mut().zip(INPUT_FEATURES) {
            let raw = record.get(name).ok_or_else(|| {
                ValidationError::new(
                    ValidationCode::MissingField,
                    Some(name),
                    format!("Required field {name} is missing"),
                )
            })?;

            let number = raw.as_f64().ok_or_else(|| {
                ValidationError::new(
                    ValidationCode::InvalidType,
                    Some(name),
                    format!("{name} must be a number, got {}", json_type_name(raw)),
                )
            })?;

            if !number.is_finite() {
                return Err(ValidationError::new(
                    ValidationCode::NonFinite,
                    Some(name),
                    format!("{name} must be a finite number"),
                ));
            }

            *slot = number;
        }

        if !self.allow_unknown_fields
            && let Some(extra) = record
                .keys()
                .find(|key| !INPUT_FEATURES.contains(&key.as_str()))
        {
            return Err(ValidationError::new(
                ValidationCode::UnexpectedField,
                Some(extra),
                format!("Field {extra} is not part of the feature schema"),
            ));
        }

        for (rule, value) in self.rules.iter().zip(values) {
            if !rule.contains(value) {
                return Err(ValidationError::new(
                    ValidationCode::OutOfRange,
                    Some(rule.name),
                    format!(
                        "{} must be within [{}, {}], got {}",
                        rule.name, rule.min, rule.max, value
                    ),
                ));
            }
        }

        let features = HousingFeatures::from_values(values);

        for cross in &self.cross_rules {
            match *cross {
                CrossFieldRule::NotGreaterThan { field, bound } => {
                    let (Some(lhs), Some(rhs)) = (features.get(field), features.get(bound)) else {
                        continue;
                    };
                    if lhs > rhs {
                        return Err(ValidationError::new(
                            ValidationCode::InconsistentFields,
                            Some(field),
                            format!("{field} ({lhs}) must not exceed {bound} ({rhs})"),
                        ));
                    }
                }
            }
        }

        Ok(features)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
