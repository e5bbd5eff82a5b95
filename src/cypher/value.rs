//! Parameter value encoding.
//!
//! Values bound for integer-typed properties cross the parameter boundary
//! as a `{low, high}` pair of 32-bit two's-complement halves. Existing
//! consumers depend on that exact bit-level shape, so it is part of the
//! external contract rather than an implementation detail.

use serde_json::{json, Number, Value};
use thiserror::Error;

use crate::type_model::{FieldType, ScalarKind};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValueError {
    #[error("Expected a {expected} value for \"{field}\", found {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: String,
    },
    #[error("Integer value for \"{field}\" is out of range")]
    IntOutOfRange { field: String },
}

/// Split an i64 into the `{low, high}` 32-bit halves used on the wire.
pub fn int_parts(v: i64) -> (i32, i32) {
    let low = (v & 0xFFFF_FFFF) as u32 as i32;
    let high = (v >> 32) as i32;
    (low, high)
}

/// Encode an i64 as its `{low, high}` parameter representation.
pub fn encode_int(v: i64) -> Value {
    let (low, high) = int_parts(v);
    json!({ "low": low, "high": high })
}

/// Convert an operation argument value into its parameter representation
/// for a field of the given type. `list` maps the conversion over array
/// elements.
pub fn scalar_param(
    field_name: &str,
    field_type: &FieldType,
    list: bool,
    value: &Value,
) -> Result<Value, ValueError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    if list {
        let items = value.as_array().ok_or_else(|| mismatch(field_name, "list", value))?;
        let converted = items
            .iter()
            .map(|item| scalar_param(field_name, field_type, false, item))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Value::Array(converted));
    }

    match field_type {
        FieldType::Scalar(ScalarKind::Id) => match value {
            // IDs always travel as strings, whatever the author wrote.
            Value::String(s) => Ok(Value::String(s.clone())),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            other => Err(mismatch(field_name, "ID", other)),
        },
        FieldType::Scalar(ScalarKind::String) => match value {
            Value::String(s) => Ok(Value::String(s.clone())),
            other => Err(mismatch(field_name, "String", other)),
        },
        FieldType::Scalar(ScalarKind::Int) => {
            let n = value.as_i64().ok_or_else(|| {
                if value.is_number() {
                    ValueError::IntOutOfRange { field: field_name.to_string() }
                } else {
                    mismatch(field_name, "Int", value)
                }
            })?;
            Ok(encode_int(n))
        }
        FieldType::Scalar(ScalarKind::Float) => {
            let f = value.as_f64().ok_or_else(|| mismatch(field_name, "Float", value))?;
            Ok(Value::Number(
                Number::from_f64(f).ok_or(ValueError::IntOutOfRange {
                    field: field_name.to_string(),
                })?,
            ))
        }
        FieldType::Scalar(ScalarKind::Boolean) => match value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            other => Err(mismatch(field_name, "Boolean", other)),
        },
        FieldType::Enum(_) => match value {
            Value::String(s) => Ok(Value::String(s.clone())),
            other => Err(mismatch(field_name, "enum", other)),
        },
        FieldType::Custom(_) => Ok(value.clone()),
    }
}

fn mismatch(field: &str, expected: &'static str, found: &Value) -> ValueError {
    let found = match found {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "a boolean".to_string(),
        Value::Number(_) => "a number".to_string(),
        Value::String(_) => "a string".to_string(),
        Value::Array(_) => "a list".to_string(),
        Value::Object(_) => "an object".to_string(),
    };
    ValueError::TypeMismatch { field: field.to_string(), expected, found }
}
