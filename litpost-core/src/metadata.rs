//! Reserved module-level metadata attributes.
//!
//! A post declares its metadata as plain top-level assignments:
//!
//! ```python
//! id = 7
//! title = "Hello"
//! author = "A"
//! date = (2020, 1, 1)
//! tags = ("python", "testing")
//! ```
//!
//! These assignments are invisible in the rendered post. Their values arrive
//! here as JSON values from a [`ModuleLoader`](crate::backend::ModuleLoader).

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

pub const DATE: &str = "date";
pub const UPDATED: &str = "updated";
pub const TITLE: &str = "title";
pub const TAGS: &str = "tags";
pub const AUTHOR: &str = "author";
pub const DRAFT: &str = "draft";

/// Metadata names other than the (configurable) identifier
pub const FIXED_ATTRIBUTES: &[&str] = &[DATE, UPDATED, TITLE, TAGS, AUTHOR, DRAFT];

/// Attribute values by name, as read from a loaded module
pub type Attributes = BTreeMap<String, Value>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttributeError {
    #[error("Missing required attribute: {0}")]
    Missing(String),

    #[error("Attribute `{name}` should be {expected}, found {found}")]
    WrongType {
        name: String,
        expected: &'static str,
        found: String,
    },

    #[error("Attribute `{name}` is not a valid date: {reason}")]
    InvalidDate { name: String, reason: String },
}

fn wrong_type(name: &str, expected: &'static str, value: &Value) -> AttributeError {
    AttributeError::WrongType {
        name: name.to_string(),
        expected,
        found: value.to_string(),
    }
}

/// Read a required string attribute
pub fn required_str(attrs: &Attributes, name: &str) -> Result<String, AttributeError> {
    match attrs.get(name) {
        None | Some(Value::Null) => Err(AttributeError::Missing(name.to_string())),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(wrong_type(name, "a string", other)),
    }
}

/// Read a required integer attribute
pub fn required_int(attrs: &Attributes, name: &str) -> Result<i64, AttributeError> {
    match attrs.get(name) {
        None | Some(Value::Null) => Err(AttributeError::Missing(name.to_string())),
        Some(v @ Value::Number(n)) => n.as_i64().ok_or_else(|| wrong_type(name, "an integer", v)),
        Some(other) => Err(wrong_type(name, "an integer", other)),
    }
}

/// Read an optional boolean attribute
pub fn optional_bool(attrs: &Attributes, name: &str) -> Result<Option<bool>, AttributeError> {
    match attrs.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(wrong_type(name, "a boolean", other)),
    }
}

/// Read an optional sequence of strings
pub fn optional_strings(
    attrs: &Attributes,
    name: &str,
) -> Result<Option<Vec<String>>, AttributeError> {
    let items = match attrs.get(name) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(other) => return Err(wrong_type(name, "a sequence of strings", other)),
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            other => Err(wrong_type(name, "a sequence of strings", other)),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Read an optional date tuple: `(year, month, day[, hour, minute, second[, microsecond]])`
pub fn optional_datetime(
    attrs: &Attributes,
    name: &str,
) -> Result<Option<NaiveDateTime>, AttributeError> {
    let parts = match attrs.get(name) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(parts)) => parts,
        Some(other) => return Err(wrong_type(name, "a date tuple", other)),
    };

    let invalid = |reason: &str| AttributeError::InvalidDate {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if !(3..=7).contains(&parts.len()) {
        return Err(invalid("expected between 3 and 7 components"));
    }

    let mut numbers = [0i64, 1, 1, 0, 0, 0, 0];
    for (slot, part) in numbers.iter_mut().zip(parts) {
        *slot = part
            .as_i64()
            .ok_or_else(|| invalid("components must be integers"))?;
    }

    let component = |i: usize| u32::try_from(numbers[i]).map_err(|_| invalid("negative component"));
    let year = i32::try_from(numbers[0]).map_err(|_| invalid("year out of range"))?;

    NaiveDate::from_ymd_opt(year, component(1)?, component(2)?)
        .ok_or_else(|| invalid("no such calendar day"))?
        .and_hms_micro_opt(component(3)?, component(4)?, component(5)?, component(6)?)
        .ok_or_else(|| invalid("no such time of day"))
        .map(Some)
}

/// Read a required date tuple
pub fn required_datetime(attrs: &Attributes, name: &str) -> Result<NaiveDateTime, AttributeError> {
    optional_datetime(attrs, name)?.ok_or_else(|| AttributeError::Missing(name.to_string()))
}
