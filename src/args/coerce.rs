//! Validation and numeric coercion of option and data values

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::config_file::ConfigError;
use crate::error::RouterError;

static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").unwrap());
static FLOAT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[+-]?[0-9]*\.?[0-9]*$").unwrap());

/// A classified option or data value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ArgValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Text(s) => f.write_str(s),
            ArgValue::Integer(i) => write!(f, "{i}"),
            ArgValue::Float(x) => write!(f, "{x}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Integer,
    Float,
}

impl ValueType {
    /// Interpret a spec's `type` declaration for `name`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownType` for anything but `integer` or `float`.
    pub fn parse(name: &str, declared: &str) -> Result<Self, ConfigError> {
        match declared {
            "integer" => Ok(ValueType::Integer),
            "float" => Ok(ValueType::Float),
            other => Err(ConfigError::UnknownType {
                name: name.to_string(),
                value: other.to_string(),
            }),
        }
    }

    fn label(self) -> &'static str {
        match self {
            ValueType::Integer => "integer",
            ValueType::Float => "float",
        }
    }
}

fn parse_integer(value: &str) -> Option<i64> {
    if INTEGER.is_match(value) {
        value.parse().ok()
    } else {
        None
    }
}

fn parse_float(value: &str) -> Option<f64> {
    let digits = value.trim_start_matches(['+', '-']);
    if !FLOAT.is_match(value) || digits.is_empty() || digits == "." {
        return None;
    }
    value.parse().ok()
}

/// Check `value` against the accepted values, then coerce it to the declared type.
///
/// # Errors
///
/// Returns `RouterError::UnrecognizedValue` if `value` is not accepted,
/// `RouterError::TypeMismatch` if it does not parse as the declared type, and
/// `RouterError::Configuration` if the declared type itself is unknown.
pub fn coerce_value(
    name: &str,
    value: &str,
    accepts: Option<&[String]>,
    declared_type: Option<&str>,
) -> Result<ArgValue, RouterError> {
    if let Some(accepts) = accepts
        && !accepts.iter().any(|accepted| accepted == value)
    {
        return Err(RouterError::UnrecognizedValue {
            name: name.to_string(),
            value: value.to_string(),
            accepts: accepts.to_vec(),
        });
    }
    let Some(declared) = declared_type else {
        return Ok(ArgValue::Text(value.to_string()));
    };
    let value_type = ValueType::parse(name, declared)?;
    let coerced = match value_type {
        ValueType::Integer => parse_integer(value).map(ArgValue::Integer),
        ValueType::Float => parse_float(value).map(ArgValue::Float),
    };
    coerced.ok_or_else(|| RouterError::TypeMismatch {
        name: name.to_string(),
        value: value.to_string(),
        expected: value_type.label().to_string(),
    })
}
