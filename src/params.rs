//! Typed parameter values and binding against a descriptor.
//!
//! Units never see loosely typed input: the controller binds whatever the
//! caller supplied against the descriptor's parameter specs, fills gaps from
//! the declared defaults, and hands the unit a [`Parameters`] map whose values
//! already carry the declared type.

use crate::catalog::{ParamType, ScriptDescriptor};
use crate::error::ParameterError;
use anyhow::{Result, anyhow};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// One parameter value, tagged with its type.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
}

impl ParamValue {
    pub fn param_type(&self) -> ParamType {
        match self {
            ParamValue::Int(_) => ParamType::Int,
            ParamValue::Float(_) => ParamType::Float,
            ParamValue::String(_) => ParamType::String,
            ParamValue::Bool(_) => ParamType::Bool,
        }
    }

    /// Read a config value (e.g. a `default`) as the declared type.
    ///
    /// Integers are accepted for `float` so `default: 0` works for float
    /// parameters; nothing else is converted.
    pub fn from_json(expected: ParamType, value: &Value) -> Option<Self> {
        match expected {
            ParamType::Int => value.as_i64().map(ParamValue::Int),
            ParamType::Float => value.as_f64().map(ParamValue::Float),
            ParamType::String => value.as_str().map(|s| ParamValue::String(s.to_string())),
            ParamType::Bool => value.as_bool().map(ParamValue::Bool),
        }
    }

    /// Parse user-entered text as the declared type.
    pub fn parse(expected: ParamType, raw: &str) -> Option<Self> {
        match expected {
            ParamType::Int => raw.trim().parse().ok().map(ParamValue::Int),
            ParamType::Float => raw.trim().parse().ok().map(ParamValue::Float),
            ParamType::String => Some(ParamValue::String(raw.to_string())),
            ParamType::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(ParamValue::Bool(true)),
                "false" | "no" | "off" | "0" => Some(ParamValue::Bool(false)),
                _ => None,
            },
        }
    }

    /// Convert to `expected`, widening int to float. `None` on any other mismatch.
    pub fn conform(self, expected: ParamType) -> Option<Self> {
        match (self, expected) {
            (ParamValue::Int(v), ParamType::Float) => Some(ParamValue::Float(v as f64)),
            (value, expected) if value.param_type() == expected => Some(value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::String(v) => f.write_str(v),
            ParamValue::Bool(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

/// Named parameter values handed to a unit's `run`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Parameters {
    values: BTreeMap<String, ParamValue>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Option<ParamValue> {
        self.values.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn int(&self, name: &str) -> Result<i64> {
        self.typed(name, ParamType::Int, ParamValue::as_i64)
    }

    pub fn float(&self, name: &str) -> Result<f64> {
        self.typed(name, ParamType::Float, ParamValue::as_f64)
    }

    pub fn string(&self, name: &str) -> Result<&str> {
        self.typed(name, ParamType::String, ParamValue::as_str)
    }

    pub fn bool(&self, name: &str) -> Result<bool> {
        self.typed(name, ParamType::Bool, ParamValue::as_bool)
    }

    fn typed<'a, T>(
        &'a self,
        name: &str,
        expected: ParamType,
        extract: impl FnOnce(&'a ParamValue) -> Option<T>,
    ) -> Result<T> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| anyhow!("parameter {name} was not supplied"))?;
        extract(value).ok_or_else(|| {
            anyhow!(
                "parameter {name} is {}, expected {expected}",
                value.param_type()
            )
        })
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Bind typed values against the descriptor's parameter specs.
///
/// Unknown names are rejected, missing ones take the declared default, and
/// every supplied value must conform to its declared type.
pub fn bind_parameters(
    descriptor: &ScriptDescriptor,
    supplied: Parameters,
) -> Result<Parameters, ParameterError> {
    let mut bound = BTreeMap::new();
    for (name, value) in supplied.values {
        let spec = descriptor
            .parameters
            .get(&name)
            .ok_or_else(|| ParameterError::Unknown {
                script: descriptor.name.clone(),
                name: name.clone(),
            })?;
        let found = value.param_type();
        let value = value
            .conform(spec.param_type)
            .ok_or_else(|| ParameterError::TypeMismatch {
                name: name.clone(),
                expected: spec.param_type,
                found,
            })?;
        bound.insert(name, value);
    }
    fill_defaults(descriptor, &mut bound);
    Ok(Parameters { values: bound })
}

/// Parse `(name, text)` pairs from a form or command line, then bind them.
///
/// A field left blank counts as not supplied and takes the declared default.
/// For string parameters only the empty string is blank; surrounding spaces
/// are kept.
pub fn coerce_text(
    descriptor: &ScriptDescriptor,
    raw: &[(String, String)],
) -> Result<Parameters, ParameterError> {
    let mut bound = BTreeMap::new();
    for (name, text) in raw {
        let spec = descriptor
            .parameters
            .get(name)
            .ok_or_else(|| ParameterError::Unknown {
                script: descriptor.name.clone(),
                name: name.clone(),
            })?;
        if is_blank(spec.param_type, text) {
            continue;
        }
        let value = ParamValue::parse(spec.param_type, text).ok_or_else(|| {
            ParameterError::InvalidValue {
                name: name.clone(),
                expected: spec.param_type,
                raw: text.clone(),
            }
        })?;
        bound.insert(name.clone(), value);
    }
    fill_defaults(descriptor, &mut bound);
    Ok(Parameters { values: bound })
}

fn is_blank(param_type: ParamType, text: &str) -> bool {
    match param_type {
        ParamType::String => text.is_empty(),
        _ => text.trim().is_empty(),
    }
}

fn fill_defaults(descriptor: &ScriptDescriptor, bound: &mut BTreeMap<String, ParamValue>) {
    for (name, spec) in &descriptor.parameters {
        bound
            .entry(name.clone())
            .or_insert_with(|| spec.default.clone());
    }
}
