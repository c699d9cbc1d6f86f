//! Shape checks for raw script descriptors.
//!
//! Validation is fail-fast: the first problem aborts with a [`ConfigError`]
//! naming the offending field, and a load that hits one never exposes a
//! partial registry. The checks are a pure function of the record.

use crate::catalog::identity::{Locator, ParamType};
use crate::catalog::model::{ParamSpec, ScriptDescriptor};
use crate::error::ConfigError;
use crate::params::ParamValue;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const REQUIRED_FIELDS: [&str; 5] = ["name", "module", "class", "input_required", "parameters"];
const REQUIRED_PARAM_FIELDS: [&str; 3] = ["type", "default", "help"];

/// Check one raw descriptor record.
pub fn validate(raw: &Value) -> Result<(), ConfigError> {
    parse_descriptor(raw).map(|_| ())
}

pub(crate) fn parse_descriptor(raw: &Value) -> Result<ScriptDescriptor, ConfigError> {
    let entry = raw.as_object().ok_or(ConfigError::EntryNotMapping)?;
    for field in REQUIRED_FIELDS {
        if !entry.contains_key(field) {
            return Err(ConfigError::MissingField(field.to_string()));
        }
    }

    let name = non_empty_str(entry, "name")?;
    let module = non_empty_str(entry, "module")?;
    let class = non_empty_str(entry, "class")?;
    let input_required = entry["input_required"]
        .as_bool()
        .ok_or_else(|| ConfigError::InvalidField {
            field: "input_required".to_string(),
            expected: "a boolean",
        })?;

    let raw_params = entry["parameters"]
        .as_object()
        .ok_or(ConfigError::ParametersNotMapping)?;
    let mut parameters = BTreeMap::new();
    for (param_name, meta) in raw_params {
        parameters.insert(param_name.clone(), parse_param_spec(param_name, meta)?);
    }

    Ok(ScriptDescriptor {
        name: name.to_string(),
        locator: Locator::new(module, class),
        input_required,
        parameters,
    })
}

fn non_empty_str<'a>(entry: &'a Map<String, Value>, field: &str) -> Result<&'a str, ConfigError> {
    entry
        .get(field)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::InvalidField {
            field: field.to_string(),
            expected: "a non-empty string",
        })
}

fn parse_param_spec(name: &str, meta: &Value) -> Result<ParamSpec, ConfigError> {
    let meta = meta
        .as_object()
        .ok_or_else(|| ConfigError::invalid_parameter(name, "must be a mapping"))?;
    for field in REQUIRED_PARAM_FIELDS {
        if !meta.contains_key(field) {
            return Err(ConfigError::invalid_parameter(
                name,
                format!("missing {field}"),
            ));
        }
    }

    let raw_type = &meta["type"];
    let param_type = raw_type
        .as_str()
        .and_then(ParamType::parse)
        .ok_or_else(|| ConfigError::UnsupportedType {
            name: name.to_string(),
            found: raw_type
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| raw_type.to_string()),
        })?;

    let default = ParamValue::from_json(param_type, &meta["default"]).ok_or_else(|| {
        ConfigError::invalid_parameter(
            name,
            format!("default does not match type {param_type}"),
        )
    })?;

    let help = meta["help"]
        .as_str()
        .map(str::trim)
        .filter(|help| !help.is_empty())
        .ok_or_else(|| ConfigError::invalid_parameter(name, "help must not be empty"))?;

    Ok(ParamSpec {
        param_type,
        default,
        help: help.to_string(),
    })
}
