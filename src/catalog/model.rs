//! In-memory representation of one script descriptor.
//!
//! These are built only through [`ScriptDescriptor::from_raw`], which runs the
//! validator first, so every descriptor in a registry already satisfies the
//! shape rules (closed type set, defaults matching their type, non-empty help).

use crate::catalog::identity::{Locator, ParamType};
use crate::catalog::validation::parse_descriptor;
use crate::error::ConfigError;
use crate::params::ParamValue;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// One user-settable value of a script.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParamSpec {
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub default: ParamValue,
    pub help: String,
}

impl ParamSpec {
    pub fn new(
        param_type: ParamType,
        default: impl Into<ParamValue>,
        help: impl Into<String>,
    ) -> Self {
        Self {
            param_type,
            default: default.into(),
            help: help.into(),
        }
    }
}

/// Static metadata describing one pluggable script.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScriptDescriptor {
    pub name: String,
    #[serde(flatten)]
    pub locator: Locator,
    pub input_required: bool,
    pub parameters: BTreeMap<String, ParamSpec>,
}

impl ScriptDescriptor {
    /// Validate a raw config record and convert it.
    pub fn from_raw(raw: &Value) -> Result<Self, ConfigError> {
        parse_descriptor(raw)
    }
}
