//! The contract every runnable script unit implements.
//!
//! Units are constructed fresh for each execution through a [`ScriptFactory`]
//! and dropped afterwards; nothing is cached between runs. A unit reports its
//! own metadata so the resolver can check it against the config descriptor
//! before the unit is handed out.

use crate::catalog::{ParamSpec, ParamType};
use crate::params::{ParamValue, Parameters};
use std::collections::BTreeMap;
use std::path::Path;

pub trait Script: Send {
    /// Run once. File paths are passed through untouched; the unit decides
    /// what to do when one it needs is absent.
    fn run(
        &mut self,
        input_file: Option<&Path>,
        output_file: Option<&Path>,
        parameters: &Parameters,
    ) -> anyhow::Result<()>;

    /// Self-reported metadata, compared with the descriptor at resolution.
    fn describe_metadata(&self) -> ScriptMetadata;
}

/// Builds a fresh, default-configured unit.
pub type ScriptFactory = fn() -> Box<dyn Script>;

/// Factory for any `Default` unit type.
pub fn factory<T: Script + Default + 'static>() -> Box<dyn Script> {
    Box::new(T::default())
}

/// What a unit says about itself.
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptMetadata {
    pub name: String,
    pub input_required: bool,
    pub parameters: BTreeMap<String, ParamSpec>,
}

impl ScriptMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input_required: false,
            parameters: BTreeMap::new(),
        }
    }

    pub fn input_required(mut self, required: bool) -> Self {
        self.input_required = required;
        self
    }

    pub fn parameter(
        mut self,
        name: impl Into<String>,
        param_type: ParamType,
        default: impl Into<ParamValue>,
        help: impl Into<String>,
    ) -> Self {
        self.parameters
            .insert(name.into(), ParamSpec::new(param_type, default, help));
        self
    }
}
