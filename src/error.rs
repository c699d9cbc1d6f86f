//! Error categories for the script plugin system.
//!
//! Each stage owns one category: loading fails with [`ConfigError`], lookup
//! with [`NotFoundError`], resolution with [`ResolutionError`], parameter
//! binding with [`ParameterError`], and anything a unit raises while running
//! is wrapped in [`ExecutionError`]. [`ScriptError`] is the single channel the
//! controller reports through; callers match on its variants instead of on
//! unit-specific error types.

use crate::catalog::ParamType;
use std::path::PathBuf;
use thiserror::Error;

/// A malformed configuration source or descriptor. Fatal to the whole load.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing field {0}")]
    MissingField(String),

    #[error("field {field} must be {expected}")]
    InvalidField {
        field: String,
        expected: &'static str,
    },

    #[error("script entry must be a mapping")]
    EntryNotMapping,

    #[error("parameters must be a mapping")]
    ParametersNotMapping,

    #[error("parameter {name} invalid: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("unsupported type for {name}: {found}")]
    UnsupportedType { name: String, found: String },

    #[error("duplicate script name {0}")]
    DuplicateName(String),

    #[error("unable to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("{path} must contain a sequence of script entries")]
    NotASequence { path: PathBuf },
}

impl ConfigError {
    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// The requested script name is not in the registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("script {name} not found")]
pub struct NotFoundError {
    pub name: String,
}

/// A descriptor could not be turned into a runnable unit.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("module not found: {module}")]
    ModuleNotFound { module: String },

    #[error("class {class} not found in {module}")]
    ClassNotFound { class: String, module: String },

    #[error("{class} does not satisfy the plugin contract")]
    ContractViolation { class: String },

    #[error("{class} metadata disagrees with descriptor {script}: {detail}")]
    MetadataMismatch {
        class: String,
        script: String,
        detail: String,
    },
}

/// Supplied parameters do not fit the descriptor.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterError {
    #[error("script {script} has no parameter {name}")]
    Unknown { script: String, name: String },

    #[error("parameter {name} expects {expected}, got {found}")]
    TypeMismatch {
        name: String,
        expected: ParamType,
        found: ParamType,
    },

    #[error("parameter {name} expects {expected}, cannot parse {raw:?}")]
    InvalidValue {
        name: String,
        expected: ParamType,
        raw: String,
    },

    #[error("script {script} requires an input file")]
    MissingInput { script: String },
}

/// A unit failed while running. The unit's own error is kept as the source.
#[derive(Debug, Error)]
#[error("execution of {script} failed: {message}")]
pub struct ExecutionError {
    pub script: String,
    pub message: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl ExecutionError {
    pub fn new(script: impl Into<String>, source: anyhow::Error) -> Self {
        Self {
            script: script.into(),
            message: format!("{source:#}"),
            source: source.into(),
        }
    }
}

/// Everything `ScriptController::execute` can report.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("unable to load script {script}: {source}")]
    Import {
        script: String,
        #[source]
        source: ResolutionError,
    },

    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl ScriptError {
    /// Short label for the failure category, used in log records.
    pub fn category(&self) -> &'static str {
        match self {
            ScriptError::NotFound(_) => "not_found",
            ScriptError::Import { .. } => "import",
            ScriptError::Parameter(_) => "parameter",
            ScriptError::Execution(_) => "execution",
        }
    }
}
