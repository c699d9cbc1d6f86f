//! The single entry point consumers use: list, describe, execute.
//!
//! `execute` walks find → resolve → bind → run and reports every failure
//! through [`ScriptError`]. The controller holds only read-only shared state,
//! so clones are cheap and calls from different threads never interfere;
//! each call builds its own unit instance.

use crate::catalog::{ScriptDescriptor, ScriptRegistry};
use crate::error::{ConfigError, ExecutionError, NotFoundError, ParameterError, ScriptError};
use crate::params::{Parameters, bind_parameters, coerce_text};
use crate::resolver::{Resolver, UnitTable};
use crate::source::ConfigSource;
use anyhow::anyhow;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info, info_span};

#[derive(Clone, Debug)]
pub struct ScriptController {
    registry: Arc<ScriptRegistry>,
    resolver: Arc<Resolver>,
}

impl ScriptController {
    pub fn new(registry: ScriptRegistry, resolver: Resolver) -> Self {
        Self {
            registry: Arc::new(registry),
            resolver: Arc::new(resolver),
        }
    }

    /// Load the registry from `source` and resolve against `units`.
    pub fn load<S: ConfigSource + ?Sized>(
        source: &S,
        units: UnitTable,
    ) -> Result<Self, ConfigError> {
        let registry = ScriptRegistry::load(source)?;
        Ok(Self::new(registry, Resolver::new(units)))
    }

    pub fn registry(&self) -> &ScriptRegistry {
        &self.registry
    }

    pub fn list_script_names(&self) -> Vec<String> {
        self.registry.names().into_iter().map(str::to_string).collect()
    }

    pub fn get_descriptor(&self, name: &str) -> Result<&ScriptDescriptor, NotFoundError> {
        self.registry.find(name)
    }

    /// Run `name` with already-typed parameters.
    pub fn execute(
        &self,
        name: &str,
        input_file: Option<&Path>,
        output_file: Option<&Path>,
        parameters: Parameters,
    ) -> Result<(), ScriptError> {
        self.execute_with(name, input_file, output_file, |descriptor| {
            bind_parameters(descriptor, parameters)
        })
    }

    /// Run `name` with `(key, text)` pairs as typed into a form or on a command
    /// line; each value is parsed per its declared type.
    pub fn execute_raw(
        &self,
        name: &str,
        input_file: Option<&Path>,
        output_file: Option<&Path>,
        raw: &[(String, String)],
    ) -> Result<(), ScriptError> {
        self.execute_with(name, input_file, output_file, |descriptor| {
            coerce_text(descriptor, raw)
        })
    }

    /// Run `execute` on a worker thread so the caller stays responsive.
    pub fn spawn_execute(
        &self,
        name: impl Into<String>,
        input_file: Option<PathBuf>,
        output_file: Option<PathBuf>,
        parameters: Parameters,
    ) -> JoinHandle<Result<(), ScriptError>> {
        let controller = self.clone();
        let name = name.into();
        thread::spawn(move || {
            controller.execute(
                &name,
                input_file.as_deref(),
                output_file.as_deref(),
                parameters,
            )
        })
    }

    /// Background counterpart of [`execute_raw`](Self::execute_raw); the text
    /// pairs are coerced on the worker like any other step.
    pub fn spawn_execute_raw(
        &self,
        name: impl Into<String>,
        input_file: Option<PathBuf>,
        output_file: Option<PathBuf>,
        raw: Vec<(String, String)>,
    ) -> JoinHandle<Result<(), ScriptError>> {
        let controller = self.clone();
        let name = name.into();
        thread::spawn(move || {
            controller.execute_raw(&name, input_file.as_deref(), output_file.as_deref(), &raw)
        })
    }

    fn execute_with(
        &self,
        name: &str,
        input_file: Option<&Path>,
        output_file: Option<&Path>,
        bind: impl FnOnce(&ScriptDescriptor) -> Result<Parameters, ParameterError>,
    ) -> Result<(), ScriptError> {
        let span = info_span!("execute", script = %name);
        let _entered = span.enter();
        info!(
            input = ?input_file,
            output = ?output_file,
            "starting script"
        );

        let outcome = self.run_steps(name, input_file, output_file, bind);
        match &outcome {
            Ok(()) => info!("script finished"),
            Err(err) => error!(category = err.category(), error = %err, "script failed"),
        }
        outcome
    }

    fn run_steps(
        &self,
        name: &str,
        input_file: Option<&Path>,
        output_file: Option<&Path>,
        bind: impl FnOnce(&ScriptDescriptor) -> Result<Parameters, ParameterError>,
    ) -> Result<(), ScriptError> {
        let descriptor = self.registry.find(name)?;
        let mut unit = self
            .resolver
            .resolve(descriptor)
            .map_err(|source| ScriptError::Import {
                script: descriptor.name.clone(),
                source,
            })?;

        let parameters = bind(descriptor)?;
        if descriptor.input_required && input_file.is_none() {
            return Err(ParameterError::MissingInput {
                script: descriptor.name.clone(),
            }
            .into());
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            unit.run(input_file, output_file, &parameters)
        }))
        .unwrap_or_else(|payload| Err(anyhow!("panicked: {}", panic_message(payload.as_ref()))));
        result.map_err(|err| ExecutionError::new(descriptor.name.clone(), err).into())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
