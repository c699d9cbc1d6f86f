//! Shared library for the script-runner harness.
//!
//! Scripts are declared in a configuration file (name, module/class locator,
//! whether an input file is needed, and a typed parameter form). The crate
//! validates those records into a [`ScriptRegistry`], resolves each one to a
//! registered [`Script`] unit, and runs it with bound parameters through
//! [`ScriptController`]. Public functions here form the contract front ends
//! depend on: config discovery plus the controller surface.

use anyhow::{Result, bail};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub mod catalog;
pub mod controller;
pub mod error;
pub mod logging;
pub mod params;
pub mod plugin;
pub mod resolver;
pub mod scripts;
pub mod source;

pub use catalog::{Locator, ParamSpec, ParamType, ScriptDescriptor, ScriptRegistry, validate};
pub use controller::ScriptController;
pub use error::{
    ConfigError, ExecutionError, NotFoundError, ParameterError, ResolutionError, ScriptError,
};
pub use params::{ParamValue, Parameters, bind_parameters, coerce_text};
pub use plugin::{Script, ScriptFactory, ScriptMetadata};
pub use resolver::{Resolver, UnitTable};
pub use source::{ConfigSource, FileSource, InlineSource};

pub const CONFIG_ENV: &str = "SCRIPTRUNNER_CONFIG";
/// Location of the default config relative to a checkout.
pub const DEFAULT_CONFIG: &str = "config/scripts_config.yaml";

fn config_from_hint(hint: &str) -> Option<PathBuf> {
    if hint.is_empty() {
        return None;
    }
    let path = PathBuf::from(hint);
    if !path.is_file() {
        return None;
    }
    fs::canonicalize(path).ok()
}

fn search_upwards(start: &Path) -> Option<PathBuf> {
    let mut dir = fs::canonicalize(start).ok()?;
    loop {
        let candidate = dir.join(DEFAULT_CONFIG);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Locate the script configuration file.
///
/// Honors `SCRIPTRUNNER_CONFIG` when it names an existing file, then climbs
/// up from the current executable looking for `config/scripts_config.yaml`,
/// then tries the crate directory recorded at build time.
pub fn find_config_path() -> Result<PathBuf> {
    if let Ok(hint) = env::var(CONFIG_ENV) {
        if let Some(path) = config_from_hint(&hint) {
            return Ok(path);
        }
    }

    if let Ok(exe_path) = env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            if let Some(path) = search_upwards(exe_dir) {
                return Ok(path);
            }
        }
    }

    if let Some(path) = search_upwards(Path::new(env!("CARGO_MANIFEST_DIR"))) {
        return Ok(path);
    }

    bail!("Unable to locate {DEFAULT_CONFIG}. Set {CONFIG_ENV} to the script configuration file.");
}
