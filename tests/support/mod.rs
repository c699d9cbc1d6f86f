#![allow(dead_code)]

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn script_runner_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_script-runner"))
}

/// `script-runner` with logging kept off the test output.
pub fn script_runner(config: &Path) -> Command {
    let mut cmd = Command::new(script_runner_binary());
    cmd.arg("--config")
        .arg(config)
        .env("SCRIPTRUNNER_LOG", "warn")
        .env_remove("SCRIPTRUNNER_LOG_FILE");
    cmd
}

pub fn run_command(mut cmd: Command) -> Result<Output> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to run command: {:?}", cmd))?;
    if output.status.success() {
        Ok(output)
    } else {
        bail!(
            "command {:?} failed: status {:?}\nstdout: {}\nstderr: {}",
            cmd,
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    }
}

/// The descriptor used throughout the suite for the bundled Addition unit.
pub fn addition_record() -> Value {
    json!({
        "name": "Addition",
        "module": "scripts::addition",
        "class": "AdditionScript",
        "input_required": false,
        "parameters": {
            "a": {"type": "float", "default": 0.0, "help": "First number"},
            "b": {"type": "float", "default": 0.0, "help": "Second number"}
        }
    })
}

pub fn write_config(dir: &Path, file_name: &str, records: &[Value]) -> Result<PathBuf> {
    let path = dir.join(file_name);
    let body = serde_json::to_string_pretty(records)?;
    fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
