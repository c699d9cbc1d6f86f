//! Adds two numbers and writes the operands and the sum as a one-row CSV.

use crate::catalog::ParamType;
use crate::params::Parameters;
use crate::plugin::{Script, ScriptMetadata};
use anyhow::{Context, Result, bail};
use std::path::Path;
use tracing::info;

pub const HEADER: [&str; 3] = ["nombre1", "nombre2", "résultat"];

#[derive(Debug, Default)]
pub struct AdditionScript;

impl Script for AdditionScript {
    fn run(
        &mut self,
        _input_file: Option<&Path>,
        output_file: Option<&Path>,
        parameters: &Parameters,
    ) -> Result<()> {
        let Some(output) = output_file else {
            bail!("no output file given");
        };
        let a = parameters.float("a")?;
        let b = parameters.float("b")?;
        let sum = a + b;

        let mut writer = csv::Writer::from_path(output)
            .with_context(|| format!("creating {}", output.display()))?;
        writer.write_record(HEADER)?;
        writer.write_record([format!("{a:?}"), format!("{b:?}"), format!("{sum:?}")])?;
        writer
            .flush()
            .with_context(|| format!("writing {}", output.display()))?;
        info!(a, b, sum, output = %output.display(), "addition written");
        Ok(())
    }

    fn describe_metadata(&self) -> ScriptMetadata {
        ScriptMetadata::new("Addition")
            .parameter("a", ParamType::Float, 0.0, "First number")
            .parameter("b", ParamType::Float, 0.0, "Second number")
    }
}
