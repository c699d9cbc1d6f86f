//! Copies a delimited file, trimming whitespace around each header name.
//!
//! Data rows are copied as-is. Rows may have differing field counts.

use crate::catalog::ParamType;
use crate::params::Parameters;
use crate::plugin::{Script, ScriptMetadata};
use anyhow::{Context, Result, anyhow, bail};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::path::Path;
use tracing::info;

#[derive(Debug, Default)]
pub struct StripHeaders;

fn single_byte(delimiter: &str) -> Result<u8> {
    match delimiter.as_bytes() {
        [byte] => Ok(*byte),
        [] => bail!("delimiter must not be empty"),
        _ => bail!("delimiter {delimiter:?} must be a single byte"),
    }
}

impl Script for StripHeaders {
    fn run(
        &mut self,
        input_file: Option<&Path>,
        output_file: Option<&Path>,
        parameters: &Parameters,
    ) -> Result<()> {
        let input = input_file.ok_or_else(|| anyhow!("no input file given"))?;
        let output = output_file.ok_or_else(|| anyhow!("no output file given"))?;
        let delimiter = single_byte(parameters.string("delimiter")?)?;

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_path(input)
            .with_context(|| format!("opening {}", input.display()))?;
        let mut writer = WriterBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_path(output)
            .with_context(|| format!("creating {}", output.display()))?;

        let headers: StringRecord = reader
            .headers()
            .with_context(|| format!("reading header of {}", input.display()))?
            .iter()
            .map(str::trim)
            .collect();
        writer.write_record(&headers)?;

        let mut rows = 0usize;
        for record in reader.records() {
            let record = record.with_context(|| format!("reading {}", input.display()))?;
            writer.write_record(&record)?;
            rows += 1;
        }
        writer
            .flush()
            .with_context(|| format!("writing {}", output.display()))?;
        info!(columns = headers.len(), rows, output = %output.display(), "headers cleaned");
        Ok(())
    }

    fn describe_metadata(&self) -> ScriptMetadata {
        ScriptMetadata::new("Strip CSV headers")
            .input_required(true)
            .parameter("delimiter", ParamType::String, ",", "Field delimiter")
    }
}
