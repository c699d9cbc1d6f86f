//! Configuration sources the registry loads descriptors from.
//!
//! A source only produces raw records; validation happens in the registry so
//! every source gets the same checks. Files are YAML unless the extension is
//! `.json`.

use crate::error::ConfigError;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Something that yields the raw descriptor records, in order.
pub trait ConfigSource {
    /// Human-readable origin used in log records.
    fn describe(&self) -> String;

    fn records(&self) -> Result<Vec<Value>, ConfigError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SourceFormat {
    Yaml,
    Json,
}

/// Descriptor records stored in a YAML or JSON file.
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn format(&self) -> SourceFormat {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SourceFormat::Json,
            _ => SourceFormat::Yaml,
        }
    }

    fn parse_error(&self, message: impl ToString) -> ConfigError {
        ConfigError::Parse {
            path: self.path.clone(),
            message: message.to_string(),
        }
    }
}

impl ConfigSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn records(&self) -> Result<Vec<Value>, ConfigError> {
        let data = fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;
        // An empty file declares no scripts.
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }

        let document: Value = match self.format() {
            SourceFormat::Json => {
                serde_json::from_str(&data).map_err(|err| self.parse_error(err))?
            }
            SourceFormat::Yaml => {
                serde_yaml::from_str(&data).map_err(|err| self.parse_error(err))?
            }
        };

        match document {
            Value::Array(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            _ => Err(ConfigError::NotASequence {
                path: self.path.clone(),
            }),
        }
    }
}

/// Records already in memory, e.g. embedded defaults or test fixtures.
#[derive(Clone, Debug, Default)]
pub struct InlineSource {
    records: Vec<Value>,
}

impl InlineSource {
    pub fn new(records: Vec<Value>) -> Self {
        Self { records }
    }
}

impl ConfigSource for InlineSource {
    fn describe(&self) -> String {
        format!("inline ({} records)", self.records.len())
    }

    fn records(&self) -> Result<Vec<Value>, ConfigError> {
        Ok(self.records.clone())
    }
}
