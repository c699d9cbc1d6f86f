//! Load-once registry of script descriptors.
//!
//! The registry keeps descriptors in source order (for deterministic list
//! display) and an index keyed by name for lookup. It is strict about
//! duplicates: two records with the same name fail the load instead of one
//! shadowing the other. Nothing mutates it after `load`, so it can be shared
//! across threads behind an `Arc`.

use crate::catalog::model::ScriptDescriptor;
use crate::error::{ConfigError, NotFoundError};
use crate::source::ConfigSource;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct ScriptRegistry {
    descriptors: Vec<ScriptDescriptor>,
    by_name: BTreeMap<String, usize>,
}

impl ScriptRegistry {
    /// Read, validate, and index every record from `source`.
    ///
    /// The first invalid record aborts the whole load.
    pub fn load<S: ConfigSource + ?Sized>(source: &S) -> Result<Self, ConfigError> {
        let records = source.records()?;
        let mut descriptors = Vec::with_capacity(records.len());
        for (position, raw) in records.iter().enumerate() {
            let descriptor = ScriptDescriptor::from_raw(raw)?;
            debug!(position, script = %descriptor.name, "validated script descriptor");
            descriptors.push(descriptor);
        }
        let registry = Self::from_descriptors(descriptors)?;
        info!(
            source = %source.describe(),
            scripts = registry.len(),
            "loaded script registry"
        );
        Ok(registry)
    }

    /// Index already-validated descriptors, rejecting duplicate names.
    pub fn from_descriptors(descriptors: Vec<ScriptDescriptor>) -> Result<Self, ConfigError> {
        let mut by_name = BTreeMap::new();
        for (idx, descriptor) in descriptors.iter().enumerate() {
            if by_name.insert(descriptor.name.clone(), idx).is_some() {
                return Err(ConfigError::DuplicateName(descriptor.name.clone()));
            }
        }
        Ok(Self {
            descriptors,
            by_name,
        })
    }

    /// Script names in load order.
    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.name.as_str()).collect()
    }

    /// Exact-match lookup by name.
    pub fn find(&self, name: &str) -> Result<&ScriptDescriptor, NotFoundError> {
        self.by_name
            .get(name)
            .map(|&idx| &self.descriptors[idx])
            .ok_or_else(|| NotFoundError {
                name: name.to_string(),
            })
    }

    pub fn descriptors(&self) -> &[ScriptDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
