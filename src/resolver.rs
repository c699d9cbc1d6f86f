//! Locator resolution.
//!
//! Instead of importing code by name at runtime, every unit the process can
//! run is registered up front in a [`UnitTable`] keyed by module path and type
//! name. Resolving a descriptor walks the same steps a dynamic loader would
//! (module, then type, then contract) so each failure keeps its own message,
//! then instantiates the unit and checks its self-reported metadata against
//! the descriptor.

use crate::catalog::ScriptDescriptor;
use crate::error::ResolutionError;
use crate::plugin::{Script, ScriptFactory, ScriptMetadata, factory};
use crate::scripts::BUILTIN_UNITS;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Clone, Copy, Debug)]
enum UnitKind {
    Script(ScriptFactory),
    /// Registered under a module but not runnable as a script.
    Opaque,
}

/// Every unit the resolver can hand out, grouped by module path.
#[derive(Clone, Debug, Default)]
pub struct UnitTable {
    modules: BTreeMap<String, BTreeMap<String, UnitKind>>,
}

impl UnitTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding the units shipped with this crate.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for unit in BUILTIN_UNITS {
            table.register_script(unit.module, unit.class, unit.create);
        }
        table
    }

    pub fn register_script(
        &mut self,
        module: impl Into<String>,
        class: impl Into<String>,
        create: ScriptFactory,
    ) -> &mut Self {
        self.insert(module.into(), class.into(), UnitKind::Script(create))
    }

    pub fn register_script_type<T: Script + Default + 'static>(
        &mut self,
        module: impl Into<String>,
        class: impl Into<String>,
    ) -> &mut Self {
        self.register_script(module, class, factory::<T>)
    }

    /// Declare a name that exists but does not implement [`Script`].
    pub fn register_opaque(
        &mut self,
        module: impl Into<String>,
        class: impl Into<String>,
    ) -> &mut Self {
        self.insert(module.into(), class.into(), UnitKind::Opaque)
    }

    pub fn contains_module(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    fn insert(&mut self, module: String, class: String, kind: UnitKind) -> &mut Self {
        self.modules.entry(module).or_default().insert(class, kind);
        self
    }

    fn lookup(&self, module: &str, class: &str) -> Result<UnitKind, ResolutionError> {
        let classes = self
            .modules
            .get(module)
            .ok_or_else(|| ResolutionError::ModuleNotFound {
                module: module.to_string(),
            })?;
        classes
            .get(class)
            .copied()
            .ok_or_else(|| ResolutionError::ClassNotFound {
                class: class.to_string(),
                module: module.to_string(),
            })
    }
}

/// Turns descriptors into fresh unit instances.
#[derive(Clone, Debug)]
pub struct Resolver {
    units: UnitTable,
}

impl Resolver {
    pub fn new(units: UnitTable) -> Self {
        Self { units }
    }

    pub fn units(&self) -> &UnitTable {
        &self.units
    }

    /// Resolve and instantiate. Every call builds a new instance.
    pub fn resolve(
        &self,
        descriptor: &ScriptDescriptor,
    ) -> Result<Box<dyn Script>, ResolutionError> {
        let locator = &descriptor.locator;
        let create = match self.units.lookup(&locator.module, &locator.class)? {
            UnitKind::Script(create) => create,
            UnitKind::Opaque => {
                return Err(ResolutionError::ContractViolation {
                    class: locator.class.clone(),
                });
            }
        };

        let unit = create();
        check_metadata(descriptor, &unit.describe_metadata()).map_err(|detail| {
            ResolutionError::MetadataMismatch {
                class: locator.class.clone(),
                script: descriptor.name.clone(),
                detail,
            }
        })?;
        debug!(script = %descriptor.name, unit = %locator, "resolved script unit");
        Ok(unit)
    }
}

/// Display name and help text may differ; the fields that drive binding may not.
fn check_metadata(descriptor: &ScriptDescriptor, metadata: &ScriptMetadata) -> Result<(), String> {
    if descriptor.input_required != metadata.input_required {
        return Err(format!(
            "input_required is {} in descriptor but {} in metadata",
            descriptor.input_required, metadata.input_required
        ));
    }
    for (name, spec) in &descriptor.parameters {
        let reported = metadata
            .parameters
            .get(name)
            .ok_or_else(|| format!("parameter {name} not reported by the unit"))?;
        if reported.param_type != spec.param_type {
            return Err(format!(
                "parameter {name} is {} in descriptor but {} in metadata",
                spec.param_type, reported.param_type
            ));
        }
    }
    if let Some(extra) = metadata
        .parameters
        .keys()
        .find(|name| !descriptor.parameters.contains_key(*name))
    {
        return Err(format!("parameter {extra} missing from descriptor"));
    }
    Ok(())
}
