//! Script descriptor catalog.
//!
//! Raw config records pass through `validation` into the typed `model`, and
//! `ScriptRegistry` holds the validated set for lookup by name. Types here
//! mirror the config fields so descriptors can be echoed back to callers
//! (e.g. to build a parameter form) without ad-hoc JSON handling.

pub mod identity;
pub mod model;
pub mod registry;
pub mod validation;

pub use identity::{Locator, ParamType};
pub use model::{ParamSpec, ScriptDescriptor};
pub use registry::ScriptRegistry;
pub use validation::validate;
