//! Script units shipped with the crate.
//!
//! Adding a unit means writing its module here and listing it in
//! [`BUILTIN_UNITS`]; the resolver and controller stay untouched.

pub mod addition;
pub mod header_cleanup;

use crate::plugin::{ScriptFactory, factory};

/// One bundled unit and where descriptors find it.
#[derive(Clone, Copy, Debug)]
pub struct UnitSpec {
    pub module: &'static str,
    pub class: &'static str,
    pub create: ScriptFactory,
}

pub const BUILTIN_UNITS: &[UnitSpec] = &[
    UnitSpec {
        module: "scripts::addition",
        class: "AdditionScript",
        create: factory::<addition::AdditionScript>,
    },
    UnitSpec {
        module: "scripts::header_cleanup",
        class: "StripHeaders",
        create: factory::<header_cleanup::StripHeaders>,
    },
];
