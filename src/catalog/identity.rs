use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Where a script unit lives: a module path plus the type name inside it.
///
/// Config records spell these as the `module` and `class` fields; the pair is
/// looked up in the resolver's unit table, never reflected on.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub module: String,
    pub class: String,
}

impl Locator {
    pub fn new(module: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            class: class.into(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.class)
    }
}

/// Declared type of a script parameter.
///
/// The set is closed: unknown type names are rejected at load time rather than
/// carried through as an `Other` variant.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ParamType {
    Int,
    Float,
    String,
    Bool,
}

impl ParamType {
    pub const ALL: [ParamType; 4] = [
        ParamType::Int,
        ParamType::Float,
        ParamType::String,
        ParamType::Bool,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::String => "string",
            ParamType::Bool => "bool",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "int" => Some(ParamType::Int),
            "float" => Some(ParamType::Float),
            "string" => Some(ParamType::String),
            "bool" => Some(ParamType::Bool),
            _ => None,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ParamType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ParamType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("unsupported type: {value}")))
    }
}
