//! Data type definitions

use crate::docstring::Docstring;
use crate::node::Location;
use serde::{Deserialize, Serialize};

/// A Ruby data type (`Puppet::DataTypes.create_type`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataType {
    pub name: String,
    pub location: Location,
    pub docstring: Docstring,

    /// Text of the `interface` declaration
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub interface: Option<String>,
}

impl DataType {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            location,
            docstring: Docstring::new(),
            interface: None,
        }
    }
}

/// A Puppet type alias (`type Mymod::Port = Integer[1, 65535]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataTypeAlias {
    pub name: String,
    pub location: Location,
    pub docstring: Docstring,

    /// The aliased type expression, as written
    pub alias_of: String,
}

impl DataTypeAlias {
    pub fn new(name: impl Into<String>, alias_of: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            location,
            docstring: Docstring::new(),
            alias_of: alias_of.into(),
        }
    }
}
