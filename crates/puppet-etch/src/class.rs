//! Puppet language definitions with parameter lists
//!
//! Classes, defined types and plans share the same shape: a name, a
//! documented parameter list and a docstring from the comment block above
//! the declaration.

use crate::docstring::Docstring;
use crate::node::Location;
use crate::params::PuppetParam;
use serde::{Deserialize, Serialize};

/// A Puppet class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuppetClass {
    pub name: String,
    pub location: Location,
    pub docstring: Docstring,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<PuppetParam>,

    /// Class named by `inherits`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent: Option<String>,
}

impl PuppetClass {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            location,
            docstring: Docstring::new(),
            parameters: Vec::new(),
            parent: None,
        }
    }
}

/// A Puppet defined type (`define`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinedType {
    pub name: String,
    pub location: Location,
    pub docstring: Docstring,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<PuppetParam>,
}

impl DefinedType {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            location,
            docstring: Docstring::new(),
            parameters: Vec::new(),
        }
    }
}

/// A plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub name: String,
    pub location: Location,
    pub docstring: Docstring,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<PuppetParam>,
}

impl Plan {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            location,
            docstring: Docstring::new(),
            parameters: Vec::new(),
        }
    }
}
