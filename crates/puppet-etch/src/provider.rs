//! Provider definitions
//!
//! Providers implement a resource type for a platform or tool. Besides their
//! docstring they carry metadata read from their declaration body:
//! `confine`, `defaultfor`, `has_feature(s)` and `commands`.

use crate::docstring::Docstring;
use crate::node::Location;
use serde::{Deserialize, Serialize};

/// A condition restricting where a provider is suitable (`confine`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confine {
    /// Fact or condition name
    pub key: String,
    /// Expected value, literal or as written
    pub value: String,
}

/// A condition under which a provider is the default (`defaultfor`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultFor {
    pub key: String,
    pub value: String,
}

/// An external command a provider runs (`commands`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    /// Name the provider uses for the command
    pub name: String,
    /// Executable the name resolves to
    pub executable: String,
}

/// A provider of a resource type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    /// Name of the owning resource type; not checked against the registry
    pub type_name: String,
    pub name: String,
    pub location: Location,
    pub docstring: Docstring,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub confines: Vec<Confine>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaults: Vec<DefaultFor>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<Command>,
}

impl Provider {
    pub fn new(type_name: impl Into<String>, name: impl Into<String>, location: Location) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
            location,
            docstring: Docstring::new(),
            confines: Vec::new(),
            defaults: Vec::new(),
            features: Vec::new(),
            commands: Vec::new(),
        }
    }

    pub fn add_confine(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.confines.push(Confine {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn add_default(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.defaults.push(DefaultFor {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Record a supported feature, ignoring repeats
    pub fn add_feature(&mut self, feature: impl Into<String>) {
        let feature = feature.into();
        if !self.features.contains(&feature) {
            self.features.push(feature);
        }
    }

    pub fn add_command(&mut self, name: impl Into<String>, executable: impl Into<String>) {
        self.commands.push(Command {
            name: name.into(),
            executable: executable.into(),
        });
    }
}
