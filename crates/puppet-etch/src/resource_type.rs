//! Resource type definitions
//!
//! A resource type is declared in Ruby with `Puppet::Type.newtype` or
//! `Puppet::ResourceApi.register_type`. Its attributes may be extended
//! later by `Puppet::Type.type(:name).newparam/newproperty` elsewhere.

use crate::docstring::Docstring;
use crate::node::Location;
use crate::params::{Attribute, AttributeKind};
use serde::{Deserialize, Serialize};

/// A feature a resource type's providers may implement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub name: String,

    #[serde(default)]
    pub docstring: String,

    /// Provider methods the feature requires
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,
}

impl Feature {
    pub fn new(name: impl Into<String>, docstring: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            docstring: docstring.into(),
            methods: Vec::new(),
        }
    }
}

/// A custom resource type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceType {
    pub name: String,
    pub location: Location,
    pub docstring: Docstring,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Attribute>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Attribute>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<Feature>,

    /// Names of the providers registered for this type
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub providers: Vec<String>,
}

impl ResourceType {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            location,
            docstring: Docstring::new(),
            parameters: Vec::new(),
            properties: Vec::new(),
            features: Vec::new(),
            providers: Vec::new(),
        }
    }

    pub fn add_parameter(&mut self, parameter: Attribute) {
        self.parameters.push(parameter);
    }

    pub fn add_property(&mut self, property: Attribute) {
        self.properties.push(property);
    }

    /// Add a parameter or property
    pub fn add_attribute(&mut self, kind: AttributeKind, attribute: Attribute) {
        match kind {
            AttributeKind::Parameter => self.add_parameter(attribute),
            AttributeKind::Property => self.add_property(attribute),
        }
    }

    pub fn add_feature(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    /// Record a provider name, ignoring repeats
    pub fn add_provider(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.providers.contains(&name) {
            self.providers.push(name);
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&Attribute> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn property(&self, name: &str) -> Option<&Attribute> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Check if any attribute is flagged as the name variable
    pub fn has_namevar(&self) -> bool {
        self.properties
            .iter()
            .chain(self.parameters.iter())
            .any(|a| a.isnamevar)
    }

    /// Flag the attribute called `name` as the name variable when no
    /// attribute is flagged yet. Properties are searched first.
    ///
    /// Returns whether an attribute was flagged.
    pub fn default_namevar(&mut self) -> bool {
        if self.has_namevar() {
            return false;
        }
        let candidate = self
            .properties
            .iter_mut()
            .chain(self.parameters.iter_mut())
            .find(|a| a.name == "name");
        match candidate {
            Some(attribute) => {
                attribute.isnamevar = true;
                true
            }
            None => false,
        }
    }
}
