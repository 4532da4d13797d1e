//! Parameter definition types
//!
//! This module provides the attribute type shared by resource type
//! parameters and properties, and the parameter type of Puppet language
//! classes, defined types and plans.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Whether an attribute of a resource type is a parameter or a property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeKind {
    Parameter,
    Property,
}

/// A parameter or property of a resource type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub name: String,

    /// Attribute documentation
    #[serde(default)]
    pub docstring: String,

    /// Whether this attribute identifies the resource
    #[serde(default)]
    pub isnamevar: bool,

    /// Default value (as written, or its literal value)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub default: Option<String>,

    /// Allowed values (`newvalues`/`newvalue`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,

    /// Value aliases (`aliasvalue :yes, :true`)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub aliases: IndexMap<String, String>,

    /// Features a provider needs for this attribute
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub required_features: Option<String>,

    /// Declared data type (Resource API attributes)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub data_type: Option<String>,
}

impl Attribute {
    /// Create an attribute with just a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the documentation
    pub fn with_docstring(mut self, docstring: impl Into<String>) -> Self {
        self.docstring = docstring.into();
        self
    }

    /// Mark as the name variable
    pub fn as_namevar(mut self) -> Self {
        self.isnamevar = true;
        self
    }

    /// Set the default value
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Add an allowed value, ignoring repeats
    pub fn add_value(&mut self, value: impl Into<String>) {
        let value = value.into();
        if !self.values.contains(&value) {
            self.values.push(value);
        }
    }

    /// Add a value alias
    pub fn add_alias(&mut self, alias: impl Into<String>, target: impl Into<String>) {
        self.aliases.insert(alias.into(), target.into());
    }
}

/// A parameter of a Puppet class, defined type or plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PuppetParam {
    pub name: String,

    /// Type expression, as written
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub type_expr: Option<String>,

    /// Default value expression, as written
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub default: Option<String>,

    /// Text of the matching `@param` tag
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub docstring: Option<String>,
}

impl PuppetParam {
    /// Create a parameter with just a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_expr: None,
            default: None,
            docstring: None,
        }
    }

    /// Set the type expression
    pub fn with_type(mut self, type_expr: impl Into<String>) -> Self {
        self.type_expr = Some(type_expr.into());
        self
    }

    /// Set the default expression
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Check if the parameter has a default value
    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_builder() {
        let mut attribute = Attribute::named("ensure")
            .with_docstring("Whether the database exists.")
            .with_default("present");
        attribute.add_value("present");
        attribute.add_value("absent");
        attribute.add_value("present");
        attribute.add_alias("yes", "present");

        assert_eq!(attribute.values, vec!["present", "absent"]);
        assert_eq!(attribute.aliases.get("yes").map(String::as_str), Some("present"));
        assert!(!attribute.isnamevar);
        assert!(Attribute::named("name").as_namevar().isnamevar);
    }

    #[test]
    fn test_attribute_serialization_skips_empty() {
        let json = serde_json::to_value(Attribute::named("file")).unwrap();
        assert_eq!(json["name"], "file");
        assert!(json.get("values").is_none());
        assert!(json.get("aliases").is_none());
        assert!(json.get("default").is_none());
    }

    #[test]
    fn test_puppet_param() {
        let param = PuppetParam::named("port").with_type("Integer").with_default("80");
        assert!(param.is_optional());
        assert!(!PuppetParam::named("x").is_optional());
    }
}
