//! Core code object types
//!
//! This module provides `CodeObject`, the central data structure representing
//! any documented item of a Puppet module, together with its kind and its
//! source location.

use crate::class::{DefinedType, Plan, PuppetClass};
use crate::data_type::{DataType, DataTypeAlias};
use crate::docstring::Docstring;
use crate::function::Function;
use crate::provider::Provider;
use crate::resource_type::ResourceType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location for a documented item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Source filename
    pub file: String,
    /// 1-indexed line number
    pub line: usize,
}

impl Location {
    /// Create a new location
    pub fn new(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Kind of code object
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectKind {
    /// Custom resource type (`Puppet::Type.newtype`, Resource API)
    ResourceType,
    /// Provider of a resource type
    Provider,
    /// Puppet class
    Class,
    /// Puppet defined type (`define`)
    DefinedType,
    /// Puppet language or Ruby function
    Function,
    /// Ruby data type (`Puppet::DataTypes.create_type`)
    DataType,
    /// Puppet type alias (`type Foo = ...`)
    DataTypeAlias,
    /// Bolt plan
    Plan,
}

impl ObjectKind {
    /// Get display name for this kind
    pub fn display_name(&self) -> &'static str {
        match self {
            ObjectKind::ResourceType => "resource type",
            ObjectKind::Provider => "provider",
            ObjectKind::Class => "class",
            ObjectKind::DefinedType => "defined type",
            ObjectKind::Function => "function",
            ObjectKind::DataType => "data type",
            ObjectKind::DataTypeAlias => "data type alias",
            ObjectKind::Plan => "plan",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A documented item of a Puppet module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CodeObject {
    ResourceType(ResourceType),
    Provider(Provider),
    Class(PuppetClass),
    DefinedType(DefinedType),
    Function(Function),
    DataType(DataType),
    DataTypeAlias(DataTypeAlias),
    Plan(Plan),
}

macro_rules! each_object {
    ($value:expr, $object:ident => $body:expr) => {
        match $value {
            CodeObject::ResourceType($object) => $body,
            CodeObject::Provider($object) => $body,
            CodeObject::Class($object) => $body,
            CodeObject::DefinedType($object) => $body,
            CodeObject::Function($object) => $body,
            CodeObject::DataType($object) => $body,
            CodeObject::DataTypeAlias($object) => $body,
            CodeObject::Plan($object) => $body,
        }
    };
}

impl CodeObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            CodeObject::ResourceType(_) => ObjectKind::ResourceType,
            CodeObject::Provider(_) => ObjectKind::Provider,
            CodeObject::Class(_) => ObjectKind::Class,
            CodeObject::DefinedType(_) => ObjectKind::DefinedType,
            CodeObject::Function(_) => ObjectKind::Function,
            CodeObject::DataType(_) => ObjectKind::DataType,
            CodeObject::DataTypeAlias(_) => ObjectKind::DataTypeAlias,
            CodeObject::Plan(_) => ObjectKind::Plan,
        }
    }

    pub fn name(&self) -> &str {
        each_object!(self, object => object.name.as_str())
    }

    /// Namespace the object is registered under.
    ///
    /// Providers live under their resource type's name, everything else in
    /// the root namespace `""`.
    pub fn namespace(&self) -> &str {
        match self {
            CodeObject::Provider(provider) => &provider.type_name,
            _ => "",
        }
    }

    pub fn location(&self) -> &Location {
        each_object!(self, object => &object.location)
    }

    pub fn docstring(&self) -> &Docstring {
        each_object!(self, object => &object.docstring)
    }

    pub fn docstring_mut(&mut self) -> &mut Docstring {
        each_object!(self, object => &mut object.docstring)
    }

    /// `"database::mysql"` for providers, the plain name otherwise
    pub fn qualified_name(&self) -> String {
        if self.namespace().is_empty() {
            self.name().to_string()
        } else {
            format!("{}::{}", self.namespace(), self.name())
        }
    }
}

macro_rules! object_conversions {
    ($($variant:ident($ty:ty) => $as_ref:ident),* $(,)?) => {
        $(
            impl From<$ty> for CodeObject {
                fn from(object: $ty) -> Self {
                    CodeObject::$variant(object)
                }
            }
        )*

        impl CodeObject {
            $(
                pub fn $as_ref(&self) -> Option<&$ty> {
                    match self {
                        CodeObject::$variant(object) => Some(object),
                        _ => None,
                    }
                }
            )*
        }
    };
}

object_conversions! {
    ResourceType(ResourceType) => as_resource_type,
    Provider(Provider) => as_provider,
    Class(PuppetClass) => as_class,
    DefinedType(DefinedType) => as_defined_type,
    Function(Function) => as_function,
    DataType(DataType) => as_data_type,
    DataTypeAlias(DataTypeAlias) => as_data_type_alias,
    Plan(Plan) => as_plan,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_namespace() {
        let provider = Provider::new("database", "mysql", Location::new("lib/a.rb", 3));
        let object = CodeObject::from(provider);
        assert_eq!(object.kind(), ObjectKind::Provider);
        assert_eq!(object.namespace(), "database");
        assert_eq!(object.qualified_name(), "database::mysql");
        assert_eq!(object.location().to_string(), "lib/a.rb:3");
    }

    #[test]
    fn test_root_namespace() {
        let object = CodeObject::from(PuppetClass::new("foo", Location::new("init.pp", 1)));
        assert_eq!(object.namespace(), "");
        assert_eq!(object.qualified_name(), "foo");
        assert!(object.as_class().is_some());
        assert!(object.as_provider().is_none());
    }

    #[test]
    fn test_serialized_kind_tag() {
        let object = CodeObject::from(PuppetClass::new("foo", Location::new("init.pp", 1)));
        let json = serde_json::to_value(&object).unwrap();
        assert_eq!(json["kind"], "class");
        assert_eq!(json["name"], "foo");
    }
}
