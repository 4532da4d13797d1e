//! Code object registry
//!
//! The registry is the engine's only output: every documented item of a
//! module, keyed by kind, namespace and name, in registration order.
//! Registration never overwrites; a second object under the same key is a
//! [`EtchError::DuplicateName`].
//!
//! Extraction fills one partial registry per file and merges them in the
//! caller's file order, so the final order is reproducible.

use crate::class::{DefinedType, Plan, PuppetClass};
use crate::data_type::{DataType, DataTypeAlias};
use crate::diagnostics::{Diagnostic, DiagnosticCode, EtchError, EtchResult};
use crate::function::Function;
use crate::node::{CodeObject, Location, ObjectKind};
use crate::params::{Attribute, AttributeKind};
use crate::provider::Provider;
use crate::resource_type::ResourceType;
use crate::visibility::mark_public_unless_tagged;
use indexmap::map::Values;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::iter::FilterMap;

/// Key of a registered object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub kind: ObjectKind,
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(kind: ObjectKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key under which `object` is registered
    pub fn of(object: &CodeObject) -> Self {
        Self::new(object.kind(), object.namespace(), object.name())
    }
}

/// An attribute declared outside its resource type's `newtype` block
/// (`Puppet::Type.type(:name).newparam(...)`), applied when the run finishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeExtension {
    pub type_name: String,
    pub kind: AttributeKind,
    pub attribute: Attribute,
    pub location: Location,
}

/// Lazy, restartable sequence of the objects of one kind
#[derive(Debug, Clone)]
pub struct All<'a> {
    values: Values<'a, ObjectKey, CodeObject>,
    kind: ObjectKind,
}

impl<'a> Iterator for All<'a> {
    type Item = &'a CodeObject;

    fn next(&mut self) -> Option<Self::Item> {
        let kind = self.kind;
        self.values.by_ref().find(|object| object.kind() == kind)
    }
}

/// Typed view over the objects of one kind
pub type TypedView<'a, T> = FilterMap<All<'a>, for<'b> fn(&'b CodeObject) -> Option<&'b T>>;

/// Namespace-organized store of code objects
#[derive(Debug, Clone, Default)]
pub struct Registry {
    objects: IndexMap<ObjectKey, CodeObject>,
    extensions: Vec<TypeExtension>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object.
    ///
    /// Fails with [`EtchError::DuplicateName`] when an object of the same
    /// kind, namespace and name exists; the existing object is kept.
    pub fn register(&mut self, object: impl Into<CodeObject>) -> EtchResult<&mut CodeObject> {
        let object = object.into();
        let key = ObjectKey::of(&object);
        if self.objects.contains_key(&key) {
            let location = object.location();
            return Err(EtchError::duplicate(
                key.kind,
                key.namespace,
                key.name,
                &location.file,
                location.line,
            ));
        }
        tracing::debug!(
            kind = %key.kind,
            name = %object.qualified_name(),
            location = %object.location(),
            "registered code object"
        );
        Ok(self.objects.entry(key).or_insert(object))
    }

    /// Look up an object
    pub fn get(&self, kind: ObjectKind, namespace: &str, name: &str) -> Option<&CodeObject> {
        self.objects.get(&ObjectKey::new(kind, namespace, name))
    }

    fn get_mut(&mut self, kind: ObjectKind, namespace: &str, name: &str) -> Option<&mut CodeObject> {
        self.objects.get_mut(&ObjectKey::new(kind, namespace, name))
    }

    /// Check if an object is registered under this key
    pub fn contains(&self, kind: ObjectKind, namespace: &str, name: &str) -> bool {
        self.get(kind, namespace, name).is_some()
    }

    /// All objects of `kind` in registration order
    pub fn all(&self, kind: ObjectKind) -> All<'_> {
        All {
            values: self.objects.values(),
            kind,
        }
    }

    /// All objects in registration order
    pub fn iter(&self) -> impl Iterator<Item = &CodeObject> + Clone {
        self.objects.values()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn resource_types(&self) -> TypedView<'_, ResourceType> {
        self.all(ObjectKind::ResourceType)
            .filter_map(CodeObject::as_resource_type as fn(&CodeObject) -> Option<&ResourceType>)
    }

    pub fn providers(&self) -> TypedView<'_, Provider> {
        self.all(ObjectKind::Provider)
            .filter_map(CodeObject::as_provider as fn(&CodeObject) -> Option<&Provider>)
    }

    pub fn classes(&self) -> TypedView<'_, PuppetClass> {
        self.all(ObjectKind::Class)
            .filter_map(CodeObject::as_class as fn(&CodeObject) -> Option<&PuppetClass>)
    }

    pub fn defined_types(&self) -> TypedView<'_, DefinedType> {
        self.all(ObjectKind::DefinedType)
            .filter_map(CodeObject::as_defined_type as fn(&CodeObject) -> Option<&DefinedType>)
    }

    pub fn functions(&self) -> TypedView<'_, Function> {
        self.all(ObjectKind::Function)
            .filter_map(CodeObject::as_function as fn(&CodeObject) -> Option<&Function>)
    }

    pub fn data_types(&self) -> TypedView<'_, DataType> {
        self.all(ObjectKind::DataType)
            .filter_map(CodeObject::as_data_type as fn(&CodeObject) -> Option<&DataType>)
    }

    pub fn data_type_aliases(&self) -> TypedView<'_, DataTypeAlias> {
        self.all(ObjectKind::DataTypeAlias).filter_map(
            CodeObject::as_data_type_alias as fn(&CodeObject) -> Option<&DataTypeAlias>,
        )
    }

    pub fn plans(&self) -> TypedView<'_, Plan> {
        self.all(ObjectKind::Plan)
            .filter_map(CodeObject::as_plan as fn(&CodeObject) -> Option<&Plan>)
    }

    pub fn resource_type(&self, name: &str) -> Option<&ResourceType> {
        self.get(ObjectKind::ResourceType, "", name)
            .and_then(CodeObject::as_resource_type)
    }

    pub fn provider(&self, type_name: &str, name: &str) -> Option<&Provider> {
        self.get(ObjectKind::Provider, type_name, name)
            .and_then(CodeObject::as_provider)
    }

    pub fn class(&self, name: &str) -> Option<&PuppetClass> {
        self.get(ObjectKind::Class, "", name).and_then(CodeObject::as_class)
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.get(ObjectKind::Function, "", name)
            .and_then(CodeObject::as_function)
    }

    /// Record an attribute to add to a resource type when the run finishes
    pub fn add_extension(&mut self, extension: TypeExtension) {
        self.extensions.push(extension);
    }

    /// Pending type extensions
    pub fn extensions(&self) -> &[TypeExtension] {
        &self.extensions
    }

    /// Move every object and extension of `partial` into this registry.
    ///
    /// Objects whose key is already taken are dropped; one error is returned
    /// for each.
    pub fn merge(&mut self, partial: Registry) -> Vec<EtchError> {
        let mut errors = Vec::new();
        for object in partial.objects.into_values() {
            if let Err(err) = self.register(object) {
                errors.push(err);
            }
        }
        self.extensions.extend(partial.extensions);
        errors
    }

    /// Resolve cross-object data once every file has been merged:
    ///
    /// - pending type extensions are applied; an extension of an undeclared
    ///   type creates a stub type and a warning,
    /// - each resource type lists the providers registered for it,
    /// - a resource type without a name variable gets its `name` attribute
    ///   flagged as one.
    pub fn finalize(&mut self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for extension in std::mem::take(&mut self.extensions) {
            if !self.contains(ObjectKind::ResourceType, "", &extension.type_name) {
                diagnostics.push(
                    Diagnostic::warning(format!(
                        "Resource type '{}' is extended but never declared; documenting it without a description.",
                        extension.type_name
                    ))
                    .in_file(&extension.location.file)
                    .at_line(extension.location.line)
                    .with_code(DiagnosticCode::UndeclaredType),
                );
                let mut stub = ResourceType::new(&extension.type_name, extension.location.clone());
                mark_public_unless_tagged(&mut stub.docstring);
                self.objects.insert(
                    ObjectKey::new(ObjectKind::ResourceType, "", &extension.type_name),
                    stub.into(),
                );
            }
            if let Some(CodeObject::ResourceType(ty)) =
                self.get_mut(ObjectKind::ResourceType, "", &extension.type_name)
            {
                ty.add_attribute(extension.kind, extension.attribute);
            }
        }

        let links: Vec<(String, String)> = self
            .providers()
            .map(|p| (p.type_name.clone(), p.name.clone()))
            .collect();
        for (type_name, provider) in links {
            if let Some(CodeObject::ResourceType(ty)) =
                self.get_mut(ObjectKind::ResourceType, "", &type_name)
            {
                ty.add_provider(provider);
            }
        }

        for object in self.objects.values_mut() {
            if let CodeObject::ResourceType(ty) = object {
                ty.default_namevar();
            }
        }

        diagnostics
    }

    /// Serialize all objects, in registration order, for a renderer
    pub fn to_json(&self) -> EtchResult<String> {
        let objects: Vec<&CodeObject> = self.iter().collect();
        Ok(serde_json::to_string_pretty(&objects)?)
    }
}
