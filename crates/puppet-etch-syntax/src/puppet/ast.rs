//! Declarations found in Puppet manifests

use crate::span::Span;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefinitionKind {
    Class,
    DefinedType,
    Function,
    TypeAlias,
    Plan,
}

impl DefinitionKind {
    /// The keyword introducing the declaration
    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::DefinedType => "define",
            Self::Function => "function",
            Self::TypeAlias => "type",
            Self::Plan => "plan",
        }
    }
}

/// A parameter of a class, defined type, function or plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Name without the `$` sigil
    pub name: String,
    /// Type expression as written, e.g. `Optional[String]`
    pub type_expr: Option<String>,
    /// Default value expression as written
    pub default: Option<String>,
    /// `*$rest` parameter
    pub captures_rest: bool,
    pub line: usize,
}

/// A top-level or nested declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub kind: DefinitionKind,
    pub name: String,
    pub params: Vec<Parameter>,
    /// Parent class named by `inherits`
    pub parent: Option<String>,
    /// Return type after `>>` (functions)
    pub return_type: Option<String>,
    /// Right-hand side of a type alias
    pub aliased_type: Option<String>,
    /// The whole declaration
    pub span: Span,
    /// Line of the declaration keyword
    pub line: usize,
    /// Definitions nested in the body
    pub nested: Vec<Definition>,
}

/// All declarations of a manifest, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub definitions: Vec<Definition>,
}

impl Manifest {
    /// Every definition, nested ones directly after their parent
    pub fn all_definitions(&self) -> Vec<&Definition> {
        fn collect<'a>(defs: &'a [Definition], out: &mut Vec<&'a Definition>) {
            for def in defs {
                out.push(def);
                collect(&def.nested, out);
            }
        }
        let mut out = Vec::new();
        collect(&self.definitions, &mut out);
        out
    }
}
