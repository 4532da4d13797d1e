//! Function definitions
//!
//! Functions come from three sources: the Puppet language (`function`),
//! the Ruby 4.x API (`Puppet::Functions.create_function`) and the legacy
//! Ruby 3.x API (`newfunction`).

use crate::docstring::Docstring;
use crate::node::Location;
use serde::{Deserialize, Serialize};

/// How a function was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FunctionKind {
    /// Puppet language `function`
    Puppet,
    /// `Puppet::Functions.create_function`
    Ruby4x,
    /// `Puppet::Parser::Functions.newfunction`
    Ruby3x,
}

impl FunctionKind {
    pub fn display(&self) -> &'static str {
        match self {
            FunctionKind::Puppet => "Puppet Language",
            FunctionKind::Ruby4x => "Ruby 4.x API",
            FunctionKind::Ruby3x => "Ruby 3.x API",
        }
    }
}

/// A parameter of a function signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureParam {
    pub name: String,

    /// Puppet type of the parameter
    pub type_expr: String,

    #[serde(default)]
    pub optional: bool,

    /// Whether the parameter captures any number of arguments
    #[serde(default)]
    pub repeated: bool,
}

impl SignatureParam {
    pub fn new(name: impl Into<String>, type_expr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_expr: type_expr.into(),
            optional: false,
            repeated: false,
        }
    }

    pub fn as_optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn as_repeated(mut self) -> Self {
        self.repeated = true;
        self
    }
}

/// One way of calling a function
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<SignatureParam>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub return_type: Option<String>,
}

impl Signature {
    /// Puppet-style rendering, e.g. `mymod::add(Integer $a, Integer *$rest) >> Integer`
    pub fn display(&self, function_name: &str) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| {
                let sigil = if p.repeated { "*$" } else { "$" };
                let default = if p.optional && !p.repeated { " = undef" } else { "" };
                format!("{} {}{}{}", p.type_expr, sigil, p.name, default)
            })
            .collect();
        let mut result = format!("{}({})", function_name, params.join(", "));
        if let Some(ref return_type) = self.return_type {
            result.push_str(" >> ");
            result.push_str(return_type);
        }
        result
    }
}

/// A function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    pub name: String,
    pub function_kind: FunctionKind,
    pub location: Location,
    pub docstring: Docstring,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signatures: Vec<Signature>,
}

impl Function {
    pub fn new(name: impl Into<String>, function_kind: FunctionKind, location: Location) -> Self {
        Self {
            name: name.into(),
            function_kind,
            location,
            docstring: Docstring::new(),
            signatures: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_display() {
        let signature = Signature {
            params: vec![
                SignatureParam::new("a", "Integer"),
                SignatureParam::new("b", "String").as_optional(),
                SignatureParam::new("rest", "Any").as_repeated(),
            ],
            return_type: Some("Integer".to_string()),
        };
        assert_eq!(
            signature.display("mymod::add"),
            "mymod::add(Integer $a, String $b = undef, Any *$rest) >> Integer"
        );
    }
}
