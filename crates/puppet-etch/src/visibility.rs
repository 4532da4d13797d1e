//! Visibility handling
//!
//! Visibility of a code object is carried by its `@api` tag. Objects whose
//! documentation does not state a visibility are public.

use crate::docstring::{Docstring, Tag};
use serde::{Deserialize, Serialize};

/// Symbol visibility level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Visibility {
    /// Part of the module's public API
    #[default]
    Public,

    /// Private to the module (`@api private`)
    Private,
}

impl Visibility {
    /// Visibility stated by a docstring's `@api` tag
    pub fn of(docstring: &Docstring) -> Self {
        match docstring.api() {
            Some("private") => Visibility::Private,
            _ => Visibility::Public,
        }
    }

    /// Check if this is publicly visible
    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }

    /// Get display string
    pub fn display(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

/// Add `@api public` unless the docstring already has an `@api` tag
pub fn mark_public_unless_tagged(docstring: &mut Docstring) {
    if !docstring.has_tag("api") {
        docstring.add_tag(Tag::new("api", Some(Visibility::Public.display().to_string())));
    }
}
