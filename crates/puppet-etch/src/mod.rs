//! puppet-etch: Documentation extraction engine for Puppet modules
//!
//! This crate builds a registry of documented code objects from the sources
//! of a Puppet module by:
//! - Recognizing the Ruby idioms that declare resource types, providers,
//!   functions and data types (`Puppet::Type.newtype`, `.provide`, ...)
//! - Recognizing Puppet language classes, defined types, functions, type
//!   aliases and plans
//! - Resolving docstrings from `desc`/`@doc` or the comment block above a
//!   declaration, and parsing their tags
//! - Reading provider metadata: `confine`, `defaultfor`, `has_feature(s)`
//!   and `commands`
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐
//! │ lib/puppet/*.rb │    │ manifests/*.pp   │
//! │ (Ruby tree)     │    │ (Puppet tree)    │
//! └────────┬────────┘    └────────┬─────────┘
//!          │                      │
//!          ▼                      ▼
//!   ┌──────────────┐      ┌──────────────┐
//!   │ Ruby matchers│      │ Puppet       │
//!   │ + populators │      │ matchers     │
//!   └──────┬───────┘      └──────┬───────┘
//!          └──────────┬──────────┘
//!                     ▼
//!              ┌──────────────┐
//!              │   Registry   │
//!              └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use puppet_etch::{EtchConfig, Extractor};
//!
//! let mut extractor = Extractor::new(EtchConfig::load("etch.toml").unwrap_or_default());
//! extractor.extract_files([
//!     "lib/puppet/type/database.rb",
//!     "lib/puppet/provider/database/mysql.rb",
//!     "manifests/init.pp",
//! ]);
//! let extraction = extractor.finish();
//! for provider in extraction.registry.providers() {
//!     println!("{} ({})", provider.name, provider.type_name);
//! }
//! ```

// Core types
pub mod docstring;
pub mod node;
pub mod params;
pub mod visibility;

// Code objects
pub mod class;
pub mod data_type;
pub mod function;
pub mod provider;
pub mod resource_type;

// Extraction
pub mod config;
pub mod diagnostics;
pub mod extractor;
pub mod handlers;
pub mod registry;
pub mod resolve;

// Re-exports for convenience
pub use class::{DefinedType, Plan, PuppetClass};
pub use config::EtchConfig;
pub use data_type::{DataType, DataTypeAlias};
pub use diagnostics::{
    Diagnostic, DiagnosticCode, DiagnosticSeverity, DiagnosticsCollector, EtchError, EtchResult,
};
pub use docstring::{Docstring, Tag};
pub use extractor::{Extraction, Extractor};
pub use function::{Function, FunctionKind, Signature, SignatureParam};
pub use node::{CodeObject, Location, ObjectKind};
pub use params::{Attribute, AttributeKind, PuppetParam};
pub use provider::{Command, Confine, DefaultFor, Provider};
pub use registry::{ObjectKey, Registry, TypeExtension};
pub use resource_type::{Feature, ResourceType};
pub use visibility::Visibility;

// Syntax front-end
pub use puppet_etch_syntax::{Grammar, SyntaxTree};
