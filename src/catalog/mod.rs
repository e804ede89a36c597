//! Binding catalogs.
//!
//! A catalog bundles everything the verifier needs to know about one set of
//! bindings:
//!
//! - the structure definitions themselves (fields in declaration order with
//!   offsets, element types and counts, plus the measured total size),
//! - an independently maintained table of declared sizes,
//! - the conformance checks to run (structure + headers),
//! - the structures intentionally left unchecked,
//! - the typedef-name set and the size skip list.
//!
//! The built-in Linux catalog lives in [`linux`]; catalogs for bindings
//! produced by other toolchains can be loaded from TOML with [`file`].

pub mod file;
pub mod linux;
pub mod reflect;

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{DescriptorError, HeaderSet, RawField, SkipList, StructureDescriptor};

/// What kind of native type a definition mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    Struct,
    Union,
    /// Single-value typedef such as `size_t`
    Scalar,
}

/// One binding definition as the field enumerator sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureDefinition {
    pub name: String,
    /// Whether the binding is part of the public binding set
    pub public: bool,
    pub kind: DefinitionKind,
    /// Fields in declaration order
    pub fields: Vec<RawField>,
    /// Measured total size
    pub size: usize,
}

/// One conformance check: a structure and the headers that declare it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSpec {
    pub structure: String,
    pub headers: HeaderSet,
}

impl CheckSpec {
    pub fn new(headers: impl Into<HeaderSet>, structure: impl Into<String>) -> Self {
        CheckSpec {
            structure: structure.into(),
            headers: headers.into(),
        }
    }
}

/// Reports the fields and size of a structure by name.
pub trait FieldEnumerator {
    /// Fields in declaration order, or `None` if the structure is unknown.
    fn enumerate(&self, name: &str) -> Option<Vec<RawField>>;

    /// Measured total size, or `None` if the structure is unknown.
    fn size_of(&self, name: &str) -> Option<usize>;
}

/// Errors looking up structures in a catalog.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("no binding named `{0}` in the catalog")]
    UnknownStructure(String),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

/// A complete binding catalog.
#[derive(Debug, Clone, Default)]
pub struct BindingCatalog {
    /// Catalog name, used in reports
    pub name: String,
    /// All binding definitions
    pub definitions: Vec<StructureDefinition>,
    /// Declared sizes, maintained separately from the definitions
    pub declared_sizes: BTreeMap<String, u16>,
    /// Checks in matrix order
    pub checks: Vec<CheckSpec>,
    /// Public structures that are deliberately not checked
    pub unchecked: BTreeSet<String>,
    /// Names referenced without the `struct` keyword
    pub typedefs: HashSet<String>,
    /// Fields exempt from size checks
    pub skip_list: SkipList,
}

impl BindingCatalog {
    /// Find a definition by name.
    pub fn definition(&self, name: &str) -> Option<&StructureDefinition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Declared size from the size table.
    pub fn declared_size(&self, name: &str) -> Option<usize> {
        self.declared_sizes.get(name).map(|&size| usize::from(size))
    }

    /// Build the immutable descriptor for a structure.
    pub fn descriptor(&self, name: &str) -> Result<StructureDescriptor, CatalogError> {
        let fields = self
            .enumerate(name)
            .ok_or_else(|| CatalogError::UnknownStructure(name.to_string()))?;
        let size = self
            .size_of(name)
            .ok_or_else(|| CatalogError::UnknownStructure(name.to_string()))?;

        Ok(StructureDescriptor::new(name, fields, size, &self.typedefs)?
            .with_declared_size(self.declared_size(name)))
    }

    /// Find the check for a structure, if it is in the matrix.
    pub fn check(&self, name: &str) -> Option<&CheckSpec> {
        self.checks.iter().find(|c| c.structure == name)
    }
}

impl FieldEnumerator for BindingCatalog {
    fn enumerate(&self, name: &str) -> Option<Vec<RawField>> {
        self.definition(name).map(|d| d.fields.clone())
    }

    fn size_of(&self, name: &str) -> Option<usize> {
        self.definition(name).map(|d| d.size)
    }
}
