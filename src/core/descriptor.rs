//! Structure and field descriptors.
//!
//! A [`StructureDescriptor`] is built once from a binding definition and
//! never mutated afterwards. Field names are resolved at construction time,
//! so every consumer sees the same checked/unchecked split.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::naming::{resolve_field_name, NameStyle};

/// Managed-side element type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementType {
    /// Type name, informational only (e.g. `uint32_t`, `in_addr`)
    pub name: String,
    /// Size of one element in bytes
    pub size: usize,
}

impl ElementType {
    /// Create a new element type.
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        ElementType {
            name: name.into(),
            size,
        }
    }
}

/// A field exactly as a field enumerator reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawField {
    /// Encoded field name (see [`resolve_field_name`])
    pub name: String,
    /// Byte offset from the start of the structure
    pub offset: usize,
    /// Element type
    #[serde(rename = "type")]
    pub element: ElementType,
    /// Number of elements (N for inline fixed-size arrays)
    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_count() -> usize {
    1
}

/// A field of a [`StructureDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Name as reported by the enumerator
    pub raw_name: String,
    /// Resolved header field name; `None` when the field is not checked
    pub checked_name: Option<String>,
    /// Byte offset
    pub offset: usize,
    /// Element type
    pub element: ElementType,
    /// Element count, always >= 1
    pub count: usize,
}

impl FieldDescriptor {
    /// Whether this field takes part in the ABI contract.
    pub fn is_checked(&self) -> bool {
        self.checked_name.is_some()
    }

    /// Declared width of the field in bytes.
    pub fn declared_size(&self) -> usize {
        self.element.size * self.count
    }
}

/// Errors raised while building descriptors from enumerated fields.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("`{structure}`: fields `{first}` and `{second}` both resolve to `{resolved}`")]
    DuplicateField {
        structure: String,
        first: String,
        second: String,
        resolved: String,
    },

    #[error("`{structure}.{field}` has an element count of zero")]
    ZeroCount { structure: String, field: String },
}

/// An immutable description of one managed structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructureDescriptor {
    /// Logical name (e.g. `linger`, `size_t`)
    pub name: String,
    /// Whether the native name is a typedef or a struct tag
    pub style: NameStyle,
    /// Fields in declaration order
    pub fields: Vec<FieldDescriptor>,
    /// Total size as measured by the field enumerator
    pub size: usize,
    /// Total size from the independently maintained size table
    pub declared_size: Option<usize>,
}

impl StructureDescriptor {
    /// Build a descriptor from enumerated fields.
    ///
    /// Fails if two raw names resolve to the same checked field name or if a
    /// field reports a zero element count.
    pub fn new(
        name: impl Into<String>,
        raw_fields: Vec<RawField>,
        size: usize,
        typedefs: &HashSet<String>,
    ) -> Result<Self, DescriptorError> {
        let name = name.into();
        let mut seen: HashMap<String, String> = HashMap::new();
        let mut fields = Vec::with_capacity(raw_fields.len());

        for raw in raw_fields {
            if raw.count == 0 {
                return Err(DescriptorError::ZeroCount {
                    structure: name,
                    field: raw.name,
                });
            }

            let checked_name = resolve_field_name(&raw.name).map(str::to_string);
            if let Some(ref resolved) = checked_name {
                if let Some(first) = seen.insert(resolved.clone(), raw.name.clone()) {
                    return Err(DescriptorError::DuplicateField {
                        structure: name,
                        first,
                        second: raw.name,
                        resolved: resolved.clone(),
                    });
                }
            }

            fields.push(FieldDescriptor {
                raw_name: raw.name,
                checked_name,
                offset: raw.offset,
                element: raw.element,
                count: raw.count,
            });
        }

        Ok(StructureDescriptor {
            style: NameStyle::for_name(&name, typedefs),
            name,
            fields,
            size,
            declared_size: None,
        })
    }

    /// Attach the declared size from a size table.
    pub fn with_declared_size(mut self, declared_size: Option<usize>) -> Self {
        self.declared_size = declared_size;
        self
    }

    /// The name to use in native source (`linger` -> `struct linger`).
    pub fn native_name(&self) -> String {
        self.style.native_name(&self.name)
    }

    /// Fields that take part in the ABI contract.
    pub fn checked_fields(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.fields
            .iter()
            .filter_map(|f| f.checked_name.as_deref().map(|name| (name, f)))
    }

    /// Look up a checked field by its resolved name.
    pub fn checked_field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.checked_fields()
            .find(|(resolved, _)| *resolved == name)
            .map(|(_, f)| f)
    }
}

/// Ordered, duplicate-free set of header paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct HeaderSet(Vec<String>);

impl HeaderSet {
    /// Create a header set, dropping repeated entries but keeping order.
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = HeaderSet::default();
        for header in headers {
            set.push(header);
        }
        set
    }

    /// Append a header if not already present.
    pub fn push(&mut self, header: impl Into<String>) {
        let header = header.into();
        if !self.0.contains(&header) {
            self.0.push(header);
        }
    }

    /// Iterate headers in include order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for HeaderSet {
    fn from(header: &str) -> Self {
        HeaderSet::new([header])
    }
}

impl From<Vec<String>> for HeaderSet {
    fn from(headers: Vec<String>) -> Self {
        HeaderSet::new(headers)
    }
}

impl From<HeaderSet> for Vec<String> {
    fn from(set: HeaderSet) -> Self {
        set.0
    }
}

impl fmt::Display for HeaderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}
