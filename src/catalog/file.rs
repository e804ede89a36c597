//! TOML catalog files.
//!
//! Lets bindings produced outside Rust be checked. The producer reports the
//! layout it computed; the verifier only compares it against the headers.
//!
//! ```toml
//! name = "sockets"
//! typedefs = ["socklen_t"]
//! unchecked = ["internal_state"]
//!
//! [[skip]]
//! structure = "msghdr"
//! field = "msg_iovlen"
//!
//! [[struct]]
//! name = "linger"
//! headers = ["sys/socket.h"]
//! size = 8
//! declared_size = 8
//!
//! [[struct.field]]
//! name = "_l_onoff"
//! offset = 0
//! type = { name = "int", size = 4 }
//! ```
//!
//! A structure with `headers` is part of the conformance matrix; one without
//! is only known to the completeness check.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::{HeaderSet, RawField};

use super::{BindingCatalog, CheckSpec, DefinitionKind, StructureDefinition};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    name: Option<String>,
    #[serde(default)]
    typedefs: Vec<String>,
    #[serde(default)]
    unchecked: Vec<String>,
    #[serde(default)]
    skip: Vec<SkipEntry>,
    #[serde(default, rename = "struct")]
    structs: Vec<StructEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SkipEntry {
    structure: String,
    field: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StructEntry {
    name: String,
    #[serde(default = "default_kind")]
    kind: DefinitionKind,
    #[serde(default = "default_public")]
    public: bool,
    size: usize,
    declared_size: Option<u16>,
    headers: Option<HeaderSet>,
    #[serde(default, rename = "field")]
    fields: Vec<RawField>,
}

fn default_kind() -> DefinitionKind {
    DefinitionKind::Struct
}

fn default_public() -> bool {
    true
}

/// Parse a catalog from TOML text.
pub fn parse(contents: &str) -> Result<BindingCatalog> {
    let file: CatalogFile = toml::from_str(contents)?;

    let mut catalog = BindingCatalog {
        name: file.name.unwrap_or_else(|| "custom".to_string()),
        typedefs: file.typedefs.into_iter().collect(),
        unchecked: file.unchecked.into_iter().collect(),
        skip_list: file
            .skip
            .into_iter()
            .map(|s| (s.structure, s.field))
            .collect(),
        ..Default::default()
    };

    for entry in file.structs {
        if let Some(size) = entry.declared_size {
            catalog.declared_sizes.insert(entry.name.clone(), size);
        }
        if let Some(headers) = entry.headers {
            catalog.checks.push(CheckSpec {
                structure: entry.name.clone(),
                headers,
            });
        }
        catalog.definitions.push(StructureDefinition {
            name: entry.name,
            public: entry.public,
            kind: entry.kind,
            fields: entry.fields,
            size: entry.size,
        });
    }

    Ok(catalog)
}

/// Load a catalog file.
pub fn load(path: &Path) -> Result<BindingCatalog> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog: {}", path.display()))?;

    parse(&contents).with_context(|| format!("failed to parse catalog: {}", path.display()))
}
