//! Self-consistency checks of a catalog.
//!
//! These do not involve the compiler. They guard against the catalog
//! drifting: a new public binding nobody checks, a declared size nobody
//! updated, or a skip-list entry for a field that no longer exists.

use std::collections::{BTreeSet, HashSet};

use crate::catalog::BindingCatalog;

use super::matrix::ConformanceMatrix;
use super::types::{CatalogGap, SizeCheck};

/// Compare each matrix entry's measured size with the declared-size table.
pub fn declared_size_checks(matrix: &ConformanceMatrix) -> Vec<SizeCheck> {
    matrix
        .entries()
        .iter()
        .map(|entry| SizeCheck {
            structure: entry.descriptor.name.clone(),
            measured: entry.descriptor.size,
            declared: entry.descriptor.declared_size,
        })
        .collect()
}

/// Find every coverage defect of a catalog.
///
/// Every public definition must be in exactly one of the matrix and the
/// unchecked list, and every name the catalog's tables mention must be
/// defined.
pub fn catalog_gaps(catalog: &BindingCatalog) -> Vec<CatalogGap> {
    let defined: HashSet<&str> = catalog.definitions.iter().map(|d| d.name.as_str()).collect();
    let checked: HashSet<&str> = catalog.checks.iter().map(|c| c.structure.as_str()).collect();
    let unchecked: HashSet<&str> = catalog.unchecked.iter().map(String::as_str).collect();

    let mut gaps = BTreeSet::new();

    for def in catalog.definitions.iter().filter(|d| d.public) {
        let name = def.name.as_str();
        match (checked.contains(name), unchecked.contains(name)) {
            (false, false) => {
                gaps.insert(CatalogGap::Uncatalogued {
                    structure: name.to_string(),
                });
            }
            (true, true) => {
                gaps.insert(CatalogGap::DoublyListed {
                    structure: name.to_string(),
                });
            }
            _ => {}
        }
    }

    for check in &catalog.checks {
        if !defined.contains(check.structure.as_str()) {
            continue;
        }
        if let Err(e) = catalog.descriptor(&check.structure) {
            gaps.insert(CatalogGap::InvalidDefinition {
                structure: check.structure.clone(),
                error: e.to_string(),
            });
        }
    }

    for name in checked.iter().filter(|n| !defined.contains(*n)) {
        gaps.insert(CatalogGap::UnknownCheck {
            structure: name.to_string(),
        });
    }

    for name in unchecked.iter().filter(|n| !defined.contains(*n)) {
        gaps.insert(CatalogGap::UnknownUnchecked {
            structure: name.to_string(),
        });
    }

    for name in catalog.declared_sizes.keys() {
        if !defined.contains(name.as_str()) {
            gaps.insert(CatalogGap::OrphanSize {
                structure: name.clone(),
            });
        }
    }

    for (structure, field) in catalog.skip_list.iter() {
        let exists = catalog
            .descriptor(structure)
            .map(|d| d.checked_field(field).is_some())
            .unwrap_or(false);
        if !exists {
            gaps.insert(CatalogGap::StaleSkip {
                structure: structure.to_string(),
                field: field.to_string(),
            });
        }
    }

    gaps.into_iter().collect()
}
