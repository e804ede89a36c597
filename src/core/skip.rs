//! Fields exempt from size checking.
//!
//! Entries are accepted, permanent divergences: the native header uses a
//! different integer width than the binding for that field (`size_t` on
//! glibc, `int` plus explicit padding on musl). The offset of such a field
//! is still checked.

use std::collections::BTreeSet;

/// Set of `(structure, field)` pairs whose size is not asserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipList(BTreeSet<(String, String)>);

impl SkipList {
    pub fn new() -> Self {
        SkipList::default()
    }

    /// Add an entry.
    pub fn with(mut self, structure: impl Into<String>, field: impl Into<String>) -> Self {
        self.0.insert((structure.into(), field.into()));
        self
    }

    /// Whether the size of `structure.field` is exempt.
    pub fn contains(&self, structure: &str, field: &str) -> bool {
        self.0
            .iter()
            .any(|(s, f)| s == structure && f == field)
    }

    /// Iterate entries as `(structure, field)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(s, f)| (s.as_str(), f.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>, F: Into<String>> FromIterator<(S, F)> for SkipList {
    fn from_iter<I: IntoIterator<Item = (S, F)>>(iter: I) -> Self {
        SkipList(
            iter.into_iter()
                .map(|(s, f)| (s.into(), f.into()))
                .collect(),
        )
    }
}
