//! Name resolution between managed descriptions and native headers.
//!
//! Structure names are either typedef names (`size_t`, `cpu_set_t`) used as
//! is, or tag names that need the `struct` keyword. Field names carry an
//! encoding that marks which fields are part of the ABI contract:
//!
//! - `<name>k__BackingField`: compiler-generated backing field, checked as `name`
//! - `_name`: checked as `name`
//! - `__name` or anything else: implementation detail, not checked

use std::collections::HashSet;

use serde::Serialize;

/// Opening marker of a backing-field name.
pub const BACKING_FIELD_OPEN: char = '<';

/// Closing marker of a backing-field name.
pub const BACKING_FIELD_CLOSE: char = '>';

/// How a structure is referenced in native source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NameStyle {
    /// Referenced by its alias name alone
    Typedef,
    /// Referenced as `struct <name>`
    Tag,
}

impl NameStyle {
    /// Pick the style for `name` given the set of known typedef names.
    pub fn for_name(name: &str, typedefs: &HashSet<String>) -> Self {
        if typedefs.contains(name) {
            NameStyle::Typedef
        } else {
            NameStyle::Tag
        }
    }

    /// Spell `name` the way native source refers to it.
    pub fn native_name(self, name: &str) -> String {
        match self {
            NameStyle::Typedef => name.to_string(),
            NameStyle::Tag => format!("struct {}", name),
        }
    }
}

/// Resolve an encoded field name to the header field name.
///
/// Returns `None` for fields that are not checked. A backing-field name
/// without its closing marker, or one that resolves to nothing, is not
/// checked either.
pub fn resolve_field_name(raw: &str) -> Option<&str> {
    if let Some(rest) = raw.strip_prefix(BACKING_FIELD_OPEN) {
        let end = rest.find(BACKING_FIELD_CLOSE)?;
        return non_empty(&rest[..end]);
    }

    if raw.starts_with("__") {
        return None;
    }

    raw.strip_prefix('_').and_then(non_empty)
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typedefs() -> HashSet<String> {
        ["size_t", "epoll_data_t"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_typedef_names_pass_through() {
        let set = typedefs();
        assert_eq!(NameStyle::for_name("size_t", &set).native_name("size_t"), "size_t");
        assert_eq!(
            NameStyle::for_name("epoll_data_t", &set).native_name("epoll_data_t"),
            "epoll_data_t"
        );
    }

    #[test]
    fn test_tag_names_get_struct_keyword() {
        let set = typedefs();
        assert_eq!(NameStyle::for_name("linger", &set).native_name("linger"), "struct linger");
    }

    #[test]
    fn test_backing_field() {
        assert_eq!(resolve_field_name("<l_onoff>k__BackingField"), Some("l_onoff"));
        assert_eq!(resolve_field_name("<x>"), Some("x"));
    }

    #[test]
    fn test_backing_field_without_close_is_unchecked() {
        assert_eq!(resolve_field_name("<broken"), None);
        assert_eq!(resolve_field_name("<>k__BackingField"), None);
    }

    #[test]
    fn test_single_underscore_strips_exactly_one() {
        assert_eq!(resolve_field_name("_sin_port"), Some("sin_port"));
        assert_eq!(resolve_field_name("_a_b_"), Some("a_b_"));
    }

    #[test]
    fn test_double_underscore_is_unchecked() {
        assert_eq!(resolve_field_name("__ss_padding"), None);
        assert_eq!(resolve_field_name("___x"), None);
    }

    #[test]
    fn test_plain_names_are_unchecked() {
        assert_eq!(resolve_field_name("value"), None);
        assert_eq!(resolve_field_name("0"), None);
        assert_eq!(resolve_field_name("_"), None);
        assert_eq!(resolve_field_name(""), None);
    }
}
