//! Assertion source generation.
//!
//! Turns a [`StructureDescriptor`] into a C translation unit whose only
//! content is `_Static_assert`s about the structure's layout. If the unit
//! compiles against the platform headers, the layout conforms.
//!
//! Generation is a pure function of its inputs and cannot fail; layout
//! problems surface only when the unit is compiled.

use std::fmt::Write;

use crate::core::mismatch::{offset_message, size_message, total_size_message};
use crate::core::{HeaderSet, SkipList, StructureDescriptor};

/// Header always included after the requested ones, for `offsetof`.
pub const BASELINE_HEADER: &str = "stddef.h";

/// Feature-test macro enabling GNU/Linux extensions.
pub const FEATURE_TEST_MACRO: &str = "_GNU_SOURCE";

const MEMBER_SIZE_MACRO: &str = "#define member_size(type, member) sizeof(((type *)0)->member)";

/// Integer aliases used by the bindings that have no single native spelling.
const SYNTHETIC_TYPEDEFS: &[&str] = &["typedef long syscall_arg;", "typedef long long_t;"];

/// Generated C source for one structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionUnit {
    /// Logical structure name
    pub structure: String,
    /// Complete translation unit
    pub source: String,
}

/// Generate the assertion unit for a structure.
pub fn generate(
    descriptor: &StructureDescriptor,
    headers: &HeaderSet,
    skip_list: &SkipList,
) -> AssertionUnit {
    let native = descriptor.native_name();
    let name = descriptor.name.as_str();

    let mut source = prelude(headers);

    writeln!(source, "{}", MEMBER_SIZE_MACRO).unwrap();
    for typedef in SYNTHETIC_TYPEDEFS {
        writeln!(source, "{}", typedef).unwrap();
    }
    writeln!(source).unwrap();

    for (field, desc) in descriptor.checked_fields() {
        static_assert(
            &mut source,
            &format!("offsetof({}, {}) == {}", native, field, desc.offset),
            &offset_message(name, field),
        );

        if skip_list.contains(name, field) {
            continue;
        }

        static_assert(
            &mut source,
            &format!(
                "member_size({}, {}) == {}",
                native,
                field,
                desc.declared_size()
            ),
            &size_message(name, field),
        );
    }

    static_assert(
        &mut source,
        &format!("sizeof({}) == {}", native, descriptor.size),
        &total_size_message(&native),
    );

    AssertionUnit {
        structure: descriptor.name.clone(),
        source,
    }
}

/// Source that only includes `headers`, used to probe whether they exist.
pub fn probe_source(headers: &HeaderSet) -> String {
    let mut source = String::new();
    writeln!(source, "#define {}", FEATURE_TEST_MACRO).unwrap();
    for header in headers.iter() {
        writeln!(source, "#include <{}>", header).unwrap();
    }
    source
}

fn prelude(headers: &HeaderSet) -> String {
    let mut source = probe_source(headers);
    writeln!(source, "#include <{}>", BASELINE_HEADER).unwrap();
    writeln!(source).unwrap();
    source
}

fn static_assert(source: &mut String, condition: &str, message: &str) {
    writeln!(source, "_Static_assert({}, \"{}\");", condition, message).unwrap();
}
