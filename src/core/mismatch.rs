//! Layout mismatch reports and the assertion messages that carry them.
//!
//! Every static assertion emitted by the source generator carries one of the
//! messages produced here. When compilation fails, the same formats are
//! matched against compiler diagnostics to recover which structure and field
//! diverged.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Field label used for whole-structure size mismatches.
pub const TOTAL_SIZE_FIELD: &str = "(total size)";

/// What part of the layout diverged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MismatchKind {
    Offset,
    Size,
    TotalSize,
}

impl MismatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MismatchKind::Offset => "offset",
            MismatchKind::Size => "size",
            MismatchKind::TotalSize => "total-size",
        }
    }
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A static assertion that failed at compile time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LayoutMismatch {
    /// Logical structure name
    pub structure: String,
    /// Resolved field name, or [`TOTAL_SIZE_FIELD`]
    pub field: String,
    /// Kind of mismatch
    pub kind: MismatchKind,
}

impl LayoutMismatch {
    pub fn new(structure: impl Into<String>, field: impl Into<String>, kind: MismatchKind) -> Self {
        LayoutMismatch {
            structure: structure.into(),
            field: field.into(),
            kind,
        }
    }

    pub fn total_size(structure: impl Into<String>) -> Self {
        LayoutMismatch::new(structure, TOTAL_SIZE_FIELD, MismatchKind::TotalSize)
    }
}

impl fmt::Display for LayoutMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MismatchKind::TotalSize => write!(f, "{}: total size differs", self.structure),
            kind => write!(f, "{}.{}: {} differs", self.structure, self.field, kind),
        }
    }
}

/// Assertion message for a field offset check.
pub fn offset_message(structure: &str, field: &str) -> String {
    format!("{}.{} is not at expected offset", structure, field)
}

/// Assertion message for a field size check.
pub fn size_message(structure: &str, field: &str) -> String {
    format!("{}.{} is not of expected size", structure, field)
}

/// Assertion message for the whole-structure size check.
pub fn total_size_message(native_name: &str) -> String {
    format!("{} does not have expected size", native_name)
}

static FIELD_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*) is not (at expected offset|of expected size)")
        .expect("field message pattern is valid")
});

static TOTAL_MESSAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:struct )?([A-Za-z_][A-Za-z0-9_]*) does not have expected size")
        .expect("total size message pattern is valid")
});

/// Extract layout mismatches from compiler diagnostics.
///
/// GCC and Clang both echo the literal assertion message; duplicates (a
/// message quoted in both the error and a note) are reported once.
pub fn parse_mismatches(diagnostics: &str) -> Vec<LayoutMismatch> {
    let mut found: Vec<LayoutMismatch> = Vec::new();

    for line in diagnostics.lines() {
        let mismatch = if let Some(caps) = FIELD_MESSAGE.captures(line) {
            let kind = if &caps[3] == "at expected offset" {
                MismatchKind::Offset
            } else {
                MismatchKind::Size
            };
            LayoutMismatch::new(&caps[1], &caps[2], kind)
        } else if let Some(caps) = TOTAL_MESSAGE.captures(line) {
            LayoutMismatch::total_size(&caps[1])
        } else {
            continue;
        };

        if !found.contains(&mismatch) {
            found.push(mismatch);
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gcc_diagnostics() {
        let stderr = r#"/tmp/abi-conform-x/check.c:9:1: error: static assertion failed: "msghdr.msg_iovlen is not of expected size"
    9 | _Static_assert(member_size(struct msghdr, msg_iovlen) == 4, "msghdr.msg_iovlen is not of expected size");
      | ^~~~~~~~~~~~~~
/tmp/abi-conform-x/check.c:12:1: error: static assertion failed: "struct msghdr does not have expected size"
"#;
        let found = parse_mismatches(stderr);
        assert_eq!(
            found,
            vec![
                LayoutMismatch::new("msghdr", "msg_iovlen", MismatchKind::Size),
                LayoutMismatch::total_size("msghdr"),
            ]
        );
    }

    #[test]
    fn test_parse_clang_diagnostics() {
        let stderr = "check.c:7:1: error: static assertion failed due to requirement 'offsetof(struct linger, l_linger) == 8': linger.l_linger is not at expected offset\n";
        let found = parse_mismatches(stderr);
        assert_eq!(
            found,
            vec![LayoutMismatch::new("linger", "l_linger", MismatchKind::Offset)]
        );
    }

    #[test]
    fn test_parse_typedef_total_size() {
        let found = parse_mismatches("error: static assertion failed: \"size_t does not have expected size\"");
        assert_eq!(found, vec![LayoutMismatch::total_size("size_t")]);
    }

    #[test]
    fn test_parse_unrelated_errors() {
        assert!(parse_mismatches("fatal error: sys/epoll.h: No such file or directory").is_empty());
    }

    #[test]
    fn test_display() {
        let m = LayoutMismatch::new("linger", "l_onoff", MismatchKind::Offset);
        assert_eq!(m.to_string(), "linger.l_onoff: offset differs");
        assert_eq!(LayoutMismatch::total_size("linger").to_string(), "linger: total size differs");
    }
}
