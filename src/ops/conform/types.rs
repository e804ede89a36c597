//! Public types and enums for the conform module.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::builder::CompileError;
use crate::core::{HeaderSet, LayoutMismatch};

/// Output format for conformance reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// Machine-readable JSON output
    Json,
    /// GitHub Actions annotations with job summary
    Github,
}

impl std::str::FromStr for OutputFormat {
    type Err = OutputFormatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            "github" | "github-actions" | "gha" => Ok(OutputFormat::Github),
            _ => Err(OutputFormatParseError(s.to_string())),
        }
    }
}

/// Error parsing output format option.
#[derive(Debug, Clone, Error)]
#[error("invalid output format '{0}', valid values: human, json, github")]
pub struct OutputFormatParseError(pub String);

/// Errors that stop a conformance run.
#[derive(Debug, Error)]
pub enum ConformError {
    /// The compiler cannot be used; no verdict of this run can be trusted.
    #[error("toolchain failure while checking `{structure}`")]
    Toolchain {
        structure: String,
        #[source]
        source: CompileError,
    },

    #[error("`{0}` is not in the conformance matrix")]
    NotInMatrix(String),

    #[error("failed to start compile workers")]
    Workers(#[from] rayon::ThreadPoolBuildError),
}

/// Why a matrix entry was not checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    /// The structure is marked unsupported on this platform
    StructureUnsupported,
    /// The structure has no capability record and unknown ones are skipped
    StructureUnknown,
    /// A required header cannot be included
    HeadersUnsupported,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::StructureUnsupported => "structure not supported on this platform",
            SkipReason::StructureUnknown => "structure support unknown",
            SkipReason::HeadersUnsupported => "headers not available",
        };
        f.write_str(reason)
    }
}

/// Outcome of one matrix entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Skip {
        reason: SkipReason,
    },
    Fail {
        /// Mismatches recovered from the diagnostics; empty when the failure
        /// was not a static assertion (e.g. an unknown field name)
        mismatches: Vec<LayoutMismatch>,
        diagnostics: String,
    },
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Verdict::Skip { .. })
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, Verdict::Fail { .. })
    }
}

/// Result of one matrix entry.
#[derive(Debug, Clone, Serialize)]
pub struct EntryResult {
    /// Structure name
    pub structure: String,

    /// Headers the check was compiled against
    pub headers: HeaderSet,

    pub verdict: Verdict,

    /// How long the entry took (in milliseconds for JSON)
    #[serde(serialize_with = "serialize_duration_ms")]
    pub duration: Duration,
}

impl EntryResult {
    /// One line describing a failed entry.
    pub fn failure_summary(&self) -> Option<String> {
        match &self.verdict {
            Verdict::Fail { mismatches, .. } if !mismatches.is_empty() => Some(
                mismatches
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            Verdict::Fail { diagnostics, .. } => Some(
                diagnostics
                    .lines()
                    .find(|l| l.contains("error"))
                    .unwrap_or("compilation failed")
                    .trim()
                    .to_string(),
            ),
            _ => None,
        }
    }
}

fn serialize_duration_ms<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Declared size of a structure compared against its measured size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizeCheck {
    pub structure: String,
    /// Size reported by the field enumerator
    pub measured: usize,
    /// Size from the declared-size table; `None` when the table has no entry
    pub declared: Option<usize>,
}

impl SizeCheck {
    pub fn passed(&self) -> bool {
        self.declared == Some(self.measured)
    }

    /// Description of the failure, if any.
    pub fn message(&self) -> Option<String> {
        match self.declared {
            None => Some(format!(
                "`{}` has no entry in the declared-size table",
                self.structure
            )),
            Some(declared) if declared != self.measured => Some(format!(
                "`{}` is declared as {} bytes but measures {} bytes",
                self.structure, declared, self.measured
            )),
            Some(_) => None,
        }
    }
}

/// A coverage defect in the catalog itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CatalogGap {
    /// Public structure neither checked nor listed as unchecked
    Uncatalogued { structure: String },
    /// Structure both checked and listed as unchecked
    DoublyListed { structure: String },
    /// Matrix entry naming a structure the catalog does not define
    UnknownCheck { structure: String },
    /// Unchecked-list entry naming a structure the catalog does not define
    UnknownUnchecked { structure: String },
    /// Declared-size entry with no matching structure
    OrphanSize { structure: String },
    /// Skip-list entry that matches no checked field
    StaleSkip { structure: String, field: String },
    /// Matrix entry whose definition cannot be turned into a descriptor
    InvalidDefinition { structure: String, error: String },
}

impl fmt::Display for CatalogGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogGap::Uncatalogued { structure } => write!(
                f,
                "`{}` is neither in the conformance matrix nor in the unchecked list",
                structure
            ),
            CatalogGap::DoublyListed { structure } => write!(
                f,
                "`{}` is in both the conformance matrix and the unchecked list",
                structure
            ),
            CatalogGap::UnknownCheck { structure } => {
                write!(f, "conformance matrix names unknown structure `{}`", structure)
            }
            CatalogGap::UnknownUnchecked { structure } => {
                write!(f, "unchecked list names unknown structure `{}`", structure)
            }
            CatalogGap::OrphanSize { structure } => write!(
                f,
                "declared-size table has an entry for unknown structure `{}`",
                structure
            ),
            CatalogGap::StaleSkip { structure, field } => write!(
                f,
                "skip list entry `{}.{}` matches no checked field",
                structure, field
            ),
            CatalogGap::InvalidDefinition { structure, error } => {
                write!(f, "invalid definition of `{}`: {}", structure, error)
            }
        }
    }
}

/// Complete conformance report.
#[derive(Debug, Clone, Serialize)]
pub struct ConformReport {
    /// Catalog name
    pub catalog: String,

    /// Compiler used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler: Option<String>,

    /// Target triple (for cross checks)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_triple: Option<String>,

    /// Matrix entries in matrix order
    pub entries: Vec<EntryResult>,

    /// Declared-size cross-checks
    pub size_checks: Vec<SizeCheck>,

    /// Catalog coverage defects
    pub catalog_gaps: Vec<CatalogGap>,

    /// Total run time (in milliseconds for JSON)
    #[serde(serialize_with = "serialize_duration_ms")]
    pub total_duration: Duration,

    /// Whether the run passed overall
    pub passed: bool,
}

impl ConformReport {
    pub fn new(catalog: impl Into<String>) -> Self {
        ConformReport {
            catalog: catalog.into(),
            compiler: None,
            target_triple: None,
            entries: Vec::new(),
            size_checks: Vec::new(),
            catalog_gaps: Vec::new(),
            total_duration: Duration::ZERO,
            passed: true,
        }
    }

    /// Add a matrix entry result.
    pub fn add_entry(&mut self, entry: EntryResult) {
        if entry.verdict.is_fail() {
            self.passed = false;
        }
        self.entries.push(entry);
    }

    /// Add a declared-size check.
    pub fn add_size_check(&mut self, check: SizeCheck) {
        if !check.passed() {
            self.passed = false;
        }
        self.size_checks.push(check);
    }

    /// Add catalog coverage defects.
    pub fn add_gaps(&mut self, gaps: impl IntoIterator<Item = CatalogGap>) {
        for gap in gaps {
            self.passed = false;
            self.catalog_gaps.push(gap);
        }
    }

    /// Get count of passed entries.
    pub fn passed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.verdict.is_pass()).count()
    }

    /// Get count of failed entries.
    pub fn failed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.verdict.is_fail()).count()
    }

    /// Get count of skipped entries.
    pub fn skipped_count(&self) -> usize {
        self.entries.iter().filter(|e| e.verdict.is_skip()).count()
    }

    /// Declared-size checks that failed.
    pub fn failed_size_checks(&self) -> impl Iterator<Item = &SizeCheck> {
        self.size_checks.iter().filter(|c| !c.passed())
    }
}

/// Options for a conformance run.
#[derive(Debug, Clone, Default)]
pub struct ConformOptions {
    /// Structures to check; empty means the whole matrix
    pub structures: Vec<String>,

    /// Number of parallel compiles
    pub jobs: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MismatchKind;

    fn entry(structure: &str, verdict: Verdict) -> EntryResult {
        EntryResult {
            structure: structure.to_string(),
            headers: HeaderSet::from("sys/socket.h"),
            verdict,
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_report_counts() {
        let mut report = ConformReport::new("linux");
        report.add_entry(entry("linger", Verdict::Pass));
        report.add_entry(entry(
            "ucred",
            Verdict::Skip {
                reason: SkipReason::StructureUnsupported,
            },
        ));

        assert!(report.passed);
        assert_eq!(report.passed_count(), 1);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.failed_count(), 0);
    }

    #[test]
    fn test_report_failed_entry() {
        let mut report = ConformReport::new("linux");
        report.add_entry(entry(
            "msghdr",
            Verdict::Fail {
                mismatches: vec![LayoutMismatch::new("msghdr", "msg_flags", MismatchKind::Offset)],
                diagnostics: String::new(),
            },
        ));

        assert!(!report.passed);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(
            report.entries[0].failure_summary().unwrap(),
            "msghdr.msg_flags: offset differs"
        );
    }

    #[test]
    fn test_failure_summary_without_mismatches() {
        let e = entry(
            "linger",
            Verdict::Fail {
                mismatches: Vec::new(),
                diagnostics: "check.c:9:1: error: 'struct linger' has no member named 'l_x'\n"
                    .to_string(),
            },
        );
        assert_eq!(
            e.failure_summary().unwrap(),
            "check.c:9:1: error: 'struct linger' has no member named 'l_x'"
        );
    }

    #[test]
    fn test_size_check() {
        let ok = SizeCheck {
            structure: "linger".to_string(),
            measured: 8,
            declared: Some(8),
        };
        assert!(ok.passed());
        assert!(ok.message().is_none());

        let missing = SizeCheck {
            declared: None,
            ..ok.clone()
        };
        assert!(!missing.passed());
        assert!(missing.message().unwrap().contains("no entry"));

        let mut report = ConformReport::new("linux");
        report.add_size_check(missing);
        assert!(!report.passed);
        assert_eq!(report.failed_size_checks().count(), 1);
    }

    #[test]
    fn test_gaps_fail_report() {
        let mut report = ConformReport::new("linux");
        report.add_gaps(vec![CatalogGap::Uncatalogued {
            structure: "iovec".to_string(),
        }]);
        assert!(!report.passed);
    }

    #[test]
    fn test_verdict_json() {
        let json = serde_json::to_string(&Verdict::Skip {
            reason: SkipReason::HeadersUnsupported,
        })
        .unwrap();
        assert_eq!(json, r#"{"status":"skip","reason":"headers-unsupported"}"#);
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("GHA".parse::<OutputFormat>().unwrap(), OutputFormat::Github);
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
