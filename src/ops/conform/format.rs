//! Output formatting for conformance reports (human/JSON/GitHub).

use std::fmt::Write as _;

use super::types::{ConformReport, OutputFormat, Verdict};

/// Format a report for display (human-readable).
pub fn format_report(report: &ConformReport, verbose: bool) -> String {
    let mut output = String::new();

    write!(output, "Conformance: {}", report.catalog).unwrap();
    if let Some(compiler) = &report.compiler {
        write!(output, " ({})", compiler).unwrap();
    }
    writeln!(output).unwrap();
    writeln!(output, "{}", "=".repeat(50)).unwrap();
    writeln!(output).unwrap();

    for entry in &report.entries {
        match &entry.verdict {
            Verdict::Pass => {
                writeln!(output, "  [OK]   {} ({:.2?})", entry.structure, entry.duration).unwrap();
            }
            Verdict::Skip { reason } => {
                writeln!(output, "  [SKIP] {} ({})", entry.structure, reason).unwrap();
            }
            Verdict::Fail {
                mismatches,
                diagnostics,
            } => {
                writeln!(output, "  [FAIL] {} [{}]", entry.structure, entry.headers).unwrap();
                for mismatch in mismatches {
                    writeln!(output, "      {}", mismatch).unwrap();
                }
                if verbose || mismatches.is_empty() {
                    for line in diagnostics.lines() {
                        writeln!(output, "      | {}", line).unwrap();
                    }
                }
            }
        }
    }

    let failed_sizes: Vec<_> = report.failed_size_checks().collect();
    if !failed_sizes.is_empty() {
        writeln!(output, "\nDeclared sizes:").unwrap();
        for check in failed_sizes {
            if let Some(message) = check.message() {
                writeln!(output, "  [FAIL] {}", message).unwrap();
            }
        }
    }

    if !report.catalog_gaps.is_empty() {
        writeln!(output, "\nCatalog gaps:").unwrap();
        for gap in &report.catalog_gaps {
            writeln!(output, "  [FAIL] {}", gap).unwrap();
        }
    }

    writeln!(output).unwrap();

    let status = if report.passed { "PASSED" } else { "FAILED" };
    writeln!(
        output,
        "Result: {} ({} passed, {} failed, {} skipped)",
        status,
        report.passed_count(),
        report.failed_count(),
        report.skipped_count()
    )
    .unwrap();
    writeln!(output, "Total time: {:.2?}", report.total_duration).unwrap();

    output
}

/// Format a report as JSON.
pub fn format_report_json(report: &ConformReport) -> String {
    serde_json::to_string_pretty(report)
        .unwrap_or_else(|e| format!(r#"{{"error": "Failed to serialize report: {}"}}"#, e))
}

fn escape_annotation(message: &str) -> String {
    message.replace('%', "%25").replace('\r', "").replace('\n', "%0A")
}

/// Format a report for GitHub Actions.
///
/// Outputs:
/// - `::error::` annotations for every failed check
/// - Job summary in markdown format
pub fn format_report_github_actions(report: &ConformReport) -> String {
    let mut output = String::new();

    for entry in &report.entries {
        if let Some(summary) = entry.failure_summary() {
            writeln!(
                output,
                "::error title=ABI mismatch in {}::{}",
                entry.structure,
                escape_annotation(&summary)
            )
            .unwrap();
        }
    }
    for check in report.failed_size_checks() {
        if let Some(message) = check.message() {
            writeln!(
                output,
                "::error title=Declared size of {}::{}",
                check.structure,
                escape_annotation(&message)
            )
            .unwrap();
        }
    }
    for gap in &report.catalog_gaps {
        writeln!(
            output,
            "::error title=Catalog gap::{}",
            escape_annotation(&gap.to_string())
        )
        .unwrap();
    }

    // Job summary in markdown format
    writeln!(output, "::group::Conformance Summary").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "## {}", report.catalog).unwrap();
    writeln!(output).unwrap();

    if let Some(compiler) = &report.compiler {
        writeln!(output, "**Compiler:** {}", compiler).unwrap();
    }
    if let Some(triple) = &report.target_triple {
        writeln!(output, "**Target Triple:** {}", triple).unwrap();
    }
    writeln!(output).unwrap();

    writeln!(output, "| Structure | Headers | Status |").unwrap();
    writeln!(output, "|-----------|---------|--------|").unwrap();
    for entry in &report.entries {
        let status = match entry.verdict {
            Verdict::Pass => ":white_check_mark:",
            Verdict::Skip { .. } => ":fast_forward:",
            Verdict::Fail { .. } => ":x:",
        };
        writeln!(
            output,
            "| {} | {} | {} |",
            entry.structure, entry.headers, status
        )
        .unwrap();
    }
    writeln!(output).unwrap();

    let overall_status = if report.passed { "PASSED" } else { "FAILED" };
    let overall_emoji = if report.passed {
        ":heavy_check_mark:"
    } else {
        ":x:"
    };
    writeln!(
        output,
        "**Result:** {} {} ({} passed, {} failed, {} skipped)",
        overall_emoji,
        overall_status,
        report.passed_count(),
        report.failed_count(),
        report.skipped_count()
    )
    .unwrap();
    writeln!(output, "**Total time:** {:.2?}", report.total_duration).unwrap();

    let failed: Vec<_> = report.entries.iter().filter(|e| e.verdict.is_fail()).collect();
    if !failed.is_empty() {
        writeln!(output).unwrap();
        writeln!(output, "### Failed Checks").unwrap();
        for entry in failed {
            if let Verdict::Fail { diagnostics, .. } = &entry.verdict {
                writeln!(output).unwrap();
                writeln!(output, "<details>").unwrap();
                writeln!(output, "<summary>{}</summary>", entry.structure).unwrap();
                writeln!(output).unwrap();
                writeln!(output, "```").unwrap();
                writeln!(output, "{}", diagnostics.trim_end()).unwrap();
                writeln!(output, "```").unwrap();
                writeln!(output).unwrap();
                writeln!(output, "</details>").unwrap();
            }
        }
    }

    writeln!(output, "::endgroup::").unwrap();

    output
}

/// Format the report according to the specified output format.
pub fn format_report_for_output(
    report: &ConformReport,
    format: OutputFormat,
    verbose: bool,
) -> String {
    match format {
        OutputFormat::Human => format_report(report, verbose),
        OutputFormat::Json => format_report_json(report),
        OutputFormat::Github => format_report_github_actions(report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{HeaderSet, LayoutMismatch, MismatchKind};
    use crate::ops::conform::types::{CatalogGap, EntryResult, SizeCheck, SkipReason};
    use std::time::Duration;

    fn report() -> ConformReport {
        let mut report = ConformReport::new("linux");
        report.compiler = Some("gcc".to_string());
        report.add_entry(EntryResult {
            structure: "linger".to_string(),
            headers: HeaderSet::from("sys/socket.h"),
            verdict: Verdict::Pass,
            duration: Duration::from_millis(12),
        });
        report.add_entry(EntryResult {
            structure: "ucred".to_string(),
            headers: HeaderSet::from("sys/socket.h"),
            verdict: Verdict::Skip {
                reason: SkipReason::StructureUnsupported,
            },
            duration: Duration::ZERO,
        });
        report.add_entry(EntryResult {
            structure: "msghdr".to_string(),
            headers: HeaderSet::from("sys/socket.h"),
            verdict: Verdict::Fail {
                mismatches: vec![LayoutMismatch::new("msghdr", "msg_flags", MismatchKind::Offset)],
                diagnostics: "check.c:9:1: error: static assertion failed: \"msghdr.msg_flags is not at expected offset\"\n".to_string(),
            },
            duration: Duration::from_millis(20),
        });
        report.add_size_check(SizeCheck {
            structure: "msghdr".to_string(),
            measured: 56,
            declared: Some(48),
        });
        report.add_gaps(vec![CatalogGap::Uncatalogued {
            structure: "iovec".to_string(),
        }]);
        report
    }

    #[test]
    fn test_format_human() {
        let output = format_report(&report(), false);
        assert!(output.contains("Conformance: linux (gcc)"));
        assert!(output.contains("[OK]   linger"));
        assert!(output.contains("[SKIP] ucred (structure not supported on this platform)"));
        assert!(output.contains("[FAIL] msghdr [sys/socket.h]"));
        assert!(output.contains("msghdr.msg_flags: offset differs"));
        assert!(!output.contains("| check.c"));
        assert!(output.contains("declared as 48 bytes but measures 56 bytes"));
        assert!(output.contains("`iovec` is neither in the conformance matrix"));
        assert!(output.contains("Result: FAILED (1 passed, 1 failed, 1 skipped)"));
    }

    #[test]
    fn test_format_human_verbose_shows_diagnostics() {
        let output = format_report(&report(), true);
        assert!(output.contains("| check.c:9:1: error"));
    }

    #[test]
    fn test_format_json() {
        let output = format_report_json(&report());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["catalog"], "linux");
        assert_eq!(value["passed"], false);
        assert_eq!(value["entries"][1]["verdict"]["status"], "skip");
        assert_eq!(value["entries"][2]["verdict"]["mismatches"][0]["kind"], "offset");
        assert_eq!(value["catalog_gaps"][0]["kind"], "uncatalogued");
    }

    #[test]
    fn test_format_github() {
        let output = format_report_github_actions(&report());
        assert!(output.contains("::error title=ABI mismatch in msghdr::msghdr.msg_flags: offset differs"));
        assert!(output.contains("::error title=Declared size of msghdr::"));
        assert!(output.contains("::error title=Catalog gap::"));
        assert!(output.contains("| ucred | sys/socket.h | :fast_forward: |"));
        assert!(output.contains("::endgroup::"));
    }

    #[test]
    fn test_escape_annotation() {
        assert_eq!(escape_annotation("a\nb%\r"), "a%0Ab%25");
    }
}
