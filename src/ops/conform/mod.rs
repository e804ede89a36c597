//! ABI conformance runs.
//!
//! A run checks a binding catalog against the platform's system headers.
//!
//! ## Usage
//!
//! ```bash
//! abi-conform check                       # Check the built-in catalog
//! abi-conform check linger msghdr         # Check selected structures
//! abi-conform check --catalog my.toml     # Check bindings described in TOML
//! abi-conform check --format github       # GitHub Actions output
//! ```
//!
//! ## Checks
//!
//! 1. Catalog completeness (no compiler involved)
//! 2. Declared sizes against measured sizes
//! 3. One compile per matrix entry, gated by the capability oracle
//!
//! ## Output Formats
//!
//! - `human`: Default human-readable output
//! - `json`: Machine-readable JSON output
//! - `github`: GitHub Actions annotations with job summary

mod completeness;
mod format;
mod matrix;
mod types;

use std::time::Instant;

use crate::builder::{CapabilityOracle, CompilerPipeline};
use crate::catalog::BindingCatalog;

pub use self::completeness::{catalog_gaps, declared_size_checks};
pub use self::format::{format_report, format_report_for_output};
pub use self::matrix::{run_entry, run_matrix, CheckContext, ConformanceMatrix, MatrixEntry};
pub use self::types::{
    CatalogGap, ConformError, ConformOptions, ConformReport, EntryResult, OutputFormat,
    OutputFormatParseError, SizeCheck, SkipReason, Verdict,
};

/// Check a catalog against the platform headers.
///
/// Layout mismatches and catalog gaps are recorded in the report. An error is
/// returned only when the run itself cannot be trusted.
pub fn conform(
    catalog: &BindingCatalog,
    pipeline: &CompilerPipeline,
    oracle: &CapabilityOracle,
    options: &ConformOptions,
) -> Result<ConformReport, ConformError> {
    let start = Instant::now();
    let mut report = ConformReport::new(&catalog.name);
    report.compiler = Some(pipeline.toolchain().compiler_path().display().to_string());
    report.target_triple = pipeline.target().triple.clone();

    report.add_gaps(catalog_gaps(catalog));

    let matrix = ConformanceMatrix::build(catalog).select(&options.structures)?;
    for check in declared_size_checks(&matrix) {
        report.add_size_check(check);
    }

    let ctx = CheckContext {
        pipeline,
        oracle,
        skip_list: &catalog.skip_list,
    };
    for entry in run_matrix(&matrix, &ctx, options.jobs)? {
        report.add_entry(entry);
    }

    report.total_duration = start.elapsed();
    tracing::info!(
        "{} passed, {} failed, {} skipped in {:.2?}",
        report.passed_count(),
        report.failed_count(),
        report.skipped_count(),
        report.total_duration
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::compile::tests::ScriptToolchain;
    use crate::catalog::{CheckSpec, DefinitionKind, StructureDefinition};
    use crate::core::{ElementType, RawField};

    fn catalog() -> BindingCatalog {
        let mut catalog = BindingCatalog {
            name: "test".to_string(),
            ..Default::default()
        };
        for name in ["linger", "ucred"] {
            catalog.definitions.push(StructureDefinition {
                name: name.to_string(),
                public: true,
                kind: DefinitionKind::Struct,
                fields: vec![RawField {
                    name: "_a".to_string(),
                    offset: 0,
                    element: ElementType::new("int32_t", 4),
                    count: 1,
                }],
                size: 4,
            });
            catalog.checks.push(CheckSpec::new("sys/socket.h", name));
            catalog.declared_sizes.insert(name.to_string(), 4);
        }
        catalog
    }

    #[test]
    fn test_conform_passes() {
        let pipeline = CompilerPipeline::new(Box::new(ScriptToolchain::new("exit 0")));
        let oracle = CapabilityOracle::new().with_struct("ucred", false);

        let report = conform(&catalog(), &pipeline, &oracle, &ConformOptions::default()).unwrap();
        assert!(report.passed);
        assert_eq!(report.passed_count(), 1);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.size_checks.len(), 2);
        assert_eq!(report.compiler.as_deref(), Some("sh"));
    }

    #[test]
    fn test_conform_selected() {
        let pipeline = CompilerPipeline::new(Box::new(ScriptToolchain::new("exit 0")));
        let oracle = CapabilityOracle::new();
        let options = ConformOptions {
            structures: vec!["ucred".to_string()],
            ..Default::default()
        };

        let report = conform(&catalog(), &pipeline, &oracle, &options).unwrap();
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].structure, "ucred");
    }

    #[test]
    fn test_conform_reports_size_drift() {
        let mut catalog = catalog();
        catalog.declared_sizes.insert("linger".to_string(), 8);
        let pipeline = CompilerPipeline::new(Box::new(ScriptToolchain::new("exit 0")));
        let oracle = CapabilityOracle::new();

        let report = conform(&catalog, &pipeline, &oracle, &ConformOptions::default()).unwrap();
        assert!(!report.passed);
        assert_eq!(report.failed_count(), 0);
        assert_eq!(report.failed_size_checks().count(), 1);
    }

    #[test]
    fn test_conform_invalid_definition_stays_local() {
        let mut catalog = catalog();
        catalog.definitions[1].fields.push(RawField {
            name: "<a>k__BackingField".to_string(),
            offset: 0,
            element: ElementType::new("int32_t", 4),
            count: 1,
        });
        let pipeline = CompilerPipeline::new(Box::new(ScriptToolchain::new("exit 0")));
        let oracle = CapabilityOracle::new();

        let report = conform(&catalog, &pipeline, &oracle, &ConformOptions::default()).unwrap();
        assert!(!report.passed);
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].structure, "linger");
        assert!(report.entries[0].verdict.is_pass());
        assert!(matches!(
            &report.catalog_gaps[..],
            [CatalogGap::InvalidDefinition { structure, .. }] if structure == "ucred"
        ));
    }

    #[test]
    fn test_conform_toolchain_failure() {
        let pipeline = CompilerPipeline::new(Box::new(ScriptToolchain::missing()));
        let oracle = CapabilityOracle::new();

        let err = conform(&catalog(), &pipeline, &oracle, &ConformOptions::default()).unwrap_err();
        assert!(matches!(err, ConformError::Toolchain { .. }));
    }
}
