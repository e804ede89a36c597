//! The conformance matrix and its execution.

use std::time::Instant;

use rayon::prelude::*;

use crate::builder::{generate, Capability, CapabilityOracle, CompileError, CompilerPipeline};
use crate::catalog::BindingCatalog;
use crate::core::{HeaderSet, SkipList, StructureDescriptor};

use super::types::{ConformError, EntryResult, SkipReason, Verdict};

/// One structure to check and the headers that declare it.
#[derive(Debug, Clone)]
pub struct MatrixEntry {
    pub headers: HeaderSet,
    pub descriptor: StructureDescriptor,
}

impl MatrixEntry {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

/// Every check of a catalog, built ahead of time.
///
/// Building the matrix resolves every descriptor but compiles nothing.
#[derive(Debug, Clone, Default)]
pub struct ConformanceMatrix {
    entries: Vec<MatrixEntry>,
}

impl ConformanceMatrix {
    /// Build the matrix for all checks of a catalog.
    ///
    /// Checks whose structure is undefined or cannot be resolved into a
    /// descriptor are left out; the completeness check reports them.
    pub fn build(catalog: &BindingCatalog) -> Self {
        let mut entries = Vec::with_capacity(catalog.checks.len());

        for check in &catalog.checks {
            match catalog.descriptor(&check.structure) {
                Ok(descriptor) => entries.push(MatrixEntry {
                    headers: check.headers.clone(),
                    descriptor,
                }),
                Err(e) => tracing::warn!("Leaving `{}` out of the matrix: {}", check.structure, e),
            }
        }

        ConformanceMatrix { entries }
    }

    /// Keep only the named structures, in matrix order.
    pub fn select(self, names: &[String]) -> Result<Self, ConformError> {
        if names.is_empty() {
            return Ok(self);
        }

        if let Some(missing) = names
            .iter()
            .find(|n| !self.entries.iter().any(|e| e.name() == n.as_str()))
        {
            return Err(ConformError::NotInMatrix(missing.clone()));
        }

        let entries = self
            .entries
            .into_iter()
            .filter(|e| names.iter().any(|n| n == e.name()))
            .collect();
        Ok(ConformanceMatrix { entries })
    }

    pub fn entries(&self) -> &[MatrixEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&MatrixEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared state for running matrix entries.
#[derive(Debug, Clone, Copy)]
pub struct CheckContext<'a> {
    pub pipeline: &'a CompilerPipeline,
    pub oracle: &'a CapabilityOracle,
    pub skip_list: &'a SkipList,
}

/// Run one matrix entry.
///
/// The structure gate runs before the header gate so that a structure known
/// to be unsupported never reaches the compiler. Only a toolchain failure is
/// an error; everything else is a verdict.
pub fn run_entry(entry: &MatrixEntry, ctx: &CheckContext<'_>) -> Result<EntryResult, ConformError> {
    let start = Instant::now();
    let name = entry.name();

    let verdict = match gate(entry, ctx)? {
        Some(reason) => {
            tracing::debug!("Skipping {}: {}", name, reason);
            Verdict::Skip { reason }
        }
        None => {
            let unit = generate(&entry.descriptor, &entry.headers, ctx.skip_list);
            match ctx.pipeline.compile(&unit.source) {
                Ok(()) => Verdict::Pass,
                Err(e @ CompileError::Failed { .. }) => {
                    let mismatches = e.mismatches();
                    tracing::debug!("{} failed with {} mismatch(es)", name, mismatches.len());
                    Verdict::Fail {
                        mismatches,
                        diagnostics: e.diagnostics().unwrap_or_default().to_string(),
                    }
                }
                Err(source) => return Err(toolchain_failure(name, source)),
            }
        }
    };

    Ok(EntryResult {
        structure: name.to_string(),
        headers: entry.headers.clone(),
        verdict,
        duration: start.elapsed(),
    })
}

fn gate(entry: &MatrixEntry, ctx: &CheckContext<'_>) -> Result<Option<SkipReason>, ConformError> {
    let name = entry.name();

    if !ctx.oracle.admits_struct(name) {
        let reason = match ctx.oracle.supports_struct(name) {
            Capability::Unknown => SkipReason::StructureUnknown,
            _ => SkipReason::StructureUnsupported,
        };
        return Ok(Some(reason));
    }

    let headers_ok = ctx
        .oracle
        .supports_headers(&entry.headers, ctx.pipeline)
        .map_err(|source| toolchain_failure(name, source))?;
    if !headers_ok {
        return Ok(Some(SkipReason::HeadersUnsupported));
    }

    Ok(None)
}

fn toolchain_failure(structure: &str, source: CompileError) -> ConformError {
    ConformError::Toolchain {
        structure: structure.to_string(),
        source,
    }
}

/// Run every entry of the matrix in parallel.
///
/// Results keep matrix order. The first toolchain failure aborts the run.
pub fn run_matrix(
    matrix: &ConformanceMatrix,
    ctx: &CheckContext<'_>,
    jobs: Option<usize>,
) -> Result<Vec<EntryResult>, ConformError> {
    tracing::info!("Checking {} structures", matrix.len());

    with_jobs(jobs, || {
        matrix
            .entries()
            .par_iter()
            .map(|entry| run_entry(entry, ctx))
            .collect()
    })?
}

/// Run `op` on a pool of `jobs` threads, or on the default pool.
fn with_jobs<R, F>(jobs: Option<usize>, op: F) -> Result<R, ConformError>
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    match jobs {
        Some(j) => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(j).build()?;
            Ok(pool.install(op))
        }
        None => Ok(op()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::compile::tests::ScriptToolchain;
    use crate::catalog::{CheckSpec, DefinitionKind, StructureDefinition};
    use crate::core::{ElementType, RawField};

    fn catalog() -> BindingCatalog {
        let field = |name: &str, offset| RawField {
            name: name.to_string(),
            offset,
            element: ElementType::new("int32_t", 4),
            count: 1,
        };
        let mut catalog = BindingCatalog {
            name: "test".to_string(),
            ..Default::default()
        };
        for name in ["linger", "ucred"] {
            catalog.definitions.push(StructureDefinition {
                name: name.to_string(),
                public: true,
                kind: DefinitionKind::Struct,
                fields: vec![field("_a", 0), field("_b", 4)],
                size: 8,
            });
            catalog.checks.push(CheckSpec::new("sys/socket.h", name));
        }
        catalog
    }

    fn pipeline(script: &str) -> CompilerPipeline {
        CompilerPipeline::new(Box::new(ScriptToolchain::new(script)))
    }

    #[test]
    fn test_build_matrix() {
        let matrix = ConformanceMatrix::build(&catalog());
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix.entries()[0].name(), "linger");
        assert_eq!(matrix.get("ucred").unwrap().descriptor.native_name(), "struct ucred");
    }

    #[test]
    fn test_build_matrix_unknown_structure() {
        let mut catalog = catalog();
        catalog.checks.push(CheckSpec::new("sys/uio.h", "iovec"));
        let matrix = ConformanceMatrix::build(&catalog);
        assert_eq!(matrix.len(), 2);
        assert!(matrix.get("iovec").is_none());
    }

    #[test]
    fn test_build_matrix_skips_invalid_definition() {
        let mut catalog = catalog();
        catalog.definitions[0].fields[1].name = "<a>k__BackingField".to_string();

        let matrix = ConformanceMatrix::build(&catalog);
        assert_eq!(matrix.len(), 1);
        assert!(matrix.get("linger").is_none());
        assert!(matrix.get("ucred").is_some());
    }

    #[test]
    fn test_select() {
        let matrix = ConformanceMatrix::build(&catalog());
        let selected = matrix.clone().select(&["ucred".to_string()]).unwrap();
        assert_eq!(selected.len(), 1);

        assert!(matches!(
            matrix.select(&["iovec".to_string()]),
            Err(ConformError::NotInMatrix(name)) if name == "iovec"
        ));
    }

    #[test]
    fn test_run_entry_pass() {
        let matrix = ConformanceMatrix::build(&catalog());
        let pipeline = pipeline("exit 0");
        let oracle = CapabilityOracle::new();
        let skip_list = SkipList::new();
        let ctx = CheckContext {
            pipeline: &pipeline,
            oracle: &oracle,
            skip_list: &skip_list,
        };

        let result = run_entry(&matrix.entries()[0], &ctx).unwrap();
        assert_eq!(result.verdict, Verdict::Pass);
    }

    #[test]
    fn test_unsupported_struct_never_compiles() {
        let matrix = ConformanceMatrix::build(&catalog());
        // Any compile would be a toolchain failure.
        let pipeline = CompilerPipeline::new(Box::new(ScriptToolchain::missing()));
        let oracle = CapabilityOracle::new().with_struct("ucred", false);
        let skip_list = SkipList::new();
        let ctx = CheckContext {
            pipeline: &pipeline,
            oracle: &oracle,
            skip_list: &skip_list,
        };

        let result = run_entry(matrix.get("ucred").unwrap(), &ctx).unwrap();
        assert_eq!(
            result.verdict,
            Verdict::Skip {
                reason: SkipReason::StructureUnsupported
            }
        );
    }

    #[test]
    fn test_unsupported_headers_skip() {
        let matrix = ConformanceMatrix::build(&catalog());
        let pipeline = pipeline("exit 0");
        let oracle = CapabilityOracle::new().with_header("sys/socket.h", false);
        let skip_list = SkipList::new();
        let ctx = CheckContext {
            pipeline: &pipeline,
            oracle: &oracle,
            skip_list: &skip_list,
        };

        let result = run_entry(&matrix.entries()[0], &ctx).unwrap();
        assert_eq!(
            result.verdict,
            Verdict::Skip {
                reason: SkipReason::HeadersUnsupported
            }
        );
    }

    #[test]
    fn test_run_entry_mismatch() {
        let matrix = ConformanceMatrix::build(&catalog());
        // Headers probe fine; the assertion unit echoes its size assertion.
        let pipeline = pipeline("grep -q _Static_assert \"$1\" || exit 0; grep 'linger.b' \"$1\" >&2; exit 1");
        let oracle = CapabilityOracle::new();
        let skip_list = SkipList::new();
        let ctx = CheckContext {
            pipeline: &pipeline,
            oracle: &oracle,
            skip_list: &skip_list,
        };

        let result = run_entry(&matrix.entries()[0], &ctx).unwrap();
        match result.verdict {
            Verdict::Fail { mismatches, .. } => {
                let fields: Vec<_> = mismatches.iter().map(|m| m.kind.as_str()).collect();
                assert_eq!(fields, vec!["offset", "size"]);
                assert!(mismatches.iter().all(|m| m.field == "b"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_run_matrix_toolchain_failure_aborts() {
        let matrix = ConformanceMatrix::build(&catalog());
        let pipeline = CompilerPipeline::new(Box::new(ScriptToolchain::missing()));
        let oracle = CapabilityOracle::new();
        let skip_list = SkipList::new();
        let ctx = CheckContext {
            pipeline: &pipeline,
            oracle: &oracle,
            skip_list: &skip_list,
        };

        let err = run_matrix(&matrix, &ctx, None).unwrap_err();
        assert!(matches!(err, ConformError::Toolchain { .. }));
    }

    #[test]
    fn test_jobs_apply_per_run() {
        assert_eq!(with_jobs(Some(3), rayon::current_num_threads).unwrap(), 3);
        assert_eq!(with_jobs(Some(1), rayon::current_num_threads).unwrap(), 1);
    }

    #[test]
    fn test_run_matrix_keeps_order() {
        let matrix = ConformanceMatrix::build(&catalog());
        let pipeline = pipeline("exit 0");
        let oracle = CapabilityOracle::new();
        let skip_list = SkipList::new();
        let ctx = CheckContext {
            pipeline: &pipeline,
            oracle: &oracle,
            skip_list: &skip_list,
        };

        for jobs in [None, Some(1), Some(4)] {
            let results = run_matrix(&matrix, &ctx, jobs).unwrap();
            let names: Vec<_> = results.iter().map(|r| r.structure.as_str()).collect();
            assert_eq!(names, vec!["linger", "ucred"]);
        }
    }
}
