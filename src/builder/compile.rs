//! Compile-only pipeline for generated assertion units.
//!
//! Each compile gets a private scratch directory holding the source and the
//! object file. The directory is removed when the compile returns, whatever
//! the outcome. Compiled objects are never linked or executed, so checks work
//! the same when cross-compiling.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::mismatch::parse_mismatches;
use crate::core::{HeaderSet, LayoutMismatch};
use crate::util::config::ToolchainSettings;
use crate::util::process::ProcessBuilder;

use super::source::probe_source;
use super::toolchain::{CompileInput, TargetOptions, Toolchain};

/// Errors from compiling a generated unit.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The compiler could not be run at all.
    #[error("failed to invoke the C compiler: {reason}")]
    Toolchain { command: String, reason: String },

    /// Scratch files could not be created.
    #[error("failed to prepare scratch files: {0}")]
    Scratch(#[from] std::io::Error),

    /// The compiler ran and rejected the unit.
    #[error("compilation failed")]
    Failed { diagnostics: String },
}

impl CompileError {
    /// Whether the error invalidates every other compile in the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, CompileError::Failed { .. })
    }

    /// Compiler output, for failed compiles.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            CompileError::Failed { diagnostics } => Some(diagnostics),
            _ => None,
        }
    }

    /// Layout mismatches named by failed static assertions.
    pub fn mismatches(&self) -> Vec<LayoutMismatch> {
        self.diagnostics().map(parse_mismatches).unwrap_or_default()
    }
}

/// Answers whether a set of headers can be included.
pub trait HeaderProbe: Sync {
    /// `Ok(false)` when the headers fail to compile; `Err` only for errors
    /// that make compiling impossible.
    fn probe_headers(&self, headers: &HeaderSet) -> Result<bool, CompileError>;
}

/// Compiles C sources with a fixed toolchain and settings.
#[derive(Debug)]
pub struct CompilerPipeline {
    toolchain: Box<dyn Toolchain>,
    target: TargetOptions,
    include_dirs: Vec<PathBuf>,
    cflags: Vec<String>,
}

impl CompilerPipeline {
    pub fn new(toolchain: Box<dyn Toolchain>) -> Self {
        CompilerPipeline {
            toolchain,
            target: TargetOptions::default(),
            include_dirs: Vec::new(),
            cflags: Vec::new(),
        }
    }

    /// Build a pipeline from configured settings.
    ///
    /// Flags from the `CFLAGS` environment variable are appended after the
    /// configured ones.
    pub fn from_settings(toolchain: Box<dyn Toolchain>, settings: &ToolchainSettings) -> Self {
        let mut cflags = settings.cflags.clone();
        if let Ok(env_flags) = std::env::var("CFLAGS") {
            cflags.extend(env_flags.split_whitespace().map(str::to_string));
        }

        CompilerPipeline::new(toolchain)
            .with_target(TargetOptions {
                triple: settings.target.clone(),
                sysroot: settings.sysroot.clone(),
            })
            .with_include_dirs(settings.include_dirs.clone())
            .with_cflags(cflags)
    }

    pub fn with_target(mut self, target: TargetOptions) -> Self {
        self.target = target;
        self
    }

    pub fn with_include_dirs(mut self, include_dirs: Vec<PathBuf>) -> Self {
        self.include_dirs = include_dirs;
        self
    }

    pub fn with_cflags(mut self, cflags: Vec<String>) -> Self {
        self.cflags = cflags;
        self
    }

    pub fn toolchain(&self) -> &dyn Toolchain {
        self.toolchain.as_ref()
    }

    pub fn target(&self) -> &TargetOptions {
        &self.target
    }

    /// Compile `source` to an object file and discard the result.
    pub fn compile(&self, source: &str) -> Result<(), CompileError> {
        let scratch = tempfile::Builder::new()
            .prefix("abi-conform-")
            .tempdir()?;

        let src = scratch.path().join("check.c");
        let obj = scratch
            .path()
            .join(format!("check.{}", self.toolchain.object_extension()));
        std::fs::write(&src, source)?;

        let input = CompileInput {
            source: src,
            output: obj,
            include_dirs: self.include_dirs.clone(),
            cflags: self.cflags.clone(),
        };
        let spec = self
            .toolchain
            .compile_command(&input, &self.target)
            .env("LC_ALL", "C");
        let process = ProcessBuilder::from_spec(&spec);

        tracing::debug!("Compiling: {}", process.display_command());

        let output = process.exec().map_err(|e| CompileError::Toolchain {
            command: process.display_command(),
            reason: format!("{:#}", e),
        })?;

        if output.status.success() {
            return Ok(());
        }

        let mut diagnostics = String::from_utf8_lossy(&output.stderr).into_owned();
        diagnostics.push_str(&String::from_utf8_lossy(&output.stdout));
        tracing::debug!(
            "Compiler exited with {:?}: {}",
            output.status.code(),
            diagnostics.trim_end()
        );

        Err(CompileError::Failed { diagnostics })
    }
}

impl HeaderProbe for CompilerPipeline {
    fn probe_headers(&self, headers: &HeaderSet) -> Result<bool, CompileError> {
        match self.compile(&probe_source(headers)) {
            Ok(()) => Ok(true),
            Err(CompileError::Failed { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
