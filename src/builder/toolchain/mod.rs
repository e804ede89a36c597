//! Toolchain abstraction for the native C compiler.
//!
//! Conformance checks only ever compile; nothing is linked or executed, so
//! a toolchain just needs to produce a compile-only command.
//!
//! Toolchain detection priority:
//! 1. Toolchain config file (`.abi-conform/toolchain.toml` or `~/.abi-conform/toolchain.toml`)
//! 2. `CC` environment variable
//! 3. Auto-detection (searching PATH for common compilers)

use std::path::{Path, PathBuf};

mod detect;
mod gcc;

pub use detect::{detect_compiler_family, detect_toolchain_with};
pub use gcc::GccToolchain;

/// A command to execute, with program, arguments, and environment.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// The program to run (e.g., "gcc")
    pub program: PathBuf,
    /// Command arguments
    pub args: Vec<String>,
    /// Environment variables to set
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// Add an environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

/// Input for a compile-only step.
#[derive(Debug, Clone, Default)]
pub struct CompileInput {
    /// Source file to compile
    pub source: PathBuf,
    /// Output object file
    pub output: PathBuf,
    /// Include directories
    pub include_dirs: Vec<PathBuf>,
    /// Additional compiler flags
    pub cflags: Vec<String>,
}

/// Cross-compilation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetOptions {
    /// Target triple (Clang `--target`)
    pub triple: Option<String>,
    /// Sysroot holding the target's headers
    pub sysroot: Option<PathBuf>,
}

/// The family of a toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolchainPlatform {
    /// GCC (GNU Compiler Collection)
    Gcc,
    /// Clang/LLVM
    Clang,
    /// Apple Clang (macOS)
    AppleClang,
}

impl ToolchainPlatform {
    /// Get the platform name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolchainPlatform::Gcc => "gcc",
            ToolchainPlatform::Clang => "clang",
            ToolchainPlatform::AppleClang => "apple-clang",
        }
    }

    /// Whether the compiler accepts `--target=<triple>`.
    pub fn supports_target_flag(&self) -> bool {
        matches!(self, ToolchainPlatform::Clang | ToolchainPlatform::AppleClang)
    }
}

/// Trait for toolchain implementations.
pub trait Toolchain: Send + Sync {
    /// Get the toolchain platform.
    fn platform(&self) -> ToolchainPlatform;

    /// Get the C compiler path.
    fn compiler_path(&self) -> &Path;

    /// Generate a compile-only (no link) command.
    fn compile_command(&self, input: &CompileInput, target: &TargetOptions) -> CommandSpec;

    /// Get the object file extension.
    fn object_extension(&self) -> &str;
}

impl std::fmt::Debug for dyn Toolchain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolchain")
            .field("platform", &self.platform())
            .field("compiler", &self.compiler_path())
            .finish()
    }
}
