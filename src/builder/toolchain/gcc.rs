//! GCC/Clang toolchain implementation.

use std::path::{Path, PathBuf};

use super::{CommandSpec, CompileInput, TargetOptions, Toolchain, ToolchainPlatform};

/// GCC/Clang toolchain (Unix-like systems).
#[derive(Debug, Clone)]
pub struct GccToolchain {
    /// Path to the C compiler
    pub cc: PathBuf,
    /// Compiler family (gcc, clang, apple-clang)
    pub family: ToolchainPlatform,
}

impl GccToolchain {
    /// Create a new GCC-style toolchain.
    pub fn new(cc: PathBuf, family: ToolchainPlatform) -> Self {
        GccToolchain { cc, family }
    }
}

impl Toolchain for GccToolchain {
    fn platform(&self) -> ToolchainPlatform {
        self.family
    }

    fn compiler_path(&self) -> &Path {
        &self.cc
    }

    fn compile_command(&self, input: &CompileInput, target: &TargetOptions) -> CommandSpec {
        let mut cmd = CommandSpec::new(&self.cc);

        // Compile only
        cmd = cmd.arg("-c");

        // Cross target
        if let Some(ref triple) = target.triple {
            if self.family.supports_target_flag() {
                cmd = cmd.arg(format!("--target={}", triple));
            } else {
                tracing::debug!(
                    "{} does not accept --target, relying on the compiler's default target",
                    self.family.as_str()
                );
            }
        }
        if let Some(ref sysroot) = target.sysroot {
            cmd = cmd.arg(format!("--sysroot={}", sysroot.display()));
        }

        // Include directories
        for dir in &input.include_dirs {
            cmd = cmd.arg(format!("-I{}", dir.display()));
        }

        // Custom flags
        cmd = cmd.args(input.cflags.iter().cloned());

        // Input and output
        cmd = cmd.arg(input.source.display().to_string());
        cmd = cmd.arg("-o");
        cmd = cmd.arg(input.output.display().to_string());

        cmd
    }

    fn object_extension(&self) -> &str {
        "o"
    }
}
