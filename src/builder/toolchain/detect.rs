//! Toolchain detection functions.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::util::config::ToolchainSettings;

use super::{GccToolchain, Toolchain, ToolchainPlatform};

/// Detect the toolchain, honouring explicit settings first.
///
/// Priority:
/// 1. `cc` from the given settings
/// 2. `CC` environment variable
/// 3. `cc`, `gcc` or `clang` on PATH
pub fn detect_toolchain_with(settings: &ToolchainSettings) -> Result<Box<dyn Toolchain>> {
    if let Some(toolchain) = try_detect_from_settings(settings)? {
        return Ok(toolchain);
    }

    if let Some(toolchain) = try_detect_gcc()? {
        return Ok(toolchain);
    }

    bail!(
        "no C compiler found\n\
         \n\
         Conformance checks require a C compiler (gcc or clang).\n\
         Set the CC environment variable, set `cc` in .abi-conform/toolchain.toml,\n\
         or install a compiler."
    )
}

/// Try to create a toolchain from config file settings.
fn try_detect_from_settings(settings: &ToolchainSettings) -> Result<Option<Box<dyn Toolchain>>> {
    let cc = match &settings.cc {
        Some(cc) => match resolve_program(cc) {
            Some(path) => path,
            None => {
                tracing::warn!("Configured C compiler not found: {}", cc.display());
                return Ok(None);
            }
        },
        None => return Ok(None),
    };

    let family = detect_compiler_family(&cc)?;

    tracing::info!("Using toolchain from config: cc={}", cc.display());

    Ok(Some(Box::new(GccToolchain::new(cc, family))))
}

/// Try to detect GCC/Clang toolchain.
fn try_detect_gcc() -> Result<Option<Box<dyn Toolchain>>> {
    use which::which;

    // Try CC environment variable first
    let cc = if let Ok(cc_env) = std::env::var("CC") {
        match resolve_program(Path::new(&cc_env)) {
            Some(path) => path,
            None => {
                tracing::warn!("CC is set to `{}` but it cannot be found", cc_env);
                return Ok(None);
            }
        }
    } else {
        // Try common compiler names
        match which("cc")
            .or_else(|_| which("gcc"))
            .or_else(|_| which("clang"))
        {
            Ok(p) => p,
            Err(_) => return Ok(None),
        }
    };

    let family = detect_compiler_family(&cc)?;
    tracing::debug!("Detected {} at {}", family.as_str(), cc.display());

    Ok(Some(Box::new(GccToolchain::new(cc, family))))
}

/// Resolve a program that may be a bare name on PATH or a path.
fn resolve_program(program: &Path) -> Option<PathBuf> {
    if program.components().count() > 1 {
        program.exists().then(|| program.to_path_buf())
    } else {
        which::which(program).ok()
    }
}

/// Detect whether the compiler is GCC, Clang, or Apple Clang.
pub fn detect_compiler_family(cc: &Path) -> Result<ToolchainPlatform> {
    // Check binary name first
    let name = cc
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_lowercase();

    if name.contains("clang") {
        // Could be Apple Clang or regular Clang
        return detect_clang_variant(cc);
    } else if name.contains("gcc") {
        return Ok(ToolchainPlatform::Gcc);
    }

    // Try to detect from --version output
    let output = std::process::Command::new(cc).arg("--version").output();

    if let Ok(output) = output {
        let stdout = String::from_utf8_lossy(&output.stdout).to_lowercase();
        if stdout.contains("clang") {
            return detect_clang_variant(cc);
        } else if stdout.contains("gcc") {
            return Ok(ToolchainPlatform::Gcc);
        }
    }

    // Default to GCC
    Ok(ToolchainPlatform::Gcc)
}

/// Detect if Clang is Apple Clang or regular Clang.
fn detect_clang_variant(cc: &Path) -> Result<ToolchainPlatform> {
    let output = std::process::Command::new(cc).arg("--version").output();

    if let Ok(output) = output {
        let stdout = String::from_utf8_lossy(&output.stdout).to_lowercase();
        if stdout.contains("apple") {
            return Ok(ToolchainPlatform::AppleClang);
        }
    }

    Ok(ToolchainPlatform::Clang)
}
