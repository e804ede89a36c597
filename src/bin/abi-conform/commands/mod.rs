//! Command implementations

pub mod check;
pub mod list;
pub mod probe;
pub mod source;
pub mod toolchain;

use std::path::Path;

use anyhow::{Context, Result};

use abi_conform::builder::{detect_toolchain_with, CompilerPipeline};
use abi_conform::catalog::{file, linux, BindingCatalog};
use abi_conform::util::config::ToolchainSettings;

/// Load the catalog named on the command line, or the built-in one.
pub fn load_catalog(path: Option<&Path>) -> Result<BindingCatalog> {
    match path {
        Some(path) => file::load(path),
        None => Ok(linux::catalog()),
    }
}

/// Toolchain settings from config, with a target from the command line.
pub fn settings_with_target(mut settings: ToolchainSettings, target: Option<String>) -> ToolchainSettings {
    if target.is_some() {
        settings.target = target;
    }
    settings
}

/// Detect the compiler and build the pipeline for conformance compiles.
pub fn build_pipeline(settings: &ToolchainSettings) -> Result<CompilerPipeline> {
    let toolchain = detect_toolchain_with(settings).context("failed to detect a C toolchain")?;
    Ok(CompilerPipeline::from_settings(toolchain, settings))
}
