//! `abi-conform toolchain` command

use anyhow::Result;

use crate::cli::ToolchainArgs;
use abi_conform::util::config::{global_config_dir, load_project_config, project_config_dir};

use super::{build_pipeline, settings_with_target};

pub fn execute(args: ToolchainArgs) -> Result<()> {
    let config = load_project_config()?;
    let settings = settings_with_target(config.toolchain.toolchain, args.target);
    let pipeline = build_pipeline(&settings)?;
    let toolchain = pipeline.toolchain();

    println!("Toolchain:");
    println!();
    println!("  CC:      {}", toolchain.compiler_path().display());
    println!("  Family:  {}", toolchain.platform().as_str());

    // Try to get version
    let output = std::process::Command::new(toolchain.compiler_path())
        .arg("--version")
        .output();
    if let Ok(output) = output {
        let stdout = String::from_utf8_lossy(&output.stdout);
        if let Some(first_line) = stdout.lines().next() {
            println!("           {}", first_line.trim());
        }
    }

    println!();
    match &settings.target {
        Some(target) => println!("  Target:  {}", target),
        None => println!("  Target:  host"),
    }
    if let Some(sysroot) = &settings.sysroot {
        println!("  Sysroot: {}", sysroot.display());
    }
    for dir in &settings.include_dirs {
        println!("  Include: {}", dir.display());
    }
    if !settings.cflags.is_empty() {
        println!("  CFLAGS:  {}", settings.cflags.join(" "));
    }

    println!();

    // Configuration locations
    println!("Config:");
    if let Some(dir) = global_config_dir() {
        println!("  Global:  {}", dir.display());
    }
    let cwd = std::env::current_dir()?;
    println!("  Project: {}", project_config_dir(&cwd).display());

    println!();

    // Environment variables
    println!("Environment:");
    if let Ok(cc) = std::env::var("CC") {
        println!("  CC={}", cc);
    }
    if let Ok(cflags) = std::env::var("CFLAGS") {
        println!("  CFLAGS={}", cflags);
    }

    Ok(())
}
