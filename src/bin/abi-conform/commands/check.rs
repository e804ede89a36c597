//! `abi-conform check` command

use anyhow::{Context, Result};

use crate::cli::CheckArgs;
use abi_conform::builder::{CapabilityOracle, UnknownPolicy};
use abi_conform::ops::conform::{conform, format_report_for_output, ConformOptions, OutputFormat};
use abi_conform::util::config::load_project_config;

use super::{build_pipeline, load_catalog, settings_with_target};

pub fn execute(args: CheckArgs, verbose: bool) -> Result<()> {
    let format: OutputFormat = args
        .format
        .parse()
        .with_context(|| format!("invalid output format: {}", args.format))?;

    let config = load_project_config()?;
    let catalog = load_catalog(args.catalog.catalog.as_deref())?;

    let settings = settings_with_target(config.toolchain.toolchain, args.target);
    let pipeline = build_pipeline(&settings)?;

    let mut oracle = CapabilityOracle::from_config(&config.capabilities);
    if args.strict_unknown {
        oracle = oracle.with_unknown_policy(UnknownPolicy::Skip);
    }

    let options = ConformOptions {
        structures: args.structures,
        jobs: args.jobs,
    };
    let report = conform(&catalog, &pipeline, &oracle, &options)?;

    print!("{}", format_report_for_output(&report, format, verbose));

    // Exit with error code if any check failed
    if !report.passed {
        std::process::exit(1);
    }

    Ok(())
}
