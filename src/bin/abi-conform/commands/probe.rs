//! `abi-conform probe` command

use anyhow::Result;

use crate::cli::ProbeArgs;
use abi_conform::builder::{Capability, CapabilityOracle};
use abi_conform::core::HeaderSet;
use abi_conform::util::config::load_project_config;

use super::{build_pipeline, settings_with_target};

pub fn execute(args: ProbeArgs) -> Result<()> {
    let config = load_project_config()?;
    let settings = settings_with_target(config.toolchain.toolchain, args.target);
    let pipeline = build_pipeline(&settings)?;
    let oracle = CapabilityOracle::from_config(&config.capabilities);

    // Each header is probed after the supported headers before it.
    let mut included = HeaderSet::default();
    for header in HeaderSet::new(args.headers).iter() {
        let mut headers = included.clone();
        headers.push(header);

        let supported = oracle.supports_headers(&headers, &pipeline)?;
        println!("  <{}>: {}", header, Capability::from(supported));

        if supported {
            included = headers;
        }
    }

    Ok(())
}
