//! `abi-conform source` command

use anyhow::{Context, Result};

use crate::cli::SourceArgs;
use abi_conform::builder::generate;
use abi_conform::ops::conform::ConformanceMatrix;

use super::load_catalog;

pub fn execute(args: SourceArgs) -> Result<()> {
    let catalog = load_catalog(args.catalog.catalog.as_deref())?;
    if catalog.check(&args.structure).is_some() {
        // Surface why a checked structure has no matrix entry.
        catalog.descriptor(&args.structure)?;
    }

    let matrix = ConformanceMatrix::build(&catalog);
    let entry = matrix
        .get(&args.structure)
        .with_context(|| format!("`{}` is not in the conformance matrix", args.structure))?;

    let unit = generate(&entry.descriptor, &entry.headers, &catalog.skip_list);
    print!("{}", unit.source);

    Ok(())
}
