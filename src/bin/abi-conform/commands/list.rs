//! `abi-conform list` command

use anyhow::Result;

use crate::cli::ListArgs;

use super::load_catalog;

pub fn execute(args: ListArgs) -> Result<()> {
    let catalog = load_catalog(args.catalog.catalog.as_deref())?;

    let width = catalog
        .checks
        .iter()
        .map(|c| c.structure.len())
        .max()
        .unwrap_or(0);

    for check in &catalog.checks {
        println!("{:<width$}  {}", check.structure, check.headers, width = width);
    }

    if !catalog.unchecked.is_empty() {
        println!();
        println!(
            "Unchecked: {}",
            catalog.unchecked.iter().cloned().collect::<Vec<_>>().join(", ")
        );
    }

    Ok(())
}
