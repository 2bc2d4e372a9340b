use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use yawo_core::{Fetcher, SourceCatalog};

/// Load the source catalogs and print the icon for `source_id`.
pub fn run(source_id: &str, timeout_secs: u64) -> Result<()> {
    let catalog = Arc::new(SourceCatalog::new());
    catalog.spawn_load(Arc::new(Fetcher::new()));

    if !catalog.wait_loaded(Duration::from_secs(timeout_secs)) {
        bail!("Source catalogs did not load within {}s", timeout_secs);
    }

    match catalog.lookup(source_id)? {
        Some((kind, entry)) => {
            let name = entry.display_name("en-US").unwrap_or(source_id);
            println!("{} ({} catalog)", name, kind);
        }
        None => println!("{} is not in the catalogs, using the custom icon", source_id),
    }
    println!("{}", catalog.resolve(source_id)?);
    Ok(())
}
