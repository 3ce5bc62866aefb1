//! `ppdl list` – show what `fetch` would consider, without touching the disk.

use anyhow::{Context, Result};
use ppdl_core::config::Settings;
use ppdl_core::lister::AssetLister;
use ppdl_core::resolver::destination_path;
use ppdl_core::transport::ImmichClient;
use std::io::{self, Write};

pub fn run_list(settings: &Settings) -> Result<()> {
    let client = ImmichClient::new(settings);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut count = 0usize;
    for asset in AssetLister::for_settings(&client, settings) {
        let asset = asset.context("listing failed")?;
        let path = destination_path(&settings.save_to, &asset);
        writeln!(out, "{}\t{}", asset.id, path.display())?;
        count += 1;
    }
    out.flush()?;
    tracing::info!("{} photo(s) listed", count);
    Ok(())
}
