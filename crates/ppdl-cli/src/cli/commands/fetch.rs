//! `ppdl fetch` – download all of a person's photos.

use anyhow::{Context, Result};
use ppdl_core::config::Settings;
use ppdl_core::fetcher::FetchOutcome;
use ppdl_core::pipeline;
use ppdl_core::transport::ImmichClient;
use std::io::Write;

pub fn run_fetch(settings: &Settings) -> Result<()> {
    let save_to = std::path::absolute(&settings.save_to)
        .with_context(|| format!("cannot resolve {}", settings.save_to.display()))?;
    tracing::info!("download person {} to {}", settings.person_id, save_to.display());
    if settings.dry {
        tracing::warn!("dry mode enabled, nothing will be downloaded");
    }

    let client = ImmichClient::new(settings);
    let stdout = std::io::stdout();
    let summary = pipeline::run_fetch(settings, &client, |outcome| {
        if let FetchOutcome::DryRun(path) = outcome {
            // Stdout is line-locked; a closed pipe just loses the listing.
            let _ = writeln!(stdout.lock(), "{}", path.display());
        }
    })
    .context("fetch aborted")?;

    if summary.failed > 0 {
        tracing::warn!("{} photo(s) failed, rerun to retry them", summary.failed);
    }
    Ok(())
}
