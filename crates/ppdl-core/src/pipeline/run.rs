//! One full run: list the person's assets and fetch each on the worker pool.

use super::{dispatch, DispatchError, RunStats, RunSummary};
use crate::api::{AssetSource, SearchApi};
use crate::config::Settings;
use crate::fetcher::{AssetFetcher, FetchOutcome};
use crate::lister::{AssetLister, ListError};

/// Lists every matching asset and fetches it with `settings.threads` workers.
///
/// `on_outcome` is called from worker threads for every successful outcome
/// (used by the CLI to print dry-run paths). Per-asset failures are logged
/// and counted; only a listing failure or a worker crash is returned as an error.
pub fn run_fetch<A, F>(settings: &Settings, api: &A, on_outcome: F) -> Result<RunSummary, DispatchError<ListError>>
where
    A: SearchApi + AssetSource + Sync + ?Sized,
    F: Fn(&FetchOutcome) + Sync,
{
    let fetcher = AssetFetcher::from_settings(api, settings);
    let stats = RunStats::default();
    let lister = AssetLister::for_settings(api, settings);

    let report = dispatch(settings.threads, lister, |worker, asset| {
        let path = fetcher.destination(&asset);
        match fetcher.fetch_to(&asset, path.clone()) {
            Ok(outcome) => {
                match &outcome {
                    FetchOutcome::Skipped(p) => {
                        tracing::debug!(worker, "skip existing {}", p.display());
                    }
                    FetchOutcome::DryRun(p) => {
                        tracing::debug!(worker, "would save to {}", p.display());
                    }
                    FetchOutcome::Saved { path, bytes } => {
                        tracing::info!(worker, bytes, "save to {}", path.display());
                    }
                }
                stats.record(&outcome);
                on_outcome(&outcome);
            }
            Err(e) => {
                tracing::error!(
                    worker,
                    "failed to download {} ({}): {}",
                    path.display(),
                    asset.id,
                    e
                );
                stats.record_failure();
            }
        }
    })?;

    let summary = stats.snapshot();
    tracing::info!(workers = report.workers, "All done: {}", summary);
    Ok(summary)
}
