//! Per-run outcome counters shared by all workers.

use crate::fetcher::FetchOutcome;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RunStats {
    saved: AtomicU64,
    skipped: AtomicU64,
    dry_run: AtomicU64,
    failed: AtomicU64,
    bytes: AtomicU64,
}

impl RunStats {
    pub fn record(&self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Skipped(_) => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
            }
            FetchOutcome::DryRun(_) => {
                self.dry_run.fetch_add(1, Ordering::Relaxed);
            }
            FetchOutcome::Saved { bytes, .. } => {
                self.saved.fetch_add(1, Ordering::Relaxed);
                self.bytes.fetch_add(*bytes, Ordering::Relaxed);
            }
        }
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RunSummary {
        RunSummary {
            saved: self.saved.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            dry_run: self.dry_run.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
        }
    }
}

/// Totals for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub saved: u64,
    pub skipped: u64,
    pub dry_run: u64,
    pub failed: u64,
    /// Bytes written for saved assets.
    pub bytes: u64,
}

impl RunSummary {
    pub fn processed(&self) -> u64 {
        self.saved + self.skipped + self.dry_run + self.failed
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} saved ({:.1} MiB), {} skipped, {} failed",
            self.saved,
            self.bytes as f64 / 1_048_576.0,
            self.skipped,
            self.failed
        )?;
        if self.dry_run > 0 {
            write!(f, ", {} listed (dry run)", self.dry_run)?;
        }
        Ok(())
    }
}
