//! Producer → bounded queue → fixed worker pool.
//!
//! [`dispatch`] spawns all workers before pulling the first item, feeds items
//! in source order through a queue that holds at most one pending item per
//! worker (the producer blocks when it is full), then sends one
//! [`FetchJob::Shutdown`] per worker and joins every worker before returning.
//! [`run_fetch`] wires the asset lister and fetcher into it.

mod job;
mod run;
mod stats;

pub use job::FetchJob;
pub use run::run_fetch;
pub use stats::{RunStats, RunSummary};

use crossbeam_channel::{bounded, Receiver};
use std::io;
use std::thread;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError<E>
where
    E: std::error::Error + 'static,
{
    /// The item source failed; queued items were still processed.
    #[error(transparent)]
    Source(E),
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] io::Error),
    #[error("{0} worker thread(s) panicked")]
    WorkerPanicked(usize),
}

/// What a finished dispatch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Workers spawned and joined.
    pub workers: usize,
    /// Items pulled from the source and enqueued.
    pub fed: usize,
    /// Items handed to the worker callback.
    pub processed: usize,
}

/// Run `handle(worker_index, item)` for every item of `source` on `workers` threads.
///
/// A source error stops feeding; workers still drain what is queued and shut
/// down before the error is returned.
pub fn dispatch<T, E, I, F>(workers: usize, source: I, handle: F) -> Result<DispatchReport, DispatchError<E>>
where
    T: Send,
    E: std::error::Error + 'static,
    I: IntoIterator<Item = Result<T, E>>,
    F: Fn(usize, T) + Sync,
{
    let workers = workers.max(1);
    let (tx, rx) = bounded::<FetchJob<T>>(workers);
    let handle = &handle;

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        let mut spawn_error = None;
        for id in 0..workers {
            let rx = rx.clone();
            let spawned = thread::Builder::new()
                .name(format!("fetch-{}", id))
                .spawn_scoped(scope, move || worker_loop(id, &rx, handle));
            match spawned {
                Ok(h) => handles.push(h),
                Err(e) => {
                    spawn_error = Some(e);
                    break;
                }
            }
        }
        drop(rx);

        let mut fed = 0usize;
        let mut source_error = None;
        if spawn_error.is_none() {
            for item in source {
                match item {
                    Ok(job) => {
                        // Fails only when every worker is gone.
                        if tx.send(FetchJob::Job(job)).is_err() {
                            break;
                        }
                        fed += 1;
                    }
                    Err(e) => {
                        source_error = Some(e);
                        break;
                    }
                }
            }
        }

        tracing::debug!(fed, "feeding done, shutting down {} worker(s)", handles.len());
        for _ in 0..handles.len() {
            if tx.send(FetchJob::Shutdown).is_err() {
                break;
            }
        }

        let mut processed = 0usize;
        let mut panicked = 0usize;
        for h in handles {
            match h.join() {
                Ok(n) => processed += n,
                Err(_) => panicked += 1,
            }
        }

        if panicked > 0 {
            tracing::error!("{} worker thread(s) panicked", panicked);
        }
        if let Some(e) = source_error {
            return Err(DispatchError::Source(e));
        }
        if let Some(e) = spawn_error {
            return Err(DispatchError::Spawn(e));
        }
        if panicked > 0 {
            return Err(DispatchError::WorkerPanicked(panicked));
        }
        Ok(DispatchReport {
            workers,
            fed,
            processed,
        })
    })
}

/// `Idle → Processing → Idle` until `Shutdown`. Returns the number of items handled.
fn worker_loop<T, F>(id: usize, rx: &Receiver<FetchJob<T>>, handle: &F) -> usize
where
    F: Fn(usize, T),
{
    tracing::debug!(worker = id, "worker started");
    let mut handled = 0usize;
    // A closed channel without a sentinel only happens if the producer is gone.
    while let Ok(job) = rx.recv() {
        match job {
            FetchJob::Job(item) => {
                handle(id, item);
                handled += 1;
            }
            FetchJob::Shutdown => break,
        }
    }
    tracing::debug!(worker = id, handled, "worker done");
    handled
}
