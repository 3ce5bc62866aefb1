use crate::api::AssetDescriptor;

/// Queue element: work, or the signal that this worker should exit.
/// Exactly one `Shutdown` is enqueued per worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchJob<T = AssetDescriptor> {
    Job(T),
    Shutdown,
}
