//! Transport error type, kept typed so the retry layer can classify it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    /// Curl reported an error before any body byte reached the caller.
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// Non-2xx response. No body bytes are delivered for these.
    #[error("HTTP {0}")]
    Status(u32),
    /// The transfer broke after `delivered` body bytes were handed to the sink.
    #[error("transfer interrupted after {delivered} bytes: {source}")]
    Interrupted {
        delivered: u64,
        #[source]
        source: curl::Error,
    },
    /// The sink refused a chunk (disk full, permission denied, ...).
    #[error("write failed: {0}")]
    Sink(#[source] std::io::Error),
}

impl TransportError {
    /// For callers that buffer the body themselves: a broken transfer can be
    /// restarted from scratch, so it is classified like any curl failure.
    pub(crate) fn restartable(self) -> Self {
        match self {
            TransportError::Interrupted { source, .. } => TransportError::Curl(source),
            other => other,
        }
    }
}
