//! Transport-level retry and backoff.
//!
//! Only request attempts are retried here (connection failures, timeouts,
//! throttling, 5xx) and only while no response body has been handed to the
//! caller. Whole-asset failures such as a checksum mismatch are never retried.

mod classify;
mod policy;
mod run;

pub use classify::{transient_cause, TransientCause};
pub use policy::RetryPolicy;
pub use run::run_with_retry;
