use super::{transient_cause, RetryPolicy};
use crate::transport::TransportError;

/// Call `attempt` until it succeeds, fails permanently, or the policy's
/// budget is spent. Sleeps between attempts.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, mut attempt: F) -> Result<T, TransportError>
where
    F: FnMut() -> Result<T, TransportError>,
{
    let mut failed = 0u32;
    loop {
        let err = match attempt() {
            Ok(v) => return Ok(v),
            Err(e) => e,
        };
        failed += 1;
        let Some(cause) = transient_cause(&err) else {
            return Err(err);
        };
        let Some(delay) = policy.delay_after(failed) else {
            return Err(err);
        };
        tracing::debug!(attempt = failed, ?cause, "{}; retrying in {:?}", err, delay);
        std::thread::sleep(delay);
    }
}
