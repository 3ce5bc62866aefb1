//! Which transport failures are worth another attempt.

use crate::transport::TransportError;

/// Why a failed attempt may succeed if repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientCause {
    Timeout,
    /// Refused, reset, DNS, or the server closed without a response.
    Connection,
    /// 429 or 503.
    Throttled(u32),
    /// Any other 5xx.
    Server(u32),
}

/// `None` means the failure is permanent for this request: 4xx, sink
/// errors, and transfers that already delivered body bytes.
pub fn transient_cause(err: &TransportError) -> Option<TransientCause> {
    match err {
        TransportError::Status(code @ (429 | 503)) => Some(TransientCause::Throttled(*code)),
        TransportError::Status(code @ 500..=599) => Some(TransientCause::Server(*code)),
        TransportError::Status(_) => None,
        TransportError::Curl(e) if e.is_operation_timedout() => Some(TransientCause::Timeout),
        TransportError::Curl(e)
            if e.is_couldnt_connect()
                || e.is_couldnt_resolve_host()
                || e.is_recv_error()
                || e.is_send_error()
                || e.is_got_nothing()
                || e.is_partial_file() =>
        {
            Some(TransientCause::Connection)
        }
        TransportError::Curl(_) | TransportError::Interrupted { .. } | TransportError::Sink(_) => None,
    }
}
