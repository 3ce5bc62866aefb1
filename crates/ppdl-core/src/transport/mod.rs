//! HTTP transport to the Immich API.
//!
//! One [`ImmichClient`] is built per run and shared by reference with the
//! lister and every worker. It owns a pool of curl easy handles sized to
//! `threads + 1`, attaches the API key to every request, and retries failed
//! attempts per [`RetryPolicy`] while no body bytes have reached the caller.

mod error;
mod pool;

pub use error::TransportError;

use crate::config::Settings;
use crate::retry::{run_with_retry, RetryPolicy};
use curl::easy::{Easy, List};
use pool::HandlePool;
use std::io;
use std::time::Duration;

/// Header carrying the static API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Receives body chunks in order. Returning an error aborts the transfer.
pub type BodySink<'a> = dyn FnMut(&[u8]) -> io::Result<()> + 'a;

pub struct ImmichClient {
    base_url: String,
    api_key: String,
    pool: HandlePool,
    retry: RetryPolicy,
}

impl ImmichClient {
    /// Client for `settings.api_url` with a pool of `settings.pool_size()` handles.
    pub fn new(settings: &Settings) -> Self {
        Self::with_options(
            &settings.api_url,
            &settings.api_key,
            settings.pool_size(),
            RetryPolicy::default(),
        )
    }

    pub fn with_options(base_url: &str, api_key: &str, pool_size: usize, retry: RetryPolicy) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            pool: HandlePool::new(pool_size),
            retry,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn pool_size(&self) -> usize {
        self.pool.capacity()
    }

    /// POST a JSON body to `path` (relative to the base URL) and return the response body.
    pub fn post_json(&self, path: &str, body: &[u8]) -> Result<Vec<u8>, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        run_with_retry(&self.retry, || {
            let mut out = Vec::new();
            self.execute(&url, Some(body), "application/json", &mut |chunk: &[u8]| -> io::Result<()> {
                out.extend_from_slice(chunk);
                Ok(())
            })
            .map_err(TransportError::restartable)?;
            Ok(out)
        })
    }

    /// GET `path` and stream the body into `sink`. Returns the number of bytes delivered.
    pub fn get_streaming(&self, path: &str, sink: &mut BodySink<'_>) -> Result<u64, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        run_with_retry(&self.retry, || {
            self.execute(&url, None, "application/octet-stream", &mut *sink)
        })
    }

    fn configure(&self, easy: &mut Easy, url: &str, body: Option<&[u8]>, accept: &str) -> Result<(), curl::Error> {
        easy.reset();
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        // Report >= 400 as an error before any body bytes reach the write callback.
        easy.fail_on_error(true)?;
        easy.connect_timeout(Duration::from_secs(30))?;
        // Abort if throughput drops below 1 KiB/s for 60s; no hard wall-clock limit.
        easy.low_speed_limit(1024)?;
        easy.low_speed_time(Duration::from_secs(60))?;

        let mut list = List::new();
        list.append(&format!("{}: {}", API_KEY_HEADER, self.api_key))?;
        list.append(&format!("Accept: {}", accept))?;
        if let Some(body) = body {
            list.append("Content-Type: application/json")?;
            easy.post(true)?;
            easy.post_fields_copy(body)?;
        }
        easy.http_headers(list)?;
        Ok(())
    }

    /// One attempt on a pooled handle.
    fn execute(
        &self,
        url: &str,
        body: Option<&[u8]>,
        accept: &str,
        sink: &mut BodySink<'_>,
    ) -> Result<u64, TransportError> {
        let mut easy = self.pool.checkout();
        self.configure(&mut easy, url, body, accept)?;

        let mut delivered = 0u64;
        let mut sink_error: Option<io::Error> = None;
        let performed = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| match sink(data) {
                Ok(()) => {
                    delivered += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    sink_error = Some(e);
                    Ok(0) // abort transfer
                }
            })?;
            transfer.perform()
        };

        if let Err(e) = performed {
            if let Some(io_err) = sink_error {
                return Err(TransportError::Sink(io_err));
            }
            if e.is_http_returned_error() {
                return Err(TransportError::Status(easy.response_code()?));
            }
            if delivered > 0 {
                return Err(TransportError::Interrupted {
                    delivered,
                    source: e,
                });
            }
            return Err(TransportError::Curl(e));
        }

        let code = easy.response_code()?;
        if !(200..300).contains(&code) {
            return Err(TransportError::Status(code));
        }
        Ok(delivered)
    }
}
