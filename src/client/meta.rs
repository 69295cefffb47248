//! Request metadata returned alongside every fetch

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Information about a single fetch
///
/// Created when the fetch starts and finalized once when it ends, whether
/// it succeeded or not.
#[derive(Debug, Clone, Serialize)]
pub struct FetchMeta {
    /// Key the response was read from or written to. Empty if no cache was used.
    pub cache_key: String,
    /// URL requested through the proxy
    pub request_url: String,
    /// When the fetch started
    pub request_time: DateTime<Utc>,
    /// When all processing finished
    pub response_time: Option<DateTime<Utc>>,
    /// Time taken, rounded to the microsecond
    pub latency: Duration,
    /// Whether the payload came from the cache
    pub was_cached: bool,
    /// Body returned by the upstream, empty when served from cache
    #[serde(skip_serializing_if = "String::is_empty")]
    pub raw_body: String,
    #[serde(skip)]
    started: Instant,
}

impl FetchMeta {
    pub(crate) fn started() -> Self {
        Self {
            cache_key: String::new(),
            request_url: String::new(),
            request_time: Utc::now(),
            response_time: None,
            latency: Duration::ZERO,
            was_cached: false,
            raw_body: String::new(),
            started: Instant::now(),
        }
    }

    /// Stamps the response time and latency. Later calls are no-ops.
    pub(crate) fn finish(&mut self) {
        if self.response_time.is_some() {
            return;
        }
        self.latency = round_to_micros(self.started.elapsed());
        self.response_time = Some(Utc::now());
    }

    pub fn is_finished(&self) -> bool {
        self.response_time.is_some()
    }
}

/// Rounds half up to the nearest whole microsecond
fn round_to_micros(elapsed: Duration) -> Duration {
    let micros = (elapsed.as_nanos() + 500) / 1_000;
    Duration::from_micros(u64::try_from(micros).unwrap_or(u64::MAX))
}
