//! Paginated retrieval with per-page retry.
//!
//! Pages are requested strictly one after another. The offset advances
//! by the number of records actually returned, and a retried request is
//! always the same page again.

use crate::error::FetchError;
use crate::fetch::source::{PageResponse, PageSource, TransportFailure};
use crate::models::RawRecord;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Records requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// How transient page failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; a page is requested at most
    /// `max_retries + 1` times.
    pub max_retries: u32,
    /// Delay unit; retry `n` waits `n * base_delay`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    /// Linear backoff before the given 1-based retry.
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay * retry
    }
}

/// Rate limiting and server errors are worth retrying.
pub fn is_transient(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Fetches the whole contact set from a [`PageSource`].
pub struct PaginatedFetcher<S> {
    source: S,
    page_size: usize,
    retry: RetryPolicy,
    show_progress: bool,
}

impl<S: PageSource> PaginatedFetcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            page_size: DEFAULT_PAGE_SIZE,
            retry: RetryPolicy::default(),
            show_progress: false,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    #[cfg(test)]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Retrieve every record, or fail without returning a partial set.
    pub async fn fetch_all(&self) -> Result<Vec<RawRecord>, FetchError> {
        let progress = self.show_progress.then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        });

        let mut offset = 0;
        let mut pages = 0;
        let mut records = Vec::new();

        let outcome = loop {
            let chunk = match self.fetch_page(offset).await {
                Ok(chunk) => chunk,
                Err(e) => break Err(e),
            };
            if chunk.is_empty() {
                break Ok(());
            }

            pages += 1;
            offset += chunk.len();
            records.extend(chunk.iter().map(RawRecord::from_value));

            info!(
                "Fetched page {} with {} contacts (total {})",
                pages,
                chunk.len(),
                records.len()
            );
            if let Some(ref pb) = progress {
                pb.set_message(format!("{} contacts fetched", records.len()));
            }
        };

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        outcome?;
        debug!("Pagination finished after {} pages", pages);
        Ok(records)
    }

    /// Request one page, retrying transient failures.
    async fn fetch_page(&self, offset: usize) -> Result<Vec<Value>, FetchError> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let response = self
                .source
                .fetch_page(self.page_size, offset)
                .await
                .map_err(|TransportFailure(reason)| FetchError::Transport { offset, reason })?;

            if is_transient(response.status) {
                if attempt <= self.retry.max_retries {
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        "Retry {} (HTTP {}) at offset {} after {}ms",
                        attempt,
                        response.status,
                        offset,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                return Err(FetchError::RetriesExhausted {
                    status: response.status,
                    attempts: attempt,
                    offset,
                });
            }

            return parse_page(response, offset);
        }
    }
}

/// Turn a non-transient response into the page's record array.
fn parse_page(response: PageResponse, offset: usize) -> Result<Vec<Value>, FetchError> {
    if !(200..300).contains(&response.status) {
        return Err(FetchError::ClientError {
            status: response.status,
            offset,
            body: response.body,
        });
    }

    let mut data: Value =
        serde_json::from_str(&response.body).map_err(|e| FetchError::MalformedResponse {
            offset,
            reason: e.to_string(),
        })?;

    let key = if data.get("contacts").is_some_and(|v| !v.is_null()) {
        "contacts"
    } else {
        "items"
    };
    let chunk = data.get_mut(key).map(Value::take).unwrap_or(Value::Null);

    // Anything that is not an array ends pagination.
    match chunk {
        Value::Array(items) => Ok(items),
        _ => Ok(Vec::new()),
    }
}
