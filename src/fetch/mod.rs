//! Contact retrieval from the CRM.

pub mod paginator;
pub mod source;

pub use paginator::{PaginatedFetcher, RetryPolicy, DEFAULT_PAGE_SIZE};
pub use source::{HttpPageSource, HttpSourceConfig, PageResponse, PageSource, TransportFailure};

#[cfg(test)]
pub mod testing {
    //! Scripted in-memory source for fetcher and pipeline tests.

    use super::source::{PageResponse, PageSource, TransportFailure};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed list of responses and records every request.
    ///
    /// Once the script runs out it answers with an empty page.
    pub struct ScriptedSource {
        script: Mutex<VecDeque<Result<PageResponse, TransportFailure>>>,
        requests: Mutex<Vec<(usize, usize)>>,
    }

    impl ScriptedSource {
        pub fn new(script: Vec<Result<PageResponse, TransportFailure>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// `(limit, offset)` of each request, in order.
        pub fn requests(&self) -> Vec<(usize, usize)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch_page(
            &self,
            limit: usize,
            offset: usize,
        ) -> Result<PageResponse, TransportFailure> {
            self.requests.lock().unwrap().push((limit, offset));
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(PageResponse::new(200, contacts_body(0))))
        }
    }

    /// A `contacts` page with `n` generic contacts.
    pub fn contacts_body(n: usize) -> String {
        let contacts: Vec<_> = (0..n)
            .map(|i| {
                json!({
                    "email": format!("user{}@example.com", i),
                    "attributes": { "ATENEO": "Bologna" },
                    "listIds": [2]
                })
            })
            .collect();
        json!({ "contacts": contacts, "count": n }).to_string()
    }
}
