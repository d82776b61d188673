//! Per-entity fetch memoization.
//!
//! Keyed single-resolution futures: the first caller for a key installs the
//! fetch, every concurrent and later caller for the same key awaits the same
//! shared future. Resolved values (and failures) stay cached for the life of
//! the owning client; there is no eviction.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use futures::future::{FutureExt, Shared};

use super::GatewayError;

type SharedFetch<T> = Shared<Pin<Box<dyn Future<Output = Result<Arc<T>, GatewayError>> + Send>>>;

pub(crate) struct EntityCache<T> {
    entries: Mutex<HashMap<String, SharedFetch<T>>>,
}

impl<T> EntityCache<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached result for `key`, installing `fetch` as the one
    /// fetch for that key if none exists yet. `fetch` is only polled through
    /// the shared handle, so concurrent callers drive a single request.
    pub async fn get_or_fetch<F>(&self, key: &str, fetch: F) -> Result<Arc<T>, GatewayError>
    where
        F: Future<Output = Result<Arc<T>, GatewayError>> + Send + 'static,
    {
        let shared = {
            let mut entries = self.entries.lock().expect("entity cache lock poisoned");
            entries
                .entry(key.to_string())
                .or_insert_with(|| fetch.boxed().shared())
                .clone()
        };
        shared.await
    }
}
