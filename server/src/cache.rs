//! Memoised dashboard payloads.
//!
//! Entries are keyed by path plus query string and expire after a fixed
//! TTL. Server actions call [`PageCache::revalidate_path`] after a
//! successful mutation so the next read renders fresh data.

use std::{
    collections::HashMap,
    future::Future,
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use platform_api::ApiResult;
use serde_json::Value;
use tokio::sync::RwLock;

struct Entry {
    rendered_at: Instant,
    body: Value,
}

pub struct PageCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry>>,
    /// Bumped by every revalidation, under the write lock.
    generation: AtomicU64,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Returns the cached payload for `key`, rendering and storing it on a
    /// miss. Render errors are passed through and never cached, and a body
    /// rendered across a revalidation is returned but not stored.
    pub async fn get_or_render<F, Fut>(&self, key: &str, render: F) -> ApiResult<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<Value>>,
    {
        let started = {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(key) {
                if entry.rendered_at.elapsed() < self.ttl {
                    return Ok(entry.body.clone());
                }
            }
            self.generation.load(Ordering::Acquire)
        };
        let body = render().await?;
        let mut entries = self.entries.write().await;
        if self.generation.load(Ordering::Acquire) != started {
            tracing::debug!(key, "page revalidated while rendering; not cached");
            return Ok(body);
        }
        entries.insert(
            key.to_string(),
            Entry {
                rendered_at: Instant::now(),
                body: body.clone(),
            },
        );
        Ok(body)
    }

    /// Evicts `path` and every query variant of it. Returns the number of
    /// entries removed.
    pub async fn revalidate_path(&self, path: &str) -> usize {
        let mut entries = self.entries.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        let before = entries.len();
        entries.retain(|key, _| !covers(path, key));
        let evicted = before - entries.len();
        tracing::debug!(path, evicted, "page cache revalidated");
        evicted
    }
}

fn covers(path: &str, key: &str) -> bool {
    match key.strip_prefix(path) {
        Some(rest) => rest.is_empty() || rest.starts_with('?'),
        None => false,
    }
}
