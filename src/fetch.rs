//! Retrying, paginating fetch layer.
//!
//! Every request runs through a small state machine
//! (`Attempting(n)` → `Succeeded` | `FailedSoft`). Exhausted retries never
//! raise: callers get `None` and carry on with that field or record empty.
//! The transport and the clock are injected so tests can script failures
//! without real network or real delays.

use std::collections::HashMap;
use std::env;
use std::hash::Hash;
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use rayon::prelude::*;
use reqwest::Url;
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::key_index::KeyIndex;
use crate::upstream::Page;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Failure below the HTTP layer (connect, timeout, reset, unreadable body).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError(pub String);

pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            thread::sleep(duration);
        }
    }
}

pub struct ReqwestTransport {
    client: &'static Client,
}

impl ReqwestTransport {
    pub fn new(client: &'static Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|err| TransportError(err.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|err| TransportError(format!("failed reading body: {err}")))?;
        Ok(HttpResponse { status, body })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Multiplier applied to `base_delay` after a 429.
    pub rate_limit_factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            rate_limit_factor: 3,
        }
    }
}

impl RetryPolicy {
    pub fn delay_after(&self, failure: Failure) -> Duration {
        match failure {
            Failure::RateLimited => self.base_delay * self.rate_limit_factor.max(3),
            Failure::Gateway(_) | Failure::Network(_) => self.base_delay,
        }
    }
}

/// Outcome of a single attempt that did not succeed but may be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    RateLimited,
    Gateway(u16),
    Network(NetworkKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkKind {
    Transport,
    InvalidBody,
}

enum Attempt {
    Success(Value),
    Retryable(Failure),
    /// Non-retryable HTTP status (404, 401, ...).
    Rejected(u16),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    Attempting(u32),
    Succeeded(Value),
    FailedSoft,
}

pub struct Fetcher {
    transport: Box<dyn Transport>,
    sleeper: Box<dyn Sleeper>,
    policy: RetryPolicy,
    polite_delay: Duration,
    parallelism: usize,
}

impl Fetcher {
    pub fn new(transport: Box<dyn Transport>, sleeper: Box<dyn Sleeper>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            sleeper,
            policy,
            polite_delay: Duration::ZERO,
            parallelism: 1,
        }
    }

    pub fn with_polite_delay(mut self, delay: Duration) -> Self {
        self.polite_delay = delay;
        self
    }

    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = threads.max(1);
        self
    }

    /// GET `url` as JSON under the retry contract. `None` once retries are
    /// exhausted or the server rejects the request outright.
    pub fn get_json(&self, url: &str) -> Option<Value> {
        let mut state = FetchState::Attempting(1);
        loop {
            state = match state {
                FetchState::Attempting(n) => self.step(url, n),
                FetchState::Succeeded(value) => return Some(value),
                FetchState::FailedSoft => return None,
            };
        }
    }

    fn step(&self, url: &str, attempt: u32) -> FetchState {
        match self.attempt(url) {
            Attempt::Success(value) => FetchState::Succeeded(value),
            Attempt::Rejected(status) => {
                warn!(%url, status, "request rejected, leaving resource empty");
                FetchState::FailedSoft
            }
            Attempt::Retryable(failure) if attempt >= self.policy.max_attempts => {
                warn!(%url, attempts = attempt, ?failure, "retries exhausted, leaving resource empty");
                FetchState::FailedSoft
            }
            Attempt::Retryable(failure) => {
                let delay = self.policy.delay_after(failure);
                debug!(%url, attempt, ?failure, ?delay, "retrying");
                self.sleeper.sleep(delay);
                FetchState::Attempting(attempt + 1)
            }
        }
    }

    fn attempt(&self, url: &str) -> Attempt {
        let resp = match self.transport.get(url) {
            Ok(resp) => resp,
            Err(err) => {
                debug!(%url, error = %err.0, "transport failure");
                return Attempt::Retryable(Failure::Network(NetworkKind::Transport));
            }
        };
        match resp.status {
            200..=299 => match serde_json::from_str::<Value>(resp.body.trim()) {
                Ok(value) => Attempt::Success(value),
                Err(_) => Attempt::Retryable(Failure::Network(NetworkKind::InvalidBody)),
            },
            429 => Attempt::Retryable(Failure::RateLimited),
            502..=504 => Attempt::Retryable(Failure::Gateway(resp.status)),
            status => Attempt::Rejected(status),
        }
    }

    /// Follows `_next` cursors until a page carries none and returns every
    /// item in page order. A page that fails soft makes the whole listing
    /// absent rather than silently truncated.
    pub fn get_paginated(&self, base_url: &str, limit: u32) -> Option<Vec<Value>> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        let cursors = KeyIndex::new();
        loop {
            let url = page_url(base_url, limit, cursor.as_deref())?;
            let body = self.get_json(&url)?;
            let page: Page = match serde_json::from_value(body) {
                Ok(page) => page,
                Err(err) => {
                    warn!(%url, error = %err, "unexpected page shape");
                    return None;
                }
            };
            items.extend(page.data);
            match page.pagination.and_then(|p| p.next) {
                Some(next) if cursors.observe(next.clone()) => cursor = Some(next),
                Some(next) => {
                    warn!(%base_url, cursor = %next, "pagination cursor repeated, stopping");
                    break;
                }
                None => break,
            }
        }
        Some(items)
    }

    /// Runs `fetch` once per key on the bounded fetch pool, pausing for the
    /// politeness delay after each request. Results come back in key order
    /// whatever order the requests complete in.
    pub fn fetch_each<K, R, F>(&self, keys: &[K], fetch: F) -> Vec<R>
    where
        K: Sync,
        R: Send,
        F: Fn(&K) -> R + Sync,
    {
        let run_one = |key: &K| {
            let out = fetch(key);
            self.sleeper.sleep(self.polite_delay);
            out
        };
        if self.parallelism <= 1 || keys.len() <= 1 {
            return keys.iter().map(run_one).collect();
        }
        with_fetch_pool(self.parallelism, || keys.par_iter().map(run_one).collect())
    }
}

fn page_url(base_url: &str, limit: u32, cursor: Option<&str>) -> Option<String> {
    let mut params = vec![("_limit", limit.to_string())];
    if let Some(cursor) = cursor {
        params.push(("_next", cursor.to_string()));
    }
    match Url::parse_with_params(base_url, &params) {
        Ok(url) => Some(url.to_string()),
        Err(err) => {
            warn!(%base_url, error = %err, "invalid listing url");
            None
        }
    }
}

/// Per-run cache of detail responses keyed by entity id (and season where
/// the resource is per season). Every key is fetched at most once: keys are
/// claimed through a [`KeyIndex`] before any request goes out, and the entry
/// map is only locked to store results, never across a request.
pub struct DetailCache<K, V> {
    scheduled: KeyIndex<K>,
    entries: Mutex<HashMap<K, Option<V>>>,
}

impl<K, V> Default for DetailCache<K, V>
where
    K: Eq + Hash + Clone + Sync,
    V: Clone + Send,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> DetailCache<K, V>
where
    K: Eq + Hash + Clone + Sync,
    V: Clone + Send,
{
    pub fn new() -> Self {
        Self {
            scheduled: KeyIndex::new(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetches every key not requested before. Returns how many requests
    /// went out.
    pub fn warm<F>(&self, fetcher: &Fetcher, keys: impl IntoIterator<Item = K>, fetch: F) -> usize
    where
        F: Fn(&K) -> Option<V> + Sync,
    {
        let pending: Vec<K> = keys
            .into_iter()
            .filter(|k| self.scheduled.observe(k.clone()))
            .collect();
        if pending.is_empty() {
            return 0;
        }
        let results = fetcher.fetch_each(&pending, fetch);
        let requested = pending.len();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.extend(pending.into_iter().zip(results));
        requested
    }

    /// Cached value; `None` for keys never fetched and for failed fetches.
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .flatten()
    }

    pub fn misses(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|v| v.is_none())
            .count()
    }
}

pub fn with_fetch_pool<T>(threads: usize, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(action),
        Err(_) => action(),
    }
}

pub fn fetch_parallelism() -> usize {
    env::var("FETCH_PARALLELISM")
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(1)
        .clamp(1, 32)
}
