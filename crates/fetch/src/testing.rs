//! In-process test doubles for the store and fetcher collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::fetch::{FetchError, PageFetcher};
use crate::store::{KeyValueStore, StoreError};

/// Map-backed store with Redis-like TTL semantics. Uses tokio's clock so
/// tests can run with paused time.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, (Vec<u8>, Option<Instant>)>>,
    failures: Mutex<HashMap<&'static str, String>>,
}

/// Store commands that can be made to fail.
pub const STORE_COMMANDS: &[&str] = &["incr", "get", "set"];

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent command fail.
    pub fn fail_commands(&self, detail: &str) {
        for command in STORE_COMMANDS {
            self.fail_on(command, detail);
        }
    }

    /// Make every subsequent call of one command (`incr`, `get` or `set`) fail.
    pub fn fail_on(&self, command: &'static str, detail: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(command, detail.to_string());
    }

    /// Live value under `key`, bypassing failure injection.
    pub fn peek(&self, key: &str) -> Option<Vec<u8>> {
        live(&self.values.lock().unwrap(), key).map(<[u8]>::to_vec)
    }

    pub fn counter(&self, key: &str) -> i64 {
        self.peek(key)
            .and_then(|v| String::from_utf8(v).ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    /// Remaining TTL of `key`, if it has one.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let values = self.values.lock().unwrap();
        values
            .get(key)
            .and_then(|(_, expires_at)| *expires_at)
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn put_raw(&self, key: &str, value: &[u8]) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_vec(), None));
    }

    fn check(&self, command: &str) -> Result<(), StoreError> {
        match self.failures.lock().unwrap().get(command) {
            Some(detail) => Err(StoreError::Command(detail.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.check("incr")?;
        let mut values = self.values.lock().unwrap();
        let current = match live(&values, key) {
            Some(raw) => std::str::from_utf8(raw)
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .ok_or_else(|| StoreError::Command("value is not an integer".into()))?,
            None => 0,
        };
        let next = current + 1;
        values.insert(key.to_string(), (next.to_string().into_bytes(), None));
        Ok(next)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.check("get")?;
        Ok(self.peek(key))
    }

    async fn set_with_expiry(
        &self,
        key: &str,
        value: &[u8],
        expire_seconds: u64,
    ) -> Result<(), StoreError> {
        self.check("set")?;
        let expires_at = Instant::now() + Duration::from_secs(expire_seconds);
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_vec(), Some(expires_at)));
        Ok(())
    }
}

fn live<'a>(values: &'a HashMap<String, (Vec<u8>, Option<Instant>)>, key: &str) -> Option<&'a [u8]> {
    values
        .get(key)
        .filter(|(_, expires_at)| expires_at.is_none_or(|at| Instant::now() < at))
        .map(|(value, _)| value.as_slice())
}

/// Fetcher that answers from a fixed table and records every call.
#[derive(Default)]
pub struct StubFetcher {
    pages: HashMap<String, Result<String, u16>>,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), Ok(body.to_string()));
        self
    }

    pub fn failing(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(url.to_string(), Err(status));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.pages.get(url) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status: *status,
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}
