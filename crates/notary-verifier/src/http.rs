//! # HTTP adapter
//!
//! Blocking `GetURL` with single-flight deduplication, a 1 MiB body cap,
//! and a 10-second per-request timeout. Spec.md §4.7.
//!
//! The core never retries: a [`HttpError`] surfaces straight to the
//! caller, which may retry outside this crate.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use notary_merkle::tile_reader::TileFetcher;
use notary_merkle::{MerkleError, Tile};

use crate::errors::HttpError;

/// Body size cap: a malicious or buggy server cannot force unbounded
/// memory use through an oversized response.
const MAX_BODY_BYTES: u64 = 1 << 20;

/// Outbound port: fetch bytes at a URL. The single real implementation is
/// [`HttpClient`]; tests substitute an in-memory fake.
pub trait HttpFetcher: Send + Sync {
    fn get_url(&self, url: &str) -> Result<Vec<u8>, HttpError>;
}

/// Blocking HTTP client with per-URL single-flight deduplication.
///
/// Concurrent callers requesting the same URL share one underlying
/// request: the first caller computes the result and stores it behind a
/// [`OnceLock`]; later callers for the same URL block on that lock rather
/// than issuing a second request.
pub struct HttpClient {
    client: reqwest::blocking::Client,
    inflight: Mutex<HashMap<String, Arc<OnceLock<Result<Vec<u8>, HttpError>>>>>,
}

impl HttpClient {
    pub fn new() -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client with only a timeout configured never fails to build");
        Self {
            client,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, url: &str) -> Arc<OnceLock<Result<Vec<u8>, HttpError>>> {
        let mut inflight = self.inflight.lock().expect("http single-flight map poisoned");
        inflight.entry(url.to_string()).or_default().clone()
    }

    fn clear_slot(&self, url: &str) {
        self.inflight.lock().expect("http single-flight map poisoned").remove(url);
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        let response = self.client.get(url).send().map_err(|e| HttpError::Transport {
            url: url.to_string(),
            detail: e.to_string(),
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        if let Some(len) = response.content_length() {
            if len > MAX_BODY_BYTES {
                return Err(HttpError::BodyShape {
                    url: url.to_string(),
                    detail: format!("declared length {len} exceeds {MAX_BODY_BYTES}-byte cap"),
                });
            }
        }
        let bytes = response.bytes().map_err(|e| HttpError::Transport {
            url: url.to_string(),
            detail: e.to_string(),
        })?;
        if bytes.len() as u64 > MAX_BODY_BYTES {
            return Err(HttpError::BodyShape {
                url: url.to_string(),
                detail: format!("body is {} bytes, exceeds {MAX_BODY_BYTES}-byte cap", bytes.len()),
            });
        }
        Ok(bytes.to_vec())
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher for HttpClient {
    fn get_url(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        let slot = self.slot(url);
        let result = slot.get_or_init(|| {
            tracing::debug!(url, "fetching");
            self.fetch(url)
        });
        // The slot is cleared after first use so a later request for the
        // same URL (e.g. a retry by the caller, or a later poll of
        // `/latest`) issues a fresh fetch instead of replaying a stale
        // cached error or body forever.
        self.clear_slot(url);
        result.clone()
    }
}

impl<T: HttpFetcher + ?Sized> HttpFetcher for Arc<T> {
    fn get_url(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        (**self).get_url(url)
    }
}

/// Adapts an [`HttpFetcher`] plus a tile URL prefix into a
/// `notary_merkle::TileFetcher`.
pub struct HttpTileFetcher<F: HttpFetcher> {
    base_url: String,
    fetcher: F,
}

impl<F: HttpFetcher> HttpTileFetcher<F> {
    pub fn new(base_url: impl Into<String>, fetcher: F) -> Self {
        Self {
            base_url: base_url.into(),
            fetcher,
        }
    }
}

impl<F: HttpFetcher> TileFetcher for HttpTileFetcher<F> {
    fn fetch_tile(&self, tile: &Tile) -> Result<Vec<u8>, MerkleError> {
        let url = format!("{}/{}", self.base_url, tile.path());
        self.fetcher
            .get_url(&url)
            .map_err(|e| MerkleError::ReaderError(e.to_string()))
    }
}
