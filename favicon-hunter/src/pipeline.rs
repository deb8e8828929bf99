use favicon_hash::{FaviconHashes, compute_hashes};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use tracing::{info, warn};

use crate::backend::{HostRecord, HostSearch};
use crate::config::{Config, Target};
use crate::error::Error;
use crate::fetcher::{Favicon, fetch_favicon};
use crate::http::Fetch;

/// The hashes a run searches with. Only `mmh3` is known when the operator
/// supplied a precomputed hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hashes {
    pub mmh3: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl Hashes {
    pub fn legacy_only(mmh3: i32) -> Self {
        Self { mmh3, md5: None, sha256: None }
    }
}

impl From<FaviconHashes> for Hashes {
    fn from(h: FaviconHashes) -> Self {
        Self { mmh3: h.mmh3, md5: Some(h.md5), sha256: Some(h.sha256) }
    }
}

/// Hashes plus the favicon they were computed from, if one was fetched.
#[derive(Debug, Clone)]
pub struct Hashed {
    pub hashes: Hashes,
    pub favicon: Option<Favicon>,
}

/// What one backend returned. A failed backend has no hosts and an error.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendResult {
    pub backend: &'static str,
    pub hosts: Vec<HostRecord>,
    pub error: Option<String>,
}

impl BackendResult {
    fn settle(backend: &'static str, outcome: Result<Vec<HostRecord>, Error>) -> Self {
        match outcome {
            Ok(hosts) => {
                info!(backend, count = hosts.len(), "search complete");
                Self { backend, hosts, error: None }
            }
            Err(e) => {
                warn!("{e}");
                Self { backend, hosts: Vec::new(), error: Some(e.to_string()) }
            }
        }
    }
}

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub hashes: Hashes,
    pub source_url: Option<String>,
    pub favicon_url: Option<String>,
    /// In query order; backends that were not queried are absent.
    pub backend_results: Vec<BackendResult>,
}

impl SearchResult {
    pub fn new(hashed: Hashed, source_url: Option<String>, backend_results: Vec<BackendResult>) -> Self {
        Self {
            hashes: hashed.hashes,
            source_url,
            favicon_url: hashed.favicon.map(|f| f.url.to_string()),
            backend_results,
        }
    }

    pub fn hosts(&self, backend: &str) -> Option<&[HostRecord]> {
        self.backend_results.iter().find(|r| r.backend == backend).map(|r| r.hosts.as_slice())
    }
}

struct HostsByBackend<'a>(&'a [BackendResult]);

impl Serialize for HostsByBackend<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for result in self.0 {
            map.serialize_entry(result.backend, &result.hosts)?;
        }
        map.end()
    }
}

struct ErrorsByBackend<'a>(&'a [BackendResult]);

impl Serialize for ErrorsByBackend<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.0.iter().filter_map(|r| r.error.as_deref().map(|e| (r.backend, e))),
        )
    }
}

impl Serialize for SearchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let has_errors = self.backend_results.iter().any(|r| r.error.is_some());
        let len = 3 + usize::from(self.favicon_url.is_some()) + usize::from(has_errors);

        let mut state = serializer.serialize_struct("SearchResult", len)?;
        state.serialize_field("hashes", &self.hashes)?;
        state.serialize_field("source_url", &self.source_url)?;
        if let Some(favicon_url) = &self.favicon_url {
            state.serialize_field("favicon_url", favicon_url)?;
        }
        state.serialize_field("backend_results", &HostsByBackend(&self.backend_results))?;
        if has_errors {
            state.serialize_field("errors", &ErrorsByBackend(&self.backend_results))?;
        }
        state.end()
    }
}

/// Runs the favicon → hashes → search stages for one [`Config`].
///
/// `legacy` is queried by MurmurHash3, `digest` by SHA-256. Backend failures
/// never fail the run; they become empty results with an error message.
pub struct Hunter<'a, F, A, B> {
    config: &'a Config,
    http: F,
    legacy: A,
    digest: B,
}

impl<'a, F: Fetch, A: HostSearch, B: HostSearch> Hunter<'a, F, A, B> {
    pub fn new(config: &'a Config, http: F, legacy: A, digest: B) -> Self {
        Self { config, http, legacy, digest }
    }

    /// Fetches and hashes the target favicon, or wraps the supplied hash.
    pub async fn hashes(&self) -> Result<Hashed, Error> {
        match &self.config.target {
            Target::Hash(mmh3) => Ok(Hashed { hashes: Hashes::legacy_only(*mmh3), favicon: None }),
            Target::Url(url) => {
                let favicon = fetch_favicon(&self.http, url).await?;
                let hashes = compute_hashes(&favicon.bytes).into();
                Ok(Hashed { hashes, favicon: Some(favicon) })
            }
        }
    }

    /// Queries every selected backend, in order. Returns nothing when the
    /// configuration asks for hashes only.
    pub async fn search(&self, hashes: &Hashes) -> Vec<BackendResult> {
        let mut results = Vec::new();
        if self.config.hashes_only() {
            return results;
        }

        let limit = self.config.limit;

        if self.config.backends.shodan {
            info!(backend = self.legacy.name(), "searching");
            let outcome = self.legacy.search_by_legacy_hash(hashes.mmh3, limit).await;
            results.push(BackendResult::settle(self.legacy.name(), outcome));
        }

        if self.config.backends.censys {
            let outcome = match &hashes.sha256 {
                Some(sha256) => {
                    info!(backend = self.digest.name(), "searching");
                    self.digest.search_by_sha256(sha256, limit).await
                }
                None => Err(Error::BackendUnavailable {
                    backend: self.digest.name(),
                    hint: "needs the favicon SHA-256, which a bare --hash does not provide"
                        .to_string(),
                }),
            };
            results.push(BackendResult::settle(self.digest.name(), outcome));
        }

        results
    }

    /// All stages. Fails only when no favicon could be obtained.
    pub async fn run(&self) -> Result<SearchResult, Error> {
        let hashed = self.hashes().await?;
        let backend_results = self.search(&hashed.hashes).await;
        let source_url = match &self.config.target {
            Target::Url(url) => Some(url.to_string()),
            Target::Hash(_) => None,
        };
        Ok(SearchResult::new(hashed, source_url, backend_results))
    }
}
