//! Host search engines that index favicons.
//!
//! Each engine indexes favicons by one hash form. [`HostSearch`] exposes one
//! method per form; an engine implements the one it supports and leaves the
//! other returning [`Error::Unsupported`].

pub mod censys;
pub mod shodan;

use std::future::Future;

use serde::Serialize;
use serde_json::Value;

use crate::error::Error;

pub use censys::Censys;
pub use shodan::Shodan;

/// One matched network asset, normalized across engines. Fields an engine
/// did not report stay `None`/empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostRecord {
    pub ip: String,
    pub port: Option<u16>,
    pub organization: Option<String>,
    pub hostnames: Vec<String>,
    pub country: Option<String>,
    pub asn: Option<String>,
    /// The engine's original record.
    #[serde(skip_serializing_if = "Value::is_null")]
    pub raw: Value,
}

impl HostRecord {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            port: None,
            organization: None,
            hostnames: Vec::new(),
            country: None,
            asn: None,
            raw: Value::Null,
        }
    }
}

pub trait HostSearch {
    /// Display name, also the key under which results are stored.
    fn name(&self) -> &'static str;

    /// Searches by the MurmurHash3 favicon hash.
    fn search_by_legacy_hash(
        &self,
        _hash: i32,
        _limit: usize,
    ) -> impl Future<Output = Result<Vec<HostRecord>, Error>> + Send {
        let backend = self.name();
        async move { Err(Error::Unsupported { backend, key: "mmh3" }) }
    }

    /// Searches by the SHA-256 favicon digest.
    fn search_by_sha256(
        &self,
        _sha256: &str,
        _limit: usize,
    ) -> impl Future<Output = Result<Vec<HostRecord>, Error>> + Send {
        let backend = self.name();
        async move { Err(Error::Unsupported { backend, key: "sha256" }) }
    }
}

impl<T: HostSearch + ?Sized> HostSearch for &T {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn search_by_legacy_hash(
        &self,
        hash: i32,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<HostRecord>, Error>> + Send {
        (**self).search_by_legacy_hash(hash, limit)
    }

    fn search_by_sha256(
        &self,
        sha256: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<HostRecord>, Error>> + Send {
        (**self).search_by_sha256(sha256, limit)
    }
}

/// Follows `path` through nested objects.
pub(crate) fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, key| v.get(key))
}

/// A non-empty string at `path`. Numbers are stringified.
pub(crate) fn string_at(value: &Value, path: &[&str]) -> Option<String> {
    match lookup(value, path)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn port_at(value: &Value, path: &[&str]) -> Option<u16> {
    lookup(value, path)?.as_u64().and_then(|p| u16::try_from(p).ok())
}

/// Non-empty strings of the array at `path`.
pub(crate) fn strings_at(value: &Value, path: &[&str]) -> Vec<String> {
    lookup(value, path)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
