use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::backend::{HostRecord, HostSearch, port_at, string_at, strings_at};
use crate::error::Error;
use crate::http::{Fetch, HttpClient};

pub const SHODAN_SEARCH_URL: &str = "https://api.shodan.io/shodan/host/search";

pub const SHODAN_TIMEOUT_SECS: u64 = 30;

const NAME: &str = "Shodan";

/// Shodan host search, keyed by the MurmurHash3 favicon hash.
///
/// Without an API key every search returns [`Error::BackendUnavailable`] with
/// a link to the equivalent web search.
pub struct Shodan<F = HttpClient> {
    http: F,
    api_key: Option<String>,
}

impl Shodan<HttpClient> {
    pub fn new(api_key: Option<String>) -> Result<Self, Error> {
        let http = HttpClient::for_api(Duration::from_secs(SHODAN_TIMEOUT_SECS))?;
        Ok(Self::with_client(http, api_key))
    }
}

impl<F: Fetch> Shodan<F> {
    pub fn with_client(http: F, api_key: Option<String>) -> Self {
        Self { http, api_key }
    }
}

/// The Shodan search filter for a favicon hash.
pub fn query(hash: i32) -> String {
    format!("http.favicon.hash:{hash}")
}

/// Shodan web search for a favicon hash, usable without an API key.
pub fn web_search_url(hash: i32) -> String {
    format!("https://www.shodan.io/search?query=http.favicon.hash%3A{hash}")
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    matches: Vec<Value>,
}

/// Normalizes the body of a host search response.
pub fn parse_matches(body: &[u8]) -> Result<Vec<HostRecord>, Error> {
    let response: SearchResponse = serde_json::from_slice(body)?;
    Ok(response.matches.into_iter().filter_map(normalize).collect())
}

fn normalize(raw: Value) -> Option<HostRecord> {
    let Some(ip) = string_at(&raw, &["ip_str"]) else {
        debug!("skipping Shodan match without ip_str");
        return None;
    };

    Some(HostRecord {
        ip,
        port: port_at(&raw, &["port"]),
        organization: string_at(&raw, &["org"]),
        hostnames: strings_at(&raw, &["hostnames"]),
        country: string_at(&raw, &["location", "country_name"]),
        asn: string_at(&raw, &["asn"]),
        raw,
    })
}

impl<F: Fetch + Sync> HostSearch for Shodan<F> {
    fn name(&self) -> &'static str {
        NAME
    }

    #[instrument(skip(self), fields(backend = NAME))]
    async fn search_by_legacy_hash(&self, hash: i32, limit: usize) -> Result<Vec<HostRecord>, Error> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(Error::BackendUnavailable {
                backend: NAME,
                hint: format!(
                    "no API key (set SHODAN_API_KEY). Manual search: {}",
                    web_search_url(hash)
                ),
            });
        };

        let limit = limit.to_string();
        let query = query(hash);
        let url = Url::parse_with_params(
            SHODAN_SEARCH_URL,
            [("key", key), ("query", query.as_str()), ("limit", limit.as_str())],
        )
        .map_err(|source| Error::InvalidUrl { url: SHODAN_SEARCH_URL.to_string(), source })?;

        let response = self.http.get(&url).await?;
        if !response.is_success() {
            return Err(Error::HttpStatus { url: SHODAN_SEARCH_URL.to_string(), status: response.status });
        }

        let hosts = parse_matches(&response.body)?;
        debug!(count = hosts.len(), "Shodan matches");
        Ok(hosts)
    }
}
