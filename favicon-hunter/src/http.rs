use std::borrow::Cow;
use std::future::Future;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::Error;

/// A fully-read HTTP response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Whether the declared content type is `image/*`.
    pub fn is_image_typed(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("image/"))
    }
}

/// Issues GET requests. Implemented over reqwest for real runs.
pub trait Fetch {
    fn get(&self, url: &Url) -> impl Future<Output = Result<Response, Error>> + Send;
}

impl<T: Fetch + ?Sized> Fetch for &T {
    fn get(&self, url: &Url) -> impl Future<Output = Result<Response, Error>> + Send {
        (**self).get(url)
    }
}

/// reqwest-backed [`Fetch`] with a fixed timeout and user-agent.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpClient {
    /// Client for the target site. Certificate validation follows
    /// `config.verify_tls`.
    pub fn for_target(config: &Config) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(Error::Client)?;

        Ok(Self { client, timeout: config.fetch_timeout })
    }

    /// Client for backend APIs. Always validates certificates.
    pub fn for_api(timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("favicon-hunter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Client)?;

        Ok(Self { client, timeout })
    }
}

impl Fetch for HttpClient {
    async fn get(&self, url: &Url) -> Result<Response, Error> {
        let shown = display_url(url);
        debug!(url = %shown, "GET");

        let map_err = |e: reqwest::Error| {
            if e.is_timeout() {
                Error::Timeout { what: format!("GET {shown}"), secs: self.timeout.as_secs() }
            } else {
                Error::HttpRequest { url: shown.clone(), source: e.without_url() }
            }
        };

        let response = self.client.get(url.clone()).send().await.map_err(map_err)?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(map_err)?.to_vec();

        debug!(url = %shown, status, bytes = body.len(), "response");
        Ok(Response { status, content_type, body })
    }
}

/// `url` without its query string, so credentials passed as parameters never
/// reach logs or error messages.
pub fn display_url(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.set_fragment(None);
    shown.to_string()
}
