//! In-memory fakes shared by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use url::Url;

use crate::error::Error;
use crate::http::{Fetch, Response};

pub const ICO_BYTES: &[u8] = &[0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x10, 0x10];
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n', 0, 0, 0, 13];

/// Serves canned responses by exact URL and records every request.
/// Unknown URLs get a 404.
#[derive(Default)]
pub struct StaticHttp {
    routes: HashMap<String, Result<Response, ()>>,
    requests: Mutex<Vec<String>>,
}

impl StaticHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, status: u16, content_type: Option<&str>, body: &[u8]) -> Self {
        let response =
            Response { status, content_type: content_type.map(str::to_string), body: body.to_vec() };
        self.routes.insert(url.to_string(), Ok(response));
        self
    }

    pub fn with_html(self, url: &str, html: &str) -> Self {
        self.with(url, 200, Some("text/html; charset=utf-8"), html.as_bytes())
    }

    /// Requests to `url` time out.
    pub fn timing_out(mut self, url: &str) -> Self {
        self.routes.insert(url.to_string(), Err(()));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, url: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

impl Fetch for StaticHttp {
    async fn get(&self, url: &Url) -> Result<Response, Error> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.routes.get(url.as_str()) {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err(())) => Err(Error::Timeout { what: format!("GET {url}"), secs: 10 }),
            None => Ok(Response { status: 404, content_type: None, body: b"not found".to_vec() }),
        }
    }
}
