use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Could not fetch a favicon from {url}")]
    FaviconNotFound { url: String },

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("HTTP request failed for {url}: {source}")]
    HttpRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("{what} timed out after {secs}s")]
    Timeout { what: String, secs: u64 },

    #[error("{backend} unavailable: {hint}")]
    BackendUnavailable { backend: &'static str, hint: String },

    #[error("{backend} search failed: {message}")]
    Backend { backend: &'static str, message: String },

    #[error("{backend} does not index favicons by {key}")]
    Unsupported { backend: &'static str, key: &'static str },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not read keys file '{path}': {source}")]
    KeysFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),
}

impl Error {
    /// Whether the operator supplied bad input, as opposed to a runtime
    /// failure. Usage errors exit with status 2.
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::InvalidUrl { .. } | Error::InvalidArgs(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formatting() {
        let err = Error::FaviconNotFound { url: "https://example.com".to_string() };
        assert_eq!(err.to_string(), "Could not fetch a favicon from https://example.com");

        let err = Error::HttpStatus { url: "https://api.shodan.io".to_string(), status: 401 };
        assert_eq!(err.to_string(), "HTTP 401 for https://api.shodan.io");

        let err = Error::Timeout { what: "cencli search".to_string(), secs: 60 };
        assert_eq!(err.to_string(), "cencli search timed out after 60s");
    }

    #[test]
    fn test_invalid_url_keeps_source() {
        let source = url::Url::parse("not a url").unwrap_err();
        let err = Error::InvalidUrl { url: "not a url".to_string(), source };
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_usage_errors() {
        assert!(Error::InvalidArgs("x".to_string()).is_usage());
        let source = url::Url::parse("http://").unwrap_err();
        assert!(Error::InvalidUrl { url: "http://".to_string(), source }.is_usage());

        assert!(!Error::FaviconNotFound { url: String::new() }.is_usage());
        assert!(!Error::KeysFile { path: PathBuf::new(), source: std::io::ErrorKind::NotFound.into() }.is_usage());
        assert!(!Error::BackendUnavailable { backend: "Shodan", hint: String::new() }.is_usage());
    }
}
