use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::error::Error;

/// Environment variable holding the Shodan API key.
pub const SHODAN_API_KEY_ENV: &str = "SHODAN_API_KEY";

/// Environment variable overriding the cencli executable.
pub const CENCLI_ENV: &str = "FAVICON_HUNTER_CENCLI";

/// Environment variable naming a `KEY=VALUE` credentials file.
pub const KEYS_FILE_ENV: &str = "FAVICON_HUNTER_KEYS_FILE";

/// Browser user-agent sent with every target request.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_LIMIT: usize = 25;

pub const DEFAULT_CENCLI: &str = "cencli";

/// What a run starts from: a page to fetch a favicon from, or a known hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Url(Url),
    Hash(i32),
}

impl Target {
    /// Builds the target from the two mutually exclusive inputs.
    ///
    /// A URL without a scheme is treated as `https://`.
    pub fn from_inputs(url: Option<&str>, hash: Option<i32>) -> Result<Self, Error> {
        match (url, hash) {
            (Some(raw), None) => {
                let with_scheme = if raw.contains("://") {
                    raw.to_string()
                } else {
                    format!("https://{raw}")
                };
                let parsed = Url::parse(&with_scheme)
                    .map_err(|source| Error::InvalidUrl { url: raw.to_string(), source })?;
                if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
                    return Err(Error::InvalidArgs(format!("'{raw}' is not an http(s) URL")));
                }
                Ok(Target::Url(parsed))
            }
            (None, Some(hash)) => Ok(Target::Hash(hash)),
            (Some(_), Some(_)) => {
                Err(Error::InvalidArgs("supply either a URL or --hash, not both".to_string()))
            }
            (None, None) => Err(Error::InvalidArgs("either a URL or --hash is required".to_string())),
        }
    }
}

/// Which backends the operator asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendSelection {
    pub shodan: bool,
    pub censys: bool,
}

impl BackendSelection {
    pub fn new(shodan: bool, censys: bool, all: bool) -> Self {
        Self { shodan: shodan || all, censys: censys || all }
    }

    pub fn any(&self) -> bool {
        self.shodan || self.censys
    }
}

/// Run configuration, resolved once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct Config {
    pub target: Target,
    pub limit: usize,
    pub fetch_timeout: Duration,
    /// Validate TLS certificates of the target site. Backend APIs always verify.
    pub verify_tls: bool,
    pub user_agent: String,
    pub hash_only: bool,
    pub output: Option<PathBuf>,
    pub backends: BackendSelection,
    pub shodan_api_key: Option<String>,
    pub cencli: PathBuf,
}

impl Config {
    /// A configuration with defaults for everything but the target.
    pub fn new(target: Target) -> Self {
        Self {
            target,
            limit: DEFAULT_LIMIT,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            verify_tls: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            hash_only: false,
            output: None,
            backends: BackendSelection::default(),
            shodan_api_key: None,
            cencli: PathBuf::from(DEFAULT_CENCLI),
        }
    }

    /// True when no backend will be queried.
    pub fn hashes_only(&self) -> bool {
        self.hash_only || !self.backends.any()
    }
}

/// Picks the Shodan key: an explicit value (flag or environment) wins over the
/// keys file. Empty values count as absent.
pub fn resolve_shodan_key(
    explicit: Option<String>,
    keys_file: Option<&Path>,
) -> Result<Option<String>, Error> {
    if let Some(key) = explicit.filter(|k| !k.trim().is_empty()) {
        return Ok(Some(key.trim().to_string()));
    }

    let Some(path) = keys_file else {
        return Ok(None);
    };

    let keys = load_keys_file(path)?;
    Ok(keys.get(SHODAN_API_KEY_ENV).filter(|k| !k.is_empty()).cloned())
}

/// Reads a `KEY=VALUE` file.
pub fn load_keys_file(path: &Path) -> Result<HashMap<String, String>, Error> {
    let contents = std::fs::read_to_string(path)
        .map_err(|source| Error::KeysFile { path: path.to_path_buf(), source })?;
    Ok(parse_keys(&contents))
}

/// Parses `KEY=VALUE` lines. Blank lines, `#` comments and lines without `=`
/// are skipped; the value is everything after the first `=`.
pub fn parse_keys(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_target_requires_exactly_one_input() {
        assert!(matches!(Target::from_inputs(None, None), Err(Error::InvalidArgs(_))));
        assert!(matches!(
            Target::from_inputs(Some("https://example.com"), Some(1)),
            Err(Error::InvalidArgs(_))
        ));
        assert_eq!(Target::from_inputs(None, Some(-42)).unwrap(), Target::Hash(-42));
    }

    #[test]
    fn test_target_url_defaults_to_https() {
        let Target::Url(url) = Target::from_inputs(Some("example.com"), None).unwrap() else {
            panic!("expected a URL target");
        };
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_target_rejects_non_http() {
        assert!(Target::from_inputs(Some("ftp://example.com"), None).is_err());
        assert!(matches!(
            Target::from_inputs(Some("http://"), None),
            Err(Error::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_backend_selection() {
        assert_eq!(BackendSelection::new(false, false, true), BackendSelection {
            shodan: true,
            censys: true
        });
        assert!(!BackendSelection::new(false, false, false).any());
        assert!(BackendSelection::new(false, true, false).any());
    }

    #[test]
    fn test_hashes_only_without_backends() {
        let mut config = Config::new(Target::Hash(1));
        assert!(config.hashes_only());

        config.backends = BackendSelection::new(true, false, false);
        assert!(!config.hashes_only());

        config.hash_only = true;
        assert!(config.hashes_only());
    }

    #[test]
    fn test_parse_keys() {
        let keys = parse_keys(
            "# credentials\n\nSHODAN_API_KEY=abc=123\n  HUNTER_API_KEY = \"xyz\"  \nnot a pair\n",
        );
        assert_eq!(keys.get("SHODAN_API_KEY").map(String::as_str), Some("abc=123"));
        assert_eq!(keys.get("HUNTER_API_KEY").map(String::as_str), Some("xyz"));
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_resolve_shodan_key_precedence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "SHODAN_API_KEY=from-file").unwrap();

        let key = resolve_shodan_key(Some("from-flag".to_string()), Some(file.path())).unwrap();
        assert_eq!(key.as_deref(), Some("from-flag"));

        let key = resolve_shodan_key(Some("  ".to_string()), Some(file.path())).unwrap();
        assert_eq!(key.as_deref(), Some("from-file"));

        assert_eq!(resolve_shodan_key(None, None).unwrap(), None);
    }

    #[test]
    fn test_missing_keys_file_is_an_error() {
        let err = resolve_shodan_key(None, Some(Path::new("/nonexistent/keys.env"))).unwrap_err();
        assert!(matches!(err, Error::KeysFile { .. }));
    }
}
