//! Censys search through the `cencli` command-line client.
//!
//! cencli writes status text around its JSON, so stdout goes through a chain
//! of parsers (see [`parse_output`]) instead of a single `from_str`.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::backend::{HostRecord, HostSearch, port_at, string_at, strings_at};
use crate::error::Error;

pub const CENCLI_TIMEOUT_SECS: u64 = 60;

pub const CENCLI_INSTALL_URL: &str = "https://github.com/censys/cencli";

/// Longest excerpt of cencli's output carried in an error.
const ERROR_EXCERPT_LEN: usize = 200;

const NAME: &str = "Censys";

/// Censys host search keyed by the SHA-256 favicon digest.
pub struct Censys {
    program: PathBuf,
    timeout: Duration,
}

impl Censys {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), timeout: Duration::from_secs(CENCLI_TIMEOUT_SECS) }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, query: &str, limit: usize) -> Result<String, Error> {
        let limit = limit.to_string();
        let mut command = Command::new(&self.program);
        command
            .args(["search", query, "-n", limit.as_str(), "-O", "json"])
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::BackendUnavailable {
                    backend: NAME,
                    hint: format!(
                        "'{}' not found. Install from: {CENCLI_INSTALL_URL}",
                        self.program.display()
                    ),
                });
            }
            Ok(Err(e)) => return Err(Error::Io(e)),
            Err(_) => {
                return Err(Error::Timeout {
                    what: "cencli search".to_string(),
                    secs: self.timeout.as_secs(),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = if stderr.trim().is_empty() { stdout.as_str() } else { &*stderr };
            return Err(Error::Backend {
                backend: NAME,
                message: format!("cencli exited with {}: {}", output.status, excerpt(detail)),
            });
        }

        Ok(stdout)
    }
}

/// The Censys search filter for a favicon digest.
pub fn query(sha256: &str) -> String {
    format!("host.services.endpoints.http.favicons.hash_sha256:{sha256}")
}

fn excerpt(text: &str) -> String {
    text.trim().chars().take(ERROR_EXCERPT_LEN).collect()
}

type Parser = fn(&str) -> Option<Vec<Value>>;

/// Tried in order; the first to produce a list wins.
const PARSERS: [(&str, Parser); 3] = [
    ("json array", parse_array),
    ("array after status text", parse_array_after_prefix),
    ("json lines", parse_json_lines),
];

fn parse_array(output: &str) -> Option<Vec<Value>> {
    serde_json::from_str::<Vec<Value>>(output).ok()
}

fn parse_array_after_prefix(output: &str) -> Option<Vec<Value>> {
    let start = output.find('[')?;
    parse_array(&output[start..])
}

fn parse_json_lines(output: &str) -> Option<Vec<Value>> {
    let items: Vec<Value> = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("200"))
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .filter(Value::is_object)
        .collect();

    (!items.is_empty()).then_some(items)
}

/// Parses cencli stdout into its list of result items. Unparseable output is
/// an empty list.
pub fn parse_output(output: &str) -> Vec<Value> {
    let output = output.trim();
    PARSERS
        .iter()
        .find_map(|(name, parser)| {
            let items = parser(output)?;
            debug!(parser = name, count = items.len(), "parsed cencli output");
            Some(items)
        })
        .unwrap_or_default()
}

/// Unwraps `{"host": {...}}` items and keeps bare items that carry an `ip`.
pub fn extract_hosts(items: Vec<Value>) -> Vec<Value> {
    items
        .into_iter()
        .filter_map(|mut item| {
            if let Some(host) = item.get_mut("host").filter(|h| h.is_object()) {
                return Some(host.take());
            }
            item.get("ip").is_some().then_some(item)
        })
        .collect()
}

fn normalize(raw: Value) -> Option<HostRecord> {
    let ip = string_at(&raw, &["ip"])?;

    let mut hostnames = strings_at(&raw, &["dns", "names"]);
    for name in strings_at(&raw, &["dns", "reverse_dns", "names"]) {
        if !hostnames.contains(&name) {
            hostnames.push(name);
        }
    }

    let port = raw
        .get("services")
        .and_then(Value::as_array)
        .and_then(|services| services.iter().find_map(|s| port_at(s, &["port"])));

    let asn = match raw.get("autonomous_system").and_then(|a| a.get("asn")) {
        Some(Value::Number(n)) => Some(format!("AS{n}")),
        _ => string_at(&raw, &["autonomous_system", "asn"]),
    };

    Some(HostRecord {
        ip,
        port,
        organization: string_at(&raw, &["autonomous_system", "name"]),
        hostnames,
        country: string_at(&raw, &["location", "country"]),
        asn,
        raw,
    })
}

/// Parses cencli stdout straight to host records.
pub fn parse_hosts(output: &str) -> Vec<HostRecord> {
    extract_hosts(parse_output(output)).into_iter().filter_map(normalize).collect()
}

impl HostSearch for Censys {
    fn name(&self) -> &'static str {
        NAME
    }

    #[instrument(skip(self), fields(backend = NAME))]
    async fn search_by_sha256(&self, sha256: &str, limit: usize) -> Result<Vec<HostRecord>, Error> {
        let stdout = self.run(&query(sha256), limit).await?;
        let hosts = parse_hosts(&stdout);
        debug!(count = hosts.len(), "Censys hosts");
        Ok(hosts)
    }
}
