use std::path::Path;

use tokio::fs;

use crate::backend::{HostRecord, censys, shodan};
use crate::error::Error;
use crate::pipeline::{BackendResult, Hashes, SearchResult};

const WIDE_RULE: usize = 80;
const NARROW_RULE: usize = 40;
const UNKNOWN: &str = "unknown";

/// FOFA search filter for a favicon hash. FOFA has no free API, so this is
/// only ever printed.
pub fn fofa_query(mmh3: i32) -> String {
    format!("icon_hash=\"{mmh3}\"")
}

/// The hashes and the search queries derived from them.
pub fn format_hashes(hashes: &Hashes) -> String {
    let mut out = String::from("\n[+] Favicon Hashes:\n");
    out.push_str(&format!("    MMH3:   {}\n", hashes.mmh3));
    if let Some(md5) = &hashes.md5 {
        out.push_str(&format!("    MD5:    {md5}\n"));
    }
    if let Some(sha256) = &hashes.sha256 {
        out.push_str(&format!("    SHA256: {sha256}\n"));
    }

    out.push_str("\n[+] Search Queries:\n");
    out.push_str(&format!("    Shodan: {}\n", shodan::query(hashes.mmh3)));
    if let Some(sha256) = &hashes.sha256 {
        out.push_str(&format!("    Censys: {}\n", censys::query(sha256)));
    }
    out.push_str(&format!("    FOFA:   {}\n", fofa_query(hashes.mmh3)));
    out.push_str(&format!("\n[+] Shodan URL: {}\n", shodan::web_search_url(hashes.mmh3)));

    out
}

/// One labelled block for a backend's hosts.
pub fn format_backend(name: &str, hosts: &[HostRecord]) -> String {
    if hosts.is_empty() {
        return format!("\n[{name}] No results found\n");
    }

    let mut out = format!("\n[{name}] Found {} hosts:\n\n", hosts.len());
    out.push_str(&rule(WIDE_RULE));
    for host in hosts {
        out.push_str(&format_host(host));
        out.push_str(&rule(NARROW_RULE));
    }

    out
}

fn rule(width: usize) -> String {
    format!("{}\n", "-".repeat(width))
}

fn format_host(host: &HostRecord) -> String {
    let address = match host.port {
        Some(port) => format!("{}:{port}", host.ip),
        None => host.ip.clone(),
    };
    let hostnames =
        if host.hostnames.is_empty() { UNKNOWN.to_string() } else { host.hostnames.join(", ") };

    format!(
        "  IP:        {address}\n  Org:       {}\n  Hostnames: {hostnames}\n  Country:   {}\n  ASN:       {}\n",
        or_unknown(host.organization.as_deref()),
        or_unknown(host.country.as_deref()),
        or_unknown(host.asn.as_deref()),
    )
}

fn or_unknown(value: Option<&str>) -> &str {
    value.unwrap_or(UNKNOWN)
}

/// One block per queried backend, in query order.
pub fn format_backends(results: &[BackendResult]) -> String {
    results.iter().map(|r| format_backend(r.backend, &r.hosts)).collect()
}

/// The full human-readable report.
pub fn format(result: &SearchResult) -> String {
    let mut out = format_hashes(&result.hashes);
    out.push_str(&format_backends(&result.backend_results));
    out
}

/// Writes `result` to `path` as indented JSON.
pub async fn persist(result: &SearchResult, path: &Path) -> Result<(), Error> {
    let mut json = serde_json::to_string_pretty(result)?;
    json.push('\n');
    fs::write(path, json).await?;
    Ok(())
}
