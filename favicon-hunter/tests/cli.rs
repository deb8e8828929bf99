//! Runs the binary for paths that need no network access.

use std::process::{Command, Output};

use serde_json::Value;

fn favicon_hunter(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_favicon-hunter"))
        .args(args)
        .env_remove("SHODAN_API_KEY")
        .env_remove("FAVICON_HUNTER_KEYS_FILE")
        .env_remove("FAVICON_HUNTER_CENCLI")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run favicon-hunter")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn hash_only_output_is_deterministic() {
    let first = favicon_hunter(&["--hash", "-216455174", "--hash-only", "--all"]);
    let second = favicon_hunter(&["--hash", "-216455174", "--hash-only", "--all"]);

    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);

    let out = stdout(&first);
    assert!(out.contains("    MMH3:   -216455174\n"));
    assert!(out.contains("    Shodan: http.favicon.hash:-216455174\n"));
    assert!(out.contains("    FOFA:   icon_hash=\"-216455174\"\n"));
    assert!(!out.contains("Searching"));
}

#[test]
fn url_or_hash_is_required() {
    let output = favicon_hunter(&[]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn url_and_hash_are_exclusive() {
    let output = favicon_hunter(&["https://example.com", "--hash", "1"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn non_http_url_is_a_usage_error() {
    let output = favicon_hunter(&["ftp://example.com"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("[!]"));
}

#[test]
fn no_backends_prints_hashes_and_succeeds() {
    let output = favicon_hunter(&["--hash", "42"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("MMH3:   42"));
    assert!(!stdout(&output).contains("No results found"));
}

#[test]
fn missing_shodan_key_degrades_with_hint() {
    let output = favicon_hunter(&["--hash", "116323821", "--shodan"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("[Shodan] No results found"));
    assert!(
        stderr(&output)
            .contains("https://www.shodan.io/search?query=http.favicon.hash%3A116323821")
    );
}

#[test]
fn output_file_records_degraded_backends() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");
    let path_str = path.to_str().unwrap();

    let output = favicon_hunter(&["--hash", "7", "--all", "-o", path_str]);

    assert!(output.status.success());
    let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["hashes"]["mmh3"], 7);
    assert_eq!(written["source_url"], Value::Null);
    assert_eq!(written["backend_results"]["Shodan"], serde_json::json!([]));
    assert_eq!(written["backend_results"]["Censys"], serde_json::json!([]));
    assert!(written["errors"]["Shodan"].as_str().unwrap().contains("unavailable"));
}

#[test]
fn unwritable_output_does_not_change_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("no-such-dir").join("results.json");

    let output = favicon_hunter(&["--hash", "7", "-o", path.to_str().unwrap()]);

    assert!(output.status.success());
    assert!(stderr(&output).contains("Could not save results"));
}

#[test]
fn unreachable_target_exits_one_with_tls_warning() {
    let output = favicon_hunter(&["https://127.0.0.1:9/", "-t", "2"]);

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("[!] Could not fetch a favicon from https://127.0.0.1:9/"));
    assert!(err.contains("TLS certificate validation is disabled"));
    assert!(!err.contains("\x1b["));
}

#[test]
fn plain_http_target_has_no_tls_warning() {
    let output = favicon_hunter(&["http://127.0.0.1:9/", "-t", "2"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(!stderr(&output).contains("TLS certificate validation"));
}

#[test]
fn verify_tls_silences_the_warning() {
    let output = favicon_hunter(&["https://127.0.0.1:9/", "-t", "2", "--verify-tls"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(!stderr(&output).contains("TLS certificate validation"));
}
