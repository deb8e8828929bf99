//! Finds infrastructure that serves the same favicon as a target website.
//!
//! Sites behind a CDN, staging servers and phishing copies frequently reuse the
//! production favicon. Internet-wide scan engines index favicons by hash, so a
//! single icon is often enough to surface origin IPs and related hosts.
//!
//! A run is a straight pipeline:
//!
//! 1. [`fetcher`] downloads the favicon, from a declared `<link rel="icon">`
//!    or one of the conventional paths.
//! 2. [`favicon_hash`] derives the MurmurHash3 (Shodan, FOFA), MD5 and
//!    SHA-256 (Censys) forms.
//! 3. [`backend`] queries Shodan's host search API and Censys via `cencli`.
//! 4. [`report`] prints the hosts and optionally writes them as JSON.
//!
//! # Usage
//!
//! ```sh
//! favicon-hunter https://target.example --all -o results.json
//! favicon-hunter --hash 116323821 --shodan
//! ```
//!
//! Target certificates are **not** validated by default: recon targets are
//! often self-signed or expired. Pass `--verify-tls` to validate them. Backend
//! APIs are always validated.

pub mod backend;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod pipeline;
pub mod report;

#[cfg(test)]
mod testing;

pub use backend::{Censys, HostRecord, HostSearch, Shodan};
pub use config::{BackendSelection, Config, Target};
pub use error::Error;
pub use fetcher::{Favicon, fetch_favicon};
pub use http::{Fetch, HttpClient, Response};
pub use pipeline::{BackendResult, Hashed, Hashes, Hunter, SearchResult};
