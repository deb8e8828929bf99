//! Favicon hashing compatible with internet-wide scan engines.
//!
//! Three representations are derived from the raw favicon bytes:
//!
//! - `mmh3`: MurmurHash3 (x86, 32-bit, seed 0) of the **base64 text** of the
//!   bytes, reinterpreted as a signed integer. This is the value Shodan indexes
//!   as `http.favicon.hash` and FOFA as `icon_hash`.
//! - `md5`: MD5 of the raw bytes, lowercase hex.
//! - `sha256`: SHA-256 of the raw bytes, lowercase hex. Censys indexes favicons
//!   by this digest.
//!
//! The base64 text is MIME-style: wrapped every 76 characters with a newline
//! after every line, including the last one. Empty input encodes to an empty
//! string. Hashing anything else (unwrapped base64, the raw bytes) produces
//! values that will never match the engines' indexes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use md5::Md5;
use murmurhash3::murmurhash3_x86_32;
use sha2::{Digest, Sha256};

/// Line length of the MIME base64 encoding hashed for `mmh3`.
pub const BASE64_LINE_LEN: usize = 76;

/// Lowercase hex lookup table.
pub const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";

/// The hash forms of one favicon.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FaviconHashes {
    /// MurmurHash3 of the base64 text, as a signed 32-bit integer.
    pub mmh3: i32,
    /// MD5 of the raw bytes, lowercase hex.
    pub md5: String,
    /// SHA-256 of the raw bytes, lowercase hex.
    pub sha256: String,
}

/// Computes all hash forms of `data`.
pub fn compute_hashes(data: &[u8]) -> FaviconHashes {
    let md5: [u8; 16] = Md5::digest(data).into();
    let sha256: [u8; 32] = Sha256::digest(data).into();

    FaviconHashes { mmh3: legacy_hash(data), md5: to_hex(&md5), sha256: to_hex(&sha256) }
}

/// Returns the Shodan-compatible favicon hash of `data`.
#[inline]
pub fn legacy_hash(data: &[u8]) -> i32 {
    let encoded = encode_base64_lines(data);
    // Same bits, signed: the engines store and query the hash as an i32.
    murmurhash3_x86_32(encoded.as_bytes(), 0) as i32
}

/// Encodes `data` as base64 text wrapped at [`BASE64_LINE_LEN`] characters,
/// each line (the last included) terminated by `\n`.
pub fn encode_base64_lines(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / BASE64_LINE_LEN + 1);

    // Base64 output is ASCII, so byte chunks are always valid char boundaries.
    for line in encoded.as_bytes().chunks(BASE64_LINE_LEN) {
        for &b in line {
            out.push(b as char);
        }
        out.push('\n');
    }

    out
}

/// Lowercase hex encoding of `bytes`.
pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(HEX_CHARS[(b >> 4) as usize] as char);
        out.push(HEX_CHARS[(b & 0x0f) as usize] as char);
    }
    out
}
