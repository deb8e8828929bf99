//! Locating and downloading a site's favicon.
//!
//! The page itself is fetched first and scanned for a `<link rel="icon">`
//! declaration. If that yields nothing usable, the conventional locations in
//! [`FALLBACK_PATHS`] are probed against the site origin, in order.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::Error;
use crate::http::{Fetch, Response};

/// Conventional favicon locations, probed in this order.
pub const FALLBACK_PATHS: [&str; 4] =
    ["/favicon.ico", "/favicon.png", "/apple-touch-icon.png", "/apple-touch-icon-precomposed.png"];

// `rel` before `href`, then `href` before `rel`.
static LINK_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(
            r#"(?i)<link[^>]+rel=["'](?:shortcut )?icon["'][^>]+href=["']([^"']+)["']"#,
        )
        .expect("valid favicon link pattern"),
        Regex::new(
            r#"(?i)<link[^>]+href=["']([^"']+)["'][^>]+rel=["'](?:shortcut )?icon["']"#,
        )
        .expect("valid favicon link pattern"),
    ]
});

/// A downloaded favicon and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Favicon {
    pub url: Url,
    pub bytes: Vec<u8>,
}

/// Image formats recognised by their leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Ico,
    Png,
    Jpeg,
    Gif,
}

/// Identifies an image by its magic bytes.
pub fn image_kind(data: &[u8]) -> Option<ImageKind> {
    if data.starts_with(&[0x00, 0x00, 0x01, 0x00]) {
        Some(ImageKind::Ico)
    } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some(ImageKind::Png)
    } else if data.starts_with(&[0xff, 0xd8]) {
        Some(ImageKind::Jpeg)
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some(ImageKind::Gif)
    } else {
        None
    }
}

/// A response is a usable favicon when it is a 2xx with a non-empty body that
/// either carries image magic bytes or is typed `image/*`.
pub fn is_favicon_payload(response: &Response) -> bool {
    response.is_success()
        && !response.body.is_empty()
        && (image_kind(&response.body).is_some() || response.is_image_typed())
}

/// Favicon `href`s declared in `html`, one per link pattern in pattern order,
/// without duplicates.
pub fn find_favicon_hrefs(html: &str) -> Vec<&str> {
    let mut hrefs = Vec::new();
    for pattern in LINK_PATTERNS.iter() {
        let Some(href) = pattern.captures(html).and_then(|caps| caps.get(1)) else {
            continue;
        };
        let href = href.as_str().trim();
        if !href.is_empty() && !hrefs.contains(&href) {
            hrefs.push(href);
        }
    }
    hrefs
}

/// Resolves a declared `href` against the page URL. Handles absolute,
/// protocol-relative, root-relative and relative forms.
pub fn resolve_href(page: &Url, href: &str) -> Option<Url> {
    page.join(href).ok().filter(|u| matches!(u.scheme(), "http" | "https"))
}

/// `path` on the origin (scheme, host, port) of `page`.
pub fn origin_url(page: &Url, path: &str) -> Option<Url> {
    let mut url = page.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.join(path).ok()
}

/// Fetches the favicon for `page`.
///
/// Transport failures on the page itself are logged and do not stop the
/// fallback probes. Returns [`Error::FaviconNotFound`] when nothing usable
/// was found.
pub async fn fetch_favicon<F: Fetch>(http: &F, page: &Url) -> Result<Favicon, Error> {
    if let Some(favicon) = from_declared_link(http, page).await {
        return Ok(favicon);
    }

    for path in FALLBACK_PATHS {
        let Some(url) = origin_url(page, path) else {
            continue;
        };

        match http.get(&url).await {
            Ok(response) if is_favicon_payload(&response) => {
                info!(
                    url = %url,
                    bytes = response.body.len(),
                    kind = ?image_kind(&response.body),
                    "favicon found at conventional path"
                );
                return Ok(Favicon { url, bytes: response.body });
            }
            Ok(response) => {
                debug!(url = %url, status = response.status, "no favicon at conventional path");
            }
            Err(e) => debug!(url = %url, "favicon probe failed: {e}"),
        }
    }

    Err(Error::FaviconNotFound { url: page.to_string() })
}

async fn from_declared_link<F: Fetch>(http: &F, page: &Url) -> Option<Favicon> {
    let response = match http.get(page).await {
        Ok(response) => response,
        Err(e) => {
            warn!("Error fetching HTML: {e}");
            return None;
        }
    };

    if !response.is_success() {
        debug!(url = %page, status = response.status, "page did not load");
        return None;
    }

    let html = response.text();
    let hrefs = find_favicon_hrefs(&html);
    if hrefs.is_empty() {
        debug!(url = %page, "no favicon link declared");
        return None;
    }

    for href in hrefs {
        let Some(url) = resolve_href(page, href) else {
            debug!(href, "unusable favicon href");
            continue;
        };

        match http.get(&url).await {
            Ok(icon) if is_favicon_payload(&icon) => {
                info!(
                    url = %url,
                    bytes = icon.body.len(),
                    kind = ?image_kind(&icon.body),
                    "favicon found via link tag"
                );
                return Some(Favicon { url, bytes: icon.body });
            }
            Ok(icon) => debug!(url = %url, status = icon.status, "declared favicon unusable"),
            Err(e) => debug!(url = %url, "declared favicon fetch failed: {e}"),
        }
    }

    None
}
