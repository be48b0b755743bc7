// LinkVault link metadata
// Derives a favicon address and a default title from a URL without fetching it.

use reqwest::Url;

use crate::types::link::Link;

/// Favicon size requested when pre-filling the link form.
pub const FORM_FAVICON_SIZE: u32 = 128;

/// Favicon size used when rendering a link without a stored icon.
pub const DISPLAY_FAVICON_SIZE: u32 = 64;

const FAVICON_SERVICE: &str = "https://www.google.com/s2/favicons";

fn host(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host_str().filter(|h| !h.is_empty()).map(str::to_string)
}

/// Favicon address for `url` at the form size, or `None` if it has no host.
pub fn favicon_url(url: &str) -> Option<String> {
    favicon_url_sized(url, FORM_FAVICON_SIZE)
}

pub fn favicon_url_sized(url: &str, size: u32) -> Option<String> {
    host(url).map(|domain| format!("{}?domain={}&sz={}", FAVICON_SERVICE, domain, size))
}

/// First host label without `www.`, e.g. `github` for `https://www.github.com/x`.
///
/// Unparsable input is returned unchanged.
pub fn generate_title(url: &str) -> String {
    match host(url) {
        Some(host) => {
            let host = host.strip_prefix("www.").unwrap_or(&host);
            host.split('.').next().unwrap_or(host).to_string()
        }
        None => url.to_string(),
    }
}

/// The link's own icon if set, otherwise a favicon derived from its URL.
pub fn display_icon(link: &Link) -> Option<String> {
    match link.icon.as_deref() {
        Some(icon) if !icon.trim().is_empty() => Some(icon.to_string()),
        _ => favicon_url_sized(&link.url, DISPLAY_FAVICON_SIZE),
    }
}
