use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use crate::error::SubmitError;

/// `http(s)://`, a non-empty host, and no whitespace anywhere.
fn url_shape() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?i)https?://[^\s/?#]+[^\s]*$").ok())
        .as_ref()
}

/// Returns `true` if `input` has the shape of an absolute http(s) URL.
pub fn is_download_url(input: &str) -> bool {
    url_shape().map_or(false, |re| re.is_match(input))
}

/// Validate a URL typed or pasted into the download field and normalize it.
///
/// Surrounding whitespace from a paste is tolerated; whitespace inside the
/// URL is not. Normalization is what `url::Url` does (lowercase scheme and
/// host, drop default ports) plus stripping the fragment, which yt-dlp never
/// needs.
pub fn validate_download_url(input: &str) -> Result<String, SubmitError> {
    let trimmed = input.trim();
    if !is_download_url(trimmed) {
        return Err(SubmitError::InvalidUrl(input.to_string()));
    }

    normalize_http_url(trimmed).ok_or_else(|| SubmitError::InvalidUrl(input.to_string()))
}

/// Parse and normalize an http(s) URL. `None` if it does not parse or has no host.
pub fn normalize_http_url(input: &str) -> Option<String> {
    let mut url = Url::parse(input).ok()?;

    match url.scheme() {
        "http" | "https" => {}
        _ => return None,
    }

    if url.host_str().map_or(true, str::is_empty) {
        return None;
    }

    url.set_fragment(None);
    Some(url.to_string())
}
