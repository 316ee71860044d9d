//! Unique stream endpoint generation.
//!
//! An output configured as a prefix (`rtmp://server:1935/live`) is turned into
//! a distinct endpoint per start by appending a random alphanumeric suffix and
//! cleaning the resulting path.

use rand::distributions::Alphanumeric;
use rand::Rng;
use url::Url;

/// Length of the random suffix appended to endpoint prefixes.
pub const SUFFIX_LEN: usize = 64;

/// Generate `len` random characters from `[A-Za-z0-9]`.
pub fn random_suffix(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Append a fresh [`SUFFIX_LEN`]-character suffix to `prefix`.
///
/// ```
/// let endpoint = livecam_av::endpoint::unique_endpoint("rtmp://r/app").unwrap();
/// let suffix = endpoint.strip_prefix("rtmp://r/app/").unwrap();
/// assert_eq!(suffix.len(), 64);
/// ```
pub fn unique_endpoint(prefix: &str) -> Result<String, url::ParseError> {
    join_endpoint(prefix, &random_suffix(SUFFIX_LEN))
}

/// Join `prefix` and `suffix` with a `/` and clean the path.
///
/// URLs only have their path component cleaned. Anything that does not parse
/// as an absolute URL is treated as a filesystem path and cleaned as a whole.
pub fn join_endpoint(prefix: &str, suffix: &str) -> Result<String, url::ParseError> {
    let joined = format!("{prefix}/{suffix}");
    match Url::parse(&joined) {
        Ok(mut url) => {
            let cleaned = clean_path(url.path());
            url.set_path(&cleaned);
            Ok(url.to_string())
        }
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(clean_path(&joined)),
        Err(e) => Err(e),
    }
}

/// Lexically clean a slash-separated path.
///
/// Repeated separators collapse, `.` segments are dropped and `..` removes the
/// preceding segment. A rooted path never climbs above `/`.
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let body = parts.join("/");
    match (rooted, body.is_empty()) {
        (true, _) => format!("/{body}"),
        (false, true) => ".".to_string(),
        (false, false) => body,
    }
}
