//! Parse raw response header lines collected by the curl header callback.

use std::time::Duration;

/// Turn raw header lines into `(name, value)` pairs of the final response.
///
/// libcurl reports the headers of every interim response (redirects,
/// `100 Continue`) in the same callback; each new status line starts over.
pub fn parse_header_lines(lines: &[String]) -> Vec<(String, String)> {
    let mut headers = Vec::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            headers.clear();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }
    headers
}

/// `Retry-After` in whole seconds. HTTP-date values and zero are ignored so
/// the caller falls back to its own backoff.
pub fn retry_after(headers: &[(String, String)]) -> Option<Duration> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("retry-after"))
        .and_then(|(_, v)| v.parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}
