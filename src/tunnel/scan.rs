//! Public-URL extraction from tunnel log lines.
//!
//! The relay prints its assigned endpoint somewhere in free-form log text,
//! often decorated with punctuation or a trailing path. The scanner pulls
//! `https://` candidates out of each line, validates the hostname against
//! the relay allow-list, and latches the first match: once found, later
//! lines are not scanned.

use url::Url;

/// Relay domains a discovered URL may belong to. Suffixes include the
/// leading dot so `eviltrycloudflare.com` cannot match.
const ALLOWED_HOST_SUFFIXES: &[&str] = &[".trycloudflare.com", ".cloudflare-tunnel.com"];

/// Characters that end a URL candidate inside a log line.
const CANDIDATE_TERMINATORS: &[char] = &[')', ']', '}', ',', '\'', '"'];

/// Punctuation commonly stuck to the end of a URL in prose.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ')', ';', '\'', '"'];

/// Latching scanner over a stream of log lines.
#[derive(Debug, Default)]
pub struct UrlScanner {
    found: Option<String>,
}

impl UrlScanner {
    pub fn new() -> Self {
        UrlScanner::default()
    }

    /// The discovered URL, if any line has matched so far.
    pub fn found(&self) -> Option<&str> {
        self.found.as_deref()
    }

    /// Feeds one log line. Returns the public URL if this line produced
    /// the first match; `None` otherwise (including every line after a
    /// match has latched).
    pub fn feed(&mut self, line: &str) -> Option<&str> {
        if self.found.is_some() {
            return None;
        }
        for candidate in candidates(line) {
            if let Some(public_url) = sanitize(candidate) {
                self.found = Some(public_url);
                return self.found.as_deref();
            }
        }
        None
    }
}

/// Yields each `https://...` run in the line, split on whitespace and
/// log punctuation.
fn candidates(line: &str) -> impl Iterator<Item = &str> {
    line.match_indices("https://").map(|(start, _)| {
        let rest = &line[start..];
        let end = rest
            .find(|c: char| c.is_whitespace() || CANDIDATE_TERMINATORS.contains(&c))
            .unwrap_or(rest.len());
        &rest[..end]
    })
}

/// Validates a candidate and reduces it to scheme + host.
///
/// Rejects non-HTTPS schemes and hosts outside the relay allow-list.
/// Any path, query, or fragment is dropped.
fn sanitize(raw: &str) -> Option<String> {
    let trimmed = raw.trim_end_matches(TRAILING_PUNCTUATION);
    let parsed = Url::parse(trimmed).ok()?;
    if parsed.scheme() != "https" {
        return None;
    }
    let host = parsed.host_str()?;
    if !ALLOWED_HOST_SUFFIXES
        .iter()
        .any(|suffix| host.ends_with(suffix))
    {
        return None;
    }
    Some(format!("https://{host}"))
}
