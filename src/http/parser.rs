use std::fmt;

use url::Url;

use crate::http::headers::HeaderMap;
use crate::http::request::{Method, Request, Version};

/// Token the connection handler looks for before parsing anything.
pub const RETRIEVAL_VERB: &str = "GET";

const PROTOCOL_MARKER: &str = "HTTP/";

// "HTTP/x.y"
const VERSION_TOKEN_LEN: usize = 8;

/// Reasons a buffer cannot be turned into a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Nothing but whitespace (or zero bytes) was received.
    EmptyRequest,
    /// No `HTTP/` token after the verb.
    MissingProtocolMarker,
    /// The version token is shorter than `HTTP/x.y`, usually a truncated read.
    TruncatedVersion,
    /// The version token is not of the form `HTTP/<digit>.<digit>`.
    InvalidVersion(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::EmptyRequest => write!(f, "malformed request: empty request"),
            ParseError::MissingProtocolMarker => {
                write!(f, "malformed request: protocol marker not found")
            }
            ParseError::TruncatedVersion => write!(f, "malformed request: truncated version"),
            ParseError::InvalidVersion(v) => write!(f, "malformed request: invalid version {v:?}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Cheap check done on the raw buffer before parsing: does the retrieval
/// verb appear anywhere at all?
pub fn contains_retrieval_verb(buf: &[u8]) -> bool {
    buf.windows(RETRIEVAL_VERB.len())
        .any(|w| w == RETRIEVAL_VERB.as_bytes())
}

/// Parses the bytes of one read into a [`Request`].
///
/// The verb is the leading whitespace-delimited token and may be anything;
/// rejecting non-`GET` verbs is the resolver's job. The target is whatever
/// sits between the verb and the last `HTTP/` marker on the request line,
/// reduced to its final path segment: `GET /a/b/c.html` asks for `c.html`.
/// Header lines are collected leniently; lines without a colon are skipped.
pub fn parse_http_request(buf: &[u8]) -> Result<Request, ParseError> {
    let text = String::from_utf8_lossy(buf);
    let text = text.trim_end_matches('\0');

    if text.trim().is_empty() {
        return Err(ParseError::EmptyRequest);
    }

    let mut lines = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));
    let request_line = lines.next().unwrap_or_default().trim_start();

    let verb_end = request_line
        .find(char::is_whitespace)
        .unwrap_or(request_line.len());
    let verb = &request_line[..verb_end];
    let rest = &request_line[verb_end..];

    let marker = rest
        .rfind(PROTOCOL_MARKER)
        .ok_or(ParseError::MissingProtocolMarker)?;
    let version = parse_version(&rest[marker..])?;
    let target = flatten_target(rest[..marker].trim());

    let mut headers = HeaderMap::new();
    for line in lines {
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim(), value.trim());
        }
    }

    Ok(Request {
        method: Method::from_token(verb),
        target,
        version,
        headers,
    })
}

fn parse_version(token: &str) -> Result<Version, ParseError> {
    let token = token
        .get(..VERSION_TOKEN_LEN)
        .ok_or(ParseError::TruncatedVersion)?;

    let digits = token.as_bytes();
    match (digits[5], digits[6], digits[7]) {
        (major, b'.', minor) if major.is_ascii_digit() && minor.is_ascii_digit() => {
            Ok(Version::new(major - b'0', minor - b'0'))
        }
        _ => Err(ParseError::InvalidVersion(token.to_string())),
    }
}

/// Drops scheme and host from absolute-form targets, then everything up to
/// and including the last `/`.
fn flatten_target(raw: &str) -> String {
    let path = match Url::parse(raw) {
        Ok(url) if url.has_host() => url.path().to_string(),
        _ => raw.to_string(),
    };

    match path.rfind('/') {
        Some(idx) => path[idx + 1..].to_string(),
        None => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let req = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";

        let parsed = parse_http_request(req).unwrap();

        assert_eq!(parsed.target, "index.html");
        assert_eq!(parsed.header("host"), Some("example.com"));
    }

    #[test]
    fn flatten_keeps_last_segment() {
        assert_eq!(flatten_target("/a/b/c.html"), "c.html");
        assert_eq!(flatten_target("/"), "");
        assert_eq!(flatten_target("plain.txt"), "plain.txt");
        assert_eq!(flatten_target("http://example.com/x/y.png"), "y.png");
    }

    #[test]
    fn version_needs_digits() {
        assert_eq!(parse_version("HTTP/1.0"), Ok(Version::HTTP_1_0));
        assert_eq!(parse_version("HTTP/1."), Err(ParseError::TruncatedVersion));
        assert!(matches!(
            parse_version("HTTP/x.y"),
            Err(ParseError::InvalidVersion(_))
        ));
    }
}
