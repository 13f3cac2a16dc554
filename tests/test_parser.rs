use flatserve::http::parser::{ParseError, contains_retrieval_verb, parse_http_request};
use flatserve::http::request::{Method, Version};

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET /index.html HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let parsed = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::GET);
    assert_eq!(parsed.target, "index.html");
    assert_eq!(parsed.version, Version::HTTP_1_1);
    assert_eq!(parsed.header("Host"), Some("example.com"));
}

#[test]
fn test_parse_flattens_to_last_segment() {
    let parsed = parse_http_request(b"GET /a/b/c.html HTTP/1.1\r\n\r\n").unwrap();

    assert_eq!(parsed.target, "c.html");
}

#[test]
fn test_parse_root_gives_empty_target() {
    let parsed = parse_http_request(b"GET / HTTP/1.1\r\n\r\n").unwrap();

    assert_eq!(parsed.target, "");
}

#[test]
fn test_parse_missing_target_gives_empty_target() {
    let parsed = parse_http_request(b"GET HTTP/1.0\r\n\r\n").unwrap();

    assert_eq!(parsed.target, "");
    assert_eq!(parsed.version, Version::HTTP_1_0);
}

#[test]
fn test_parse_absolute_form_target() {
    let parsed =
        parse_http_request(b"GET http://example.com/img/logo.png HTTP/1.1\r\n\r\n").unwrap();

    assert_eq!(parsed.target, "logo.png");
}

#[test]
fn test_parse_traversal_attempt_is_flattened() {
    let parsed = parse_http_request(b"GET /../../etc/passwd HTTP/1.1\r\n\r\n").unwrap();

    assert_eq!(parsed.target, "passwd");
}

#[test]
fn test_parse_non_get_verb_is_not_a_parse_error() {
    let parsed = parse_http_request(b"POST /x HTTP/1.1\r\n\r\n").unwrap();

    assert_eq!(parsed.method, Method::POST);
    assert_eq!(parsed.target, "x");
}

#[test]
fn test_parse_unknown_verb_is_kept() {
    let parsed = parse_http_request(b"BREW /pot HTTP/1.1\r\n\r\n").unwrap();

    assert_eq!(parsed.method, Method::Other("BREW".to_string()));
    assert!(!parsed.method.is_retrieval());
}

#[test]
fn test_parse_missing_protocol_marker() {
    let result = parse_http_request(b"GET /index.html\r\n\r\n");

    assert!(matches!(result, Err(ParseError::MissingProtocolMarker)));
}

#[test]
fn test_parse_truncated_version() {
    let result = parse_http_request(b"GET /index.html HTTP/1");

    assert!(matches!(result, Err(ParseError::TruncatedVersion)));
}

#[test]
fn test_parse_invalid_version() {
    let result = parse_http_request(b"GET /index.html HTTP/one\r\n\r\n");

    assert!(matches!(result, Err(ParseError::InvalidVersion(_))));
}

#[test]
fn test_parse_empty_buffer() {
    assert!(matches!(parse_http_request(b""), Err(ParseError::EmptyRequest)));
    assert!(matches!(
        parse_http_request(b"\r\n\0\0\0"),
        Err(ParseError::EmptyRequest)
    ));
}

#[test]
fn test_parse_ignores_trailing_nul_padding() {
    let mut buf = b"GET /a.txt HTTP/1.1\r\n\r\n".to_vec();
    buf.resize(1024, 0);

    let parsed = parse_http_request(&buf).unwrap();
    assert_eq!(parsed.target, "a.txt");
}

#[test]
fn test_parse_headers_case_insensitive() {
    let req = b"GET / HTTP/1.1\r\nContent-Type: text/plain\r\nUser-Agent: test-client\r\n\r\n";
    let parsed = parse_http_request(req).unwrap();

    assert_eq!(parsed.header("content-type"), Some("text/plain"));
    assert_eq!(parsed.header("USER-AGENT"), Some("test-client"));
}

#[test]
fn test_parse_skips_malformed_header_lines() {
    let req = b"GET / HTTP/1.1\r\nBrokenHeader\r\nHost: h\r\n\r\n";
    let parsed = parse_http_request(req).unwrap();

    assert_eq!(parsed.headers.len(), 1);
    assert_eq!(parsed.header("Host"), Some("h"));
}

#[test]
fn test_parse_bare_newlines() {
    let parsed = parse_http_request(b"GET /a.txt HTTP/1.1\nHost: h\n\n").unwrap();

    assert_eq!(parsed.target, "a.txt");
    assert_eq!(parsed.header("Host"), Some("h"));
}

#[test]
fn test_contains_retrieval_verb() {
    assert!(contains_retrieval_verb(b"GET / HTTP/1.1\r\n\r\n"));
    assert!(contains_retrieval_verb(b"POST /GET HTTP/1.1\r\n\r\n"));
    assert!(!contains_retrieval_verb(b"POST /x HTTP/1.1\r\n\r\n"));
    assert!(!contains_retrieval_verb(b"get / HTTP/1.1\r\n\r\n"));
    assert!(!contains_retrieval_verb(b""));
}
