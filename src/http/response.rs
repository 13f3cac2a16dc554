use std::fmt;
use std::time::SystemTime;

use crate::http::headers::HeaderMap;
use crate::http::request::Version;

/// Value of the `Server` header when none is configured.
pub const DEFAULT_SERVER_NAME: &str = concat!("flatserve/", env!("CARGO_PKG_VERSION"));

/// HTTP status codes the server produces.
///
/// - `Ok` (200): File found and served
/// - `NotFound` (404): No regular file with that name under the document root
/// - `MethodNotAllowed` (405): Verb other than GET
/// - `UnsupportedMediaType` (415): File exists but is neither text nor image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 415 Unsupported Media Type
    UnsupportedMediaType,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// ```
    /// # use flatserve::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::UnsupportedMediaType.as_u16(), 415);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::UnsupportedMediaType => 415,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::UnsupportedMediaType => "Unsupported Media Type",
        }
    }

    pub fn is_success(&self) -> bool {
        *self == StatusCode::Ok
    }
}

/// A MIME type split into its media type and subtype, e.g. `text` and `html`.
///
/// Only used to render the `Content-Type` header and to decide whether a
/// file may be served. Anything after the slash, parameters included, is
/// kept in `extension` untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    pub media: String,
    pub extension: String,
}

impl ContentType {
    pub fn new(media: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            media: media.into(),
            extension: extension.into(),
        }
    }

    /// `text/html` as used by every error body.
    pub fn html() -> Self {
        Self::new("text", "html")
    }

    /// Splits a MIME string at the first `/`. A string without a slash is
    /// treated as a bare media type with an empty subtype.
    pub fn parse(mime: &str) -> Self {
        match mime.trim().split_once('/') {
            Some((media, extension)) => Self::new(media, extension),
            None => Self::new(mime.trim(), ""),
        }
    }

    /// Only `text/*` and `image/*` are served.
    pub fn is_servable(&self) -> bool {
        self.media.eq_ignore_ascii_case("text") || self.media.eq_ignore_ascii_case("image")
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.media, self.extension)
    }
}

/// Represents a complete HTTP response ready to be sent to a client.
///
/// Built through [`ResponseBuilder`], which guarantees `Content-Length`
/// matches `body` and that `Date`, `Content-Type` and `Server` are present.
#[derive(Debug, Clone)]
pub struct Response {
    /// Version written on the status line
    pub version: Version,
    /// The HTTP status code
    pub status: StatusCode,
    /// HTTP headers
    pub headers: HeaderMap,
    /// Response body as bytes
    pub body: Vec<u8>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// ```
/// # use flatserve::http::response::{ContentType, ResponseBuilder, StatusCode};
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .content_type(&ContentType::new("text", "plain"))
///     .body(b"hi".to_vec())
///     .build();
/// assert_eq!(response.header("Content-Length"), Some("2"));
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    version: Version,
    headers: HeaderMap,
    server: String,
    date: SystemTime,
    body: Vec<u8>,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            version: Version::HTTP_1_1,
            headers: HeaderMap::new(),
            server: DEFAULT_SERVER_NAME.to_string(),
            date: SystemTime::now(),
            body: Vec::new(),
        }
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Adds or replaces a header. `Content-Length`, `Date` and `Server` are
    /// overwritten by [`build`](Self::build).
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key, value);
        self
    }

    pub fn content_type(self, content_type: &ContentType) -> Self {
        self.header("Content-Type", content_type.to_string())
    }

    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    /// Overrides the construction timestamp used for the `Date` header.
    pub fn date(mut self, date: SystemTime) -> Self {
        self.date = date;
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Builds the final Response.
    pub fn build(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert("Date", httpdate::fmt_http_date(self.date));
        headers.insert(
            "Content-Type",
            self.headers
                .get("Content-Type")
                .unwrap_or("application/octet-stream"),
        );
        headers.insert("Content-Length", self.body.len().to_string());
        headers.insert("Server", self.server);

        for (name, value) in self.headers.iter() {
            if !headers.contains_key(name) {
                headers.insert(name, value);
            }
        }

        Response {
            version: self.version,
            status: self.status,
            headers,
            body: self.body,
        }
    }
}

impl Response {
    /// 200 OK carrying `body` with the given content type.
    pub fn ok(content_type: &ContentType, body: impl Into<Vec<u8>>) -> Self {
        ResponseBuilder::new(StatusCode::Ok)
            .content_type(content_type)
            .body(body.into())
            .build()
    }

    /// Error response with the fixed body `<h2>{code}: {reason}</h2>`.
    ///
    /// Always HTTP/1.1 whatever version the client used.
    pub fn error(status: StatusCode) -> Self {
        ResponseBuilder::new(status)
            .content_type(&ContentType::html())
            .body(error_body(status).into_bytes())
            .build()
    }

    pub fn not_found() -> Self {
        Self::error(StatusCode::NotFound)
    }

    pub fn method_not_allowed() -> Self {
        Self::error(StatusCode::MethodNotAllowed)
    }

    pub fn unsupported_media_type() -> Self {
        Self::error(StatusCode::UnsupportedMediaType)
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// Replaces the `Server` header.
    pub fn with_server(mut self, server: &str) -> Self {
        self.headers.insert("Server", server);
        self
    }
}

pub fn error_body(status: StatusCode) -> String {
    format!("<h2>{}: {}</h2>", status.as_u16(), status.reason_phrase())
}
