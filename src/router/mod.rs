//! Maps a parsed request onto a file beneath the document root.
//!
//! Classification runs in a fixed order and the first terminal state wins:
//!
//! ```text
//! empty target ──► "index.html"
//!        │
//!        ▼
//!   verb != GET ─────────────► 405 Method Not Allowed
//!        │
//!        ▼
//!   not a regular file ──────► 404 Not Found
//!        │
//!        ▼
//!   not text/* or image/* ───► 415 Unsupported Media Type
//!        │
//!        ▼
//!   200 OK, body = file bytes
//! ```
//!
//! Targets are single file names (the parser flattens paths), so the
//! composed path can never leave the document root through a `/`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::debug;

use crate::http::mime::{self, MimeLookup};
use crate::http::request::Request;
use crate::http::response::{ContentType, Response, ResponseBuilder, StatusCode};

/// File served for an empty target.
pub const DEFAULT_RESOURCE: &str = "index.html";

#[derive(Clone)]
pub struct Resolver {
    document_root: PathBuf,
    mime: Arc<dyn MimeLookup>,
    server_name: Option<String>,
}

impl Resolver {
    pub fn new(document_root: impl Into<PathBuf>) -> Self {
        Self::with_mime(document_root, mime::default_lookup())
    }

    pub fn with_mime(document_root: impl Into<PathBuf>, mime: Arc<dyn MimeLookup>) -> Self {
        Self {
            document_root: document_root.into(),
            mime,
            server_name: None,
        }
    }

    /// Value for the `Server` header of every response this resolver builds.
    pub fn server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    /// Same root and server name, different MIME lookup.
    pub fn replace_mime(&self, mime: Arc<dyn MimeLookup>) -> Self {
        Self {
            mime,
            ..self.clone()
        }
    }

    /// Name actually looked up for `target`.
    pub fn effective_target(target: &str) -> &str {
        if target.is_empty() {
            DEFAULT_RESOURCE
        } else {
            target
        }
    }

    /// Path the resolver checks for `target`: `document_root/target`.
    pub fn file_path(&self, target: &str) -> PathBuf {
        self.document_root.join(Self::effective_target(target))
    }

    /// Resolves a request to exactly one response.
    ///
    /// HTTP-level outcomes (404, 405, 415) are responses. An `Err` means the
    /// file was found but could not be read.
    pub async fn resolve(&self, req: &Request) -> anyhow::Result<Response> {
        let target = Self::effective_target(&req.target);

        if !req.method.is_retrieval() {
            return Ok(self.error_response(StatusCode::MethodNotAllowed));
        }

        let path = self.file_path(target);
        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            debug!(path = %path.display(), "no regular file");
            return Ok(self.error_response(StatusCode::NotFound));
        }

        let content_type = ContentType::parse(&self.mime.lookup(target));
        if !content_type.is_servable() {
            debug!(path = %path.display(), %content_type, "refusing media type");
            return Ok(self.error_response(StatusCode::UnsupportedMediaType));
        }

        let body = tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;

        Ok(self.finish(
            ResponseBuilder::new(StatusCode::Ok)
                .content_type(&content_type)
                .body(body),
        ))
    }

    /// Fixed HTML error response stamped with this resolver's server name.
    pub fn error_response(&self, status: StatusCode) -> Response {
        let response = Response::error(status);
        match &self.server_name {
            Some(name) => response.with_server(name),
            None => response,
        }
    }

    fn finish(&self, builder: ResponseBuilder) -> Response {
        match &self.server_name {
            Some(name) => builder.server(name.clone()).build(),
            None => builder.build(),
        }
    }
}
