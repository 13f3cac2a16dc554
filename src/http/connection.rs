use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

use crate::config::ReadMode;
use crate::http::parser::{contains_retrieval_verb, parse_http_request};
use crate::http::request::Request;
use crate::http::response::StatusCode;
use crate::http::writer::{ResponseWriter, head_log_line};
use crate::router::Resolver;

/// Receive buffer size used when none is configured.
pub const DEFAULT_READ_BUFFER: usize = 1024;

/// One accepted connection, one request, one response, then close.
pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    limit: usize,
    read_mode: ReadMode,
    read_timeout: Option<Duration>,
    resolver: Arc<Resolver>,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter, StatusCode),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, resolver: Arc<Resolver>) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(DEFAULT_READ_BUFFER),
            limit: DEFAULT_READ_BUFFER,
            read_mode: ReadMode::Single,
            read_timeout: None,
            resolver,
            state: ConnectionState::Reading,
        }
    }

    /// Caps the bytes read for the request. Anything beyond is never seen.
    pub fn read_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn read_mode(mut self, mode: ReadMode) -> Self {
        self.read_mode = mode;
        self
    }

    /// Gives up on a client that has not finished sending its request
    /// within `timeout`. `None` waits forever.
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Drives the exchange to completion.
    ///
    /// Returns the status that was sent, or `None` when the client closed the
    /// connection without sending anything. A malformed request or any I/O
    /// failure is an `Err` and nothing is sent.
    pub async fn run(&mut self) -> anyhow::Result<Option<StatusCode>> {
        let mut sent = None;

        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    let received = match self.read_timeout {
                        Some(limit) => tokio::time::timeout(limit, self.read_request())
                            .await
                            .map_err(|_| {
                                anyhow::anyhow!("timed out after {:?} waiting for request", limit)
                            })??,
                        None => self.read_request().await?,
                    };
                    if !received {
                        continue;
                    }

                    if !contains_retrieval_verb(&self.buffer) {
                        let response = self.resolver.error_response(StatusCode::MethodNotAllowed);
                        self.state = ConnectionState::Writing(
                            ResponseWriter::new(&response),
                            response.status,
                        );
                        continue;
                    }

                    let request = parse_http_request(&self.buffer)?;
                    info!(
                        verb = %request.method,
                        resource = %request.target,
                        "[REQUEST] HTTP Verb {} Resource: {}",
                        request.method,
                        request.target
                    );
                    self.state = ConnectionState::Processing(request);
                }

                ConnectionState::Processing(request) => {
                    let response = self.resolver.resolve(&request).await?;
                    self.state =
                        ConnectionState::Writing(ResponseWriter::new(&response), response.status);
                }

                ConnectionState::Writing(mut writer, status) => {
                    writer
                        .write_to_stream(&mut self.stream)
                        .await
                        .context("writing response")?;

                    if status.is_success() {
                        info!(
                            status = status.as_u16(),
                            "[RESPONSE] {}",
                            head_log_line(writer.head())
                        );
                    } else {
                        info!(status = status.as_u16(), "[RESPONSE] {}", status.as_u16());
                    }

                    sent = Some(status);
                    // No keep-alive: one exchange per connection.
                    if let Err(e) = self.stream.shutdown().await {
                        debug!("shutdown after response failed: {}", e);
                    }
                }

                ConnectionState::Closed => break,
            }
        }

        Ok(sent)
    }

    /// Fills the buffer according to the read mode. Returns `false` if the
    /// peer closed before sending a byte.
    async fn read_request(&mut self) -> anyhow::Result<bool> {
        let mut temp = vec![0u8; self.limit];

        loop {
            let room = self.limit - self.buffer.len();
            let n = self
                .stream
                .read(&mut temp[..room])
                .await
                .context("reading request")?;

            if n == 0 {
                // Client closed connection
                return Ok(!self.buffer.is_empty());
            }

            self.buffer.extend_from_slice(&temp[..n]);

            let done = match self.read_mode {
                ReadMode::Single => true,
                ReadMode::UntilHeadersEnd => {
                    self.buffer.len() >= self.limit || headers_complete(&self.buffer)
                }
            };
            if done {
                return Ok(true);
            }
        }
    }
}

/// Blank line seen, CRLF or bare LF.
fn headers_complete(buf: &[u8]) -> bool {
    buf.windows(4).any(|w| w == b"\r\n\r\n") || buf.windows(2).any(|w| w == b"\n\n")
}
