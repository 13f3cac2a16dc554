use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

/// Headers written right after the status line, in this order.
const LEADING_HEADERS: [&str; 3] = ["Date", "Content-Type", "Content-Length"];

/// Renders the status line and header block, including the blank line that
/// ends it.
///
/// The status line carries the code only (`HTTP/1.1 404`), no reason phrase.
/// `Date`, `Content-Type` and `Content-Length` come first; any other headers
/// follow in insertion order.
pub fn serialize_head(resp: &Response) -> Bytes {
    let mut buf = BytesMut::with_capacity(128);

    // Status line
    buf.put_slice(format!("HTTP/{} {}\r\n", resp.version, resp.status.as_u16()).as_bytes());

    for name in LEADING_HEADERS {
        if let Some(value) = resp.headers.get(name) {
            put_header(&mut buf, name, value);
        }
    }
    for (name, value) in resp.headers.iter() {
        if !LEADING_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name)) {
            put_header(&mut buf, name, value);
        }
    }

    // Header/body separator
    buf.put_slice(b"\r\n");

    buf.freeze()
}

/// Full wire form: header block followed by the untouched body bytes.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let head = serialize_head(resp);
    let mut out = Vec::with_capacity(head.len() + resp.body.len());
    out.extend_from_slice(&head);
    out.extend_from_slice(&resp.body);
    out
}

/// Header block on one line for logging: CR dropped, LF turned into a space.
pub fn head_log_line(head: &[u8]) -> String {
    String::from_utf8_lossy(head)
        .replace('\r', "")
        .replace('\n', " ")
}

fn put_header(buf: &mut BytesMut, name: &str, value: &str) {
    buf.put_slice(name.as_bytes());
    buf.put_slice(b": ");
    buf.put_slice(value.as_bytes());
    buf.put_slice(b"\r\n");
}

/// Writes one response as two sends, header block then body.
///
/// A response only counts as delivered once both parts and the flush went
/// through; any short write is an error.
pub struct ResponseWriter {
    head: Bytes,
    body: Bytes,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            head: serialize_head(response),
            body: Bytes::copy_from_slice(&response.body),
            written: 0,
        }
    }

    pub fn head(&self) -> &[u8] {
        &self.head
    }

    pub fn total_len(&self) -> usize {
        self.head.len() + self.body.len()
    }

    pub async fn write_to_stream<S>(&mut self, stream: &mut S) -> anyhow::Result<()>
    where
        S: AsyncWrite + Unpin,
    {
        while self.written < self.total_len() {
            let chunk = if self.written < self.head.len() {
                &self.head[self.written..]
            } else {
                &self.body[self.written - self.head.len()..]
            };

            let n = stream.write(chunk).await?;

            if n == 0 {
                return Err(anyhow::anyhow!(
                    "connection closed while writing ({} of {} bytes sent)",
                    self.written,
                    self.total_len()
                ));
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }
}
