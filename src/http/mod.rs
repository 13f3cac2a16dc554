//! HTTP protocol implementation.
//!
//! A deliberately small HTTP/1.1 server: one request per connection, `GET`
//! only, files looked up by name in a single directory.
//!
//! # Architecture
//!
//! - **`connection`**: Drives one connection from first read to close
//! - **`parser`**: Turns the received bytes into a [`request::Request`]
//! - **`request`**: Request representation, methods and versions
//! - **`response`**: Status codes, content types and the response builder
//! - **`headers`**: Case-insensitive header map
//! - **`writer`**: Serializes and writes responses to the client
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← One read (or until the blank line), capped
//!        └──────┬──────┘
//!               │ no "GET" anywhere ──────────────┐
//!               │ Request parsed                  │
//!               ▼                                 │
//!        ┌──────────────────┐                     │
//!        │   Processing     │ ← Resolver          │
//!        └──────┬───────────┘                     │
//!               │ Response ready                  │
//!               ▼                                 ▼
//!        ┌──────────────────┐              405 Method Not Allowed
//!        │    Writing       │ ◄───────────────────┘
//!        └──────┬───────────┘
//!               │ Header block, then body
//!               ▼
//!             Closed
//! ```
//!
//! A malformed request line or an I/O error ends the connection without a
//! response; the caller logs it.

pub mod connection;
pub mod headers;
pub mod mime;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
