//! flatserve - single-directory HTTP/1.1 file server
//!
//! Core library: message model, resolver, connection handler and listener.

pub mod config;
pub mod http;
pub mod router;
pub mod server;
