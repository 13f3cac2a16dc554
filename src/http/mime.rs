//! MIME type detection based on file extensions.

use std::sync::Arc;

/// Maps a file name to a MIME string. Must always return something.
pub trait MimeLookup: Send + Sync {
    fn lookup(&self, name: &str) -> String;
}

impl<F> MimeLookup for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn lookup(&self, name: &str) -> String {
        self(name)
    }
}

/// Extension table from `mime_guess`; unknown names are
/// `application/octet-stream`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuessMime;

impl MimeLookup for GuessMime {
    fn lookup(&self, name: &str) -> String {
        mime_guess::from_path(name)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }
}

pub fn default_lookup() -> Arc<dyn MimeLookup> {
    Arc::new(GuessMime)
}
