use async_trait::async_trait;

use crate::error::StoreError;

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Stores a URL and hands back its short form.
#[async_trait]
pub trait Shrinker: Send + Sync {
    /// Returns the short URL when the store knows its base URL, otherwise the
    /// bare identifier.
    async fn shrink(&self, original_url: &str) -> Result<String, StoreError>;
}

/// Resolves an identifier back to the URL it was created for.
#[async_trait]
pub trait Unwrapper: Send + Sync {
    async fn unwrap_url(&self, id: &str) -> Result<String, StoreError>;
}

/// Everything the HTTP layer needs from a backend.
pub trait LinkStore: Shrinker + Unwrapper {}

impl<T: Shrinker + Unwrapper> LinkStore for T {}

/// Join `id` onto `base_url`, or return the bare id when no base is set.
///
/// Base URLs are validated and normalised to a trailing '/' at startup, and
/// ids are plain hex, so appending after exactly one '/' gives the same
/// result as a URL path join.
pub(crate) fn short_url(base_url: Option<&str>, id: String) -> String {
    match base_url {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), id),
        None => id,
    }
}
