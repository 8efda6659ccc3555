use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::track::Track;

/// Artwork bytes handed to a tagger, with the image MIME type spelled out.
#[derive(Debug, Clone)]
pub struct Artwork {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Retrieves a remote resource into a local file.
#[async_trait]
pub trait Downloader: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;

    /// On success `dest` holds the complete downloaded bytes. Failures are
    /// reported as [`crate::Error::Download`].
    async fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Writes track metadata into a downloaded audio file.
#[async_trait]
pub trait Tagger: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;

    /// Embeds artist, title and year, plus `artwork` as the front cover when
    /// given, and persists the result back to `path`.
    async fn embed(&self, path: &Path, track: &Track, artwork: Option<Artwork>) -> Result<()>;
}

/// Registers finished files with an external playlist manager.
#[async_trait]
pub trait PlaylistClient: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;

    async fn add(&self, file: &Path, playlist: &str) -> Result<()>;
}
