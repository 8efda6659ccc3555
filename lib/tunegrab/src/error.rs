pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while acquiring tracks.
///
/// `Download` is fatal for the track it occurs on; `Artwork`, `Tag` and
/// `Playlist` are best-effort failures that are recorded without stopping the
/// remaining steps. `EmptyBatch` and `Interrupted` belong to the batch as a
/// whole.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The config file does not exist at its well-known path. Expected on a
    /// first run; callers branch on this instead of treating it as fatal.
    #[error("config file doesn't exist")]
    ConfigNotFound,

    #[error("couldn't load the config file: {0}")]
    Config(String),

    #[error("couldn't download track: {0}")]
    Download(String),

    #[error("couldn't download artwork: {0}")]
    Artwork(String),

    #[error("couldn't tag track: {0}")]
    Tag(String),

    #[error("couldn't add track to playlist: {0}")]
    Playlist(String),

    #[error("there are no tracks to process")]
    EmptyBatch,

    /// The batch was cancelled from the outside. A graceful stop, not a
    /// failure: work already done stays done.
    #[error("stopped early")]
    Interrupted,
}
