use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::info;

use crate::error::{Error, Result};
use crate::traits::PlaylistClient;

/// AppleScript that adds a file to a named Music.app playlist.
const ADD_SCRIPT: &str = r#"
on run argv
    set trackFile to POSIX file (item 1 of argv)
    tell application "Music"
        add trackFile to playlist (item 2 of argv)
    end tell
end run
"#;

/// Registers tracks with Music.app playlists through osascript.
pub struct MusicAppClient;

#[async_trait]
impl PlaylistClient for MusicAppClient {
    fn id(&self) -> &'static str {
        "music-app"
    }

    fn name(&self) -> &'static str {
        "Music.app"
    }

    async fn add(&self, file: &Path, playlist: &str) -> Result<()> {
        info!("Adding {} to playlist {playlist}", file.display());
        let output = Command::new("osascript")
            .arg("-e")
            .arg(ADD_SCRIPT)
            .arg(file)
            .arg(playlist)
            .output()
            .await
            .map_err(|e| Error::Playlist(format!("couldn't run osascript: {e}")))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let cause = if stderr.trim().is_empty() {
            format!("osascript exited with {}", output.status)
        } else {
            stderr.trim().to_string()
        };
        Err(Error::Playlist(cause))
    }
}
