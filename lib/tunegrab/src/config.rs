use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Settings file name, resolved against the user's home directory.
const CONFIG_FILE: &str = ".tunegrab.toml";

/// Folder downloaded tracks are written into.
pub const KEY_DOWNLOAD_FOLDER: &str = "download_folder";
/// Playlist finished tracks are registered with. Empty means don't register.
pub const KEY_PLAYLIST: &str = "playlist";
/// Id of the download backend to use.
pub const KEY_DOWNLOADER: &str = "downloader";

/// Layered key/value settings.
///
/// Three tiers, in descending precedence: `overrides` (explicit runtime
/// `set`s), `loaded` (parsed from the settings file) and `defaults`
/// (compiled in). [`ConfigStore::get`] always walks them in that order.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    overrides: HashMap<String, String>,
    loaded: HashMap<String, String>,
    defaults: HashMap<String, String>,
    path: PathBuf,
}

impl ConfigStore {
    /// Store bound to `~/.tunegrab.toml`.
    pub fn new() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::with_path(home.join(CONFIG_FILE))
    }

    /// Store bound to an explicit settings file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        let music = dirs::audio_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut defaults = HashMap::new();
        defaults.insert(
            KEY_DOWNLOAD_FOLDER.to_string(),
            music.to_string_lossy().into_owned(),
        );
        defaults.insert(KEY_DOWNLOADER.to_string(), "curl".to_string());

        Self {
            overrides: HashMap::new(),
            loaded: HashMap::new(),
            defaults,
            path: path.into(),
        }
    }

    /// Returns the value from the first tier that knows `key`: overrides,
    /// then the loaded file, then defaults. Missing everywhere resolves to
    /// the empty string. Case-sensitive.
    pub fn get(&self, key: &str) -> &str {
        self.overrides
            .get(key)
            .or_else(|| self.loaded.get(key))
            .or_else(|| self.defaults.get(key))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Writes into the override tier, shadowing the file and the defaults.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.overrides.insert(key.into(), value.into());
    }

    /// Reads the settings file and replaces the loaded tier with its
    /// contents. The file is a flat TOML table of strings.
    ///
    /// A missing file comes back as [`Error::ConfigNotFound`] and leaves the
    /// loaded tier untouched; unreadable or malformed content is an
    /// [`Error::Config`]. Calling this again re-reads the file; nothing from
    /// a previous load survives.
    pub fn load(&mut self) -> Result<()> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound)
            }
            Err(e) => {
                return Err(Error::Config(format!(
                    "couldn't read {}: {e}",
                    self.path.display()
                )))
            }
        };

        self.loaded = toml::from_str(&raw).map_err(|e| {
            Error::Config(format!("couldn't parse {}: {e}", self.path.display()))
        })?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}
