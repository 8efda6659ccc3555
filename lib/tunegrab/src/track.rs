use serde::{Deserialize, Serialize};

/// Descriptor of one remote audio item. Immutable once constructed; the
/// processors only ever read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    title: String,
    artist: String,
    #[serde(default)]
    year: u32,
    url: String,
    #[serde(default)]
    artwork_url: Option<String>,
}

impl Track {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        year: u32,
        url: impl Into<String>,
        artwork_url: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            year,
            url: url.into(),
            artwork_url,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    /// Release year; 0 means unknown and is left out of the tags.
    pub fn year(&self) -> u32 {
        self.year
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn artwork_url(&self) -> Option<&str> {
        self.artwork_url.as_deref()
    }

    /// Human-readable "artist - title", used in logs and failure reports.
    pub fn fullname(&self) -> String {
        format!("{} - {}", self.artist, self.title)
    }

    /// On-disk file name, derived deterministically from the fullname with
    /// path-hostile characters replaced.
    pub fn filename(&self) -> String {
        let mut name: String = self
            .fullname()
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c => c,
            })
            .collect();
        name.push_str(".mp3");
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fullname_is_artist_dash_title() {
        let track = Track::new("Resolve", "Foals", 2019, "https://example.com/a", None);
        assert_eq!(track.fullname(), "Foals - Resolve");
    }

    #[test]
    fn filename_is_deterministic_and_sanitized() {
        let track = Track::new("In/Out: Part?1", "AC\\DC", 0, "https://example.com/a", None);
        assert_eq!(track.filename(), "AC_DC - In_Out_ Part_1.mp3");
        assert_eq!(track.filename(), track.filename());
    }

    #[test]
    fn manifest_roundtrip_defaults_optional_fields() {
        let json = r#"{"title":"Song","artist":"Band","url":"https://example.com/s"}"#;
        let track: Track = serde_json::from_str(json).unwrap();
        assert_eq!(track.year(), 0);
        assert_eq!(track.artwork_url(), None);
    }
}
