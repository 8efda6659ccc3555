use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::{ConfigStore, KEY_DOWNLOAD_FOLDER, KEY_PLAYLIST};
use crate::error::{Error, Result};
use crate::track::Track;
use crate::traits::{Artwork, Downloader, PlaylistClient, Tagger};

/// One recorded per-track failure.
#[derive(Debug)]
pub struct FailureRecord {
    /// The track's fullname.
    pub track: String,
    pub error: Error,
}

/// Outcome of a whole batch run. Failures appear in the order they occurred.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub failures: Vec<FailureRecord>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs one track through the acquisition pipeline: download the audio,
/// fetch artwork, embed tags, register with the configured playlist.
pub struct TrackProcessor {
    download_folder: PathBuf,
    playlist: String,
    downloader: Arc<dyn Downloader>,
    tagger: Arc<dyn Tagger>,
    playlist_client: Arc<dyn PlaylistClient>,
}

impl TrackProcessor {
    pub fn new(
        download_folder: PathBuf,
        playlist: String,
        downloader: Arc<dyn Downloader>,
        tagger: Arc<dyn Tagger>,
        playlist_client: Arc<dyn PlaylistClient>,
    ) -> Self {
        Self {
            download_folder,
            playlist,
            downloader,
            tagger,
            playlist_client,
        }
    }

    /// Wires the processor from the store: `download_folder` is the
    /// destination, `playlist` the registration target (empty means none).
    pub fn from_config(
        config: &ConfigStore,
        downloader: Arc<dyn Downloader>,
        tagger: Arc<dyn Tagger>,
        playlist_client: Arc<dyn PlaylistClient>,
    ) -> Self {
        Self::new(
            PathBuf::from(config.get(KEY_DOWNLOAD_FOLDER)),
            config.get(KEY_PLAYLIST).to_string(),
            downloader,
            tagger,
            playlist_client,
        )
    }

    /// Processes a single track.
    ///
    /// A failed audio download aborts the track immediately. Everything after
    /// a successful download is best-effort: artwork, tagging and playlist
    /// registration all still get their turn when an earlier one of them
    /// fails, and the error returned is the most recent of those failures.
    /// A partially written audio file from a failed download stays on disk
    /// for inspection.
    pub async fn process(&self, track: &Track) -> Result<()> {
        info!("Downloading {}", track.fullname());
        let track_path = self.download_folder.join(track.filename());
        tokio::fs::File::create(&track_path)
            .await
            .map_err(|e| Error::Download(format!("couldn't create {}: {e}", track_path.display())))?;
        self.downloader.fetch(track.url(), &track_path).await?;

        let mut failure: Option<Error> = None;

        let mut artwork = None;
        match self.fetch_artwork(track).await {
            Ok(fetched) => artwork = fetched,
            Err(e) => failure = Some(e),
        }

        if let Err(e) = self.tagger.embed(&track_path, track, artwork).await {
            failure = Some(e);
        }

        if !self.playlist.is_empty() {
            info!("Adding to playlist {}", self.playlist);
            if let Err(e) = self.playlist_client.add(&track_path, &self.playlist).await {
                failure = Some(e);
            }
        }

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Downloads the track's artwork into a scoped temporary file and reads
    /// it back. The file is deleted when the handle drops, whichever way this
    /// returns; nothing of it outlives the call.
    async fn fetch_artwork(&self, track: &Track) -> Result<Option<Artwork>> {
        let Some(url) = track.artwork_url() else {
            return Ok(None);
        };

        info!("Downloading artwork");
        let file = tempfile::Builder::new()
            .prefix("tunegrab-art")
            .suffix(".jpg")
            .tempfile()
            .map_err(|e| Error::Artwork(format!("couldn't create artwork file: {e}")))?;

        self.downloader
            .fetch(url, file.path())
            .await
            .map_err(|e| Error::Artwork(download_cause(e)))?;

        let bytes = std::fs::read(file.path())
            .map_err(|e| Error::Artwork(format!("couldn't read artwork file: {e}")))?;
        Ok(Some(Artwork {
            bytes,
            mime_type: "image/jpeg".to_string(),
        }))
    }
}

fn download_cause(e: Error) -> String {
    match e {
        Error::Download(msg) => msg,
        other => other.to_string(),
    }
}

/// Runs a collection of tracks through a [`TrackProcessor`], one at a time.
pub struct BatchProcessor {
    processor: TrackProcessor,
}

impl BatchProcessor {
    pub fn new(processor: TrackProcessor) -> Self {
        Self { processor }
    }

    /// Processes every track, strictly sequentially and in reverse input
    /// order — the last requested track is downloaded first. The ordering is
    /// an observable contract of this tool, not an implementation detail.
    ///
    /// Per-track failures never stop the batch: each is echoed as it happens
    /// and collected into the report in the order it occurred. An empty
    /// collection is refused with [`Error::EmptyBatch`] before any work.
    /// Cancelling `cancel` ends the batch promptly with
    /// [`Error::Interrupted`]; tracks already processed stay as they are.
    pub async fn process_all(
        &self,
        tracks: &[Track],
        cancel: &CancellationToken,
    ) -> Result<BatchReport> {
        if tracks.is_empty() {
            return Err(Error::EmptyBatch);
        }

        let mut report = BatchReport::default();
        for track in tracks.iter().rev() {
            if cancel.is_cancelled() {
                return Err(Error::Interrupted);
            }
            let outcome = tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Interrupted),
                outcome = self.processor.process(track) => outcome,
            };
            if let Err(e) = outcome {
                error!("there was an error while processing {}: {e}", track.fullname());
                report.failures.push(FailureRecord {
                    track: track.fullname(),
                    error: e,
                });
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Mutex;

    use async_trait::async_trait;

    struct FakeDownloader {
        fail_urls: Vec<String>,
        calls: Mutex<Vec<(String, PathBuf)>>,
    }

    impl FakeDownloader {
        fn new() -> Self {
            Self::failing(&[])
        }

        fn failing(urls: &[&str]) -> Self {
            Self {
                fail_urls: urls.iter().map(|u| u.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn fetched_urls(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(u, _)| u.clone()).collect()
        }

        fn dest_for(&self, url: &str) -> Option<PathBuf> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .find(|(u, _)| u == url)
                .map(|(_, p)| p.clone())
        }
    }

    #[async_trait]
    impl Downloader for FakeDownloader {
        fn id(&self) -> &'static str {
            "fake"
        }

        fn name(&self) -> &'static str {
            "fake"
        }

        async fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), dest.to_path_buf()));
            if self.fail_urls.iter().any(|u| u == url) {
                return Err(Error::Download(format!("refused {url}")));
            }
            std::fs::write(dest, b"bytes").map_err(|e| Error::Download(e.to_string()))?;
            Ok(())
        }
    }

    struct FakeTagger {
        fail: bool,
        embeds: Mutex<Vec<(PathBuf, Option<usize>)>>,
    }

    impl FakeTagger {
        fn new() -> Self {
            Self {
                fail: false,
                embeds: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                embeds: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Tagger for FakeTagger {
        fn id(&self) -> &'static str {
            "fake"
        }

        fn name(&self) -> &'static str {
            "fake"
        }

        async fn embed(
            &self,
            path: &Path,
            _track: &Track,
            artwork: Option<Artwork>,
        ) -> Result<()> {
            self.embeds
                .lock()
                .unwrap()
                .push((path.to_path_buf(), artwork.map(|a| a.bytes.len())));
            if self.fail {
                return Err(Error::Tag("tagger refused".to_string()));
            }
            Ok(())
        }
    }

    struct FakePlaylist {
        fail: bool,
        adds: Mutex<Vec<(PathBuf, String)>>,
    }

    impl FakePlaylist {
        fn new() -> Self {
            Self {
                fail: false,
                adds: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                adds: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PlaylistClient for FakePlaylist {
        fn id(&self) -> &'static str {
            "fake"
        }

        fn name(&self) -> &'static str {
            "fake"
        }

        async fn add(&self, file: &Path, playlist: &str) -> Result<()> {
            self.adds
                .lock()
                .unwrap()
                .push((file.to_path_buf(), playlist.to_string()));
            if self.fail {
                return Err(Error::Playlist("playlist refused".to_string()));
            }
            Ok(())
        }
    }

    fn processor(
        folder: &Path,
        playlist: &str,
        downloader: Arc<FakeDownloader>,
        tagger: Arc<FakeTagger>,
        playlist_client: Arc<FakePlaylist>,
    ) -> TrackProcessor {
        TrackProcessor::new(
            folder.to_path_buf(),
            playlist.to_string(),
            downloader,
            tagger,
            playlist_client,
        )
    }

    fn track(title: &str, url: &str, artwork_url: Option<&str>) -> Track {
        Track::new(title, "Band", 2020, url, artwork_url.map(|u| u.to_string()))
    }

    #[tokio::test]
    async fn success_runs_every_step() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Arc::new(FakeDownloader::new());
        let tagger = Arc::new(FakeTagger::new());
        let playlist = Arc::new(FakePlaylist::new());
        let processor = processor(
            dir.path(),
            "mix",
            downloader.clone(),
            tagger.clone(),
            playlist.clone(),
        );

        let track = track("Song", "https://example.com/audio", Some("https://example.com/art"));
        processor.process(&track).await.unwrap();

        let audio_path = dir.path().join(track.filename());
        assert!(audio_path.exists());
        assert_eq!(
            downloader.fetched_urls(),
            vec!["https://example.com/audio", "https://example.com/art"]
        );
        // Tagger saw the artwork bytes the fake downloader wrote.
        assert_eq!(
            *tagger.embeds.lock().unwrap(),
            vec![(audio_path.clone(), Some(5))]
        );
        assert_eq!(
            *playlist.adds.lock().unwrap(),
            vec![(audio_path, "mix".to_string())]
        );
    }

    #[tokio::test]
    async fn audio_download_failure_is_fatal_for_the_track() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Arc::new(FakeDownloader::failing(&["https://example.com/audio"]));
        let tagger = Arc::new(FakeTagger::new());
        let playlist = Arc::new(FakePlaylist::new());
        let processor = processor(
            dir.path(),
            "mix",
            downloader,
            tagger.clone(),
            playlist.clone(),
        );

        let track = track("Song", "https://example.com/audio", Some("https://example.com/art"));
        let err = processor.process(&track).await.unwrap_err();

        assert!(matches!(err, Error::Download(_)));
        assert!(tagger.embeds.lock().unwrap().is_empty());
        assert!(playlist.adds.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn artwork_failure_still_tags_and_registers() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Arc::new(FakeDownloader::failing(&["https://example.com/art"]));
        let tagger = Arc::new(FakeTagger::new());
        let playlist = Arc::new(FakePlaylist::new());
        let processor = processor(
            dir.path(),
            "mix",
            downloader,
            tagger.clone(),
            playlist.clone(),
        );

        let track = track("Song", "https://example.com/audio", Some("https://example.com/art"));
        let err = processor.process(&track).await.unwrap_err();

        assert!(matches!(err, Error::Artwork(_)));
        // Tagging went ahead, with no picture to attach.
        assert_eq!(
            *tagger.embeds.lock().unwrap(),
            vec![(dir.path().join(track.filename()), None)]
        );
        assert_eq!(playlist.adds.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn later_best_effort_failure_overwrites_the_earlier_one() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Arc::new(FakeDownloader::failing(&["https://example.com/art"]));
        let tagger = Arc::new(FakeTagger::new());
        let playlist = Arc::new(FakePlaylist::failing());
        let processor = processor(dir.path(), "mix", downloader, tagger, playlist);

        let track = track("Song", "https://example.com/audio", Some("https://example.com/art"));
        let err = processor.process(&track).await.unwrap_err();

        // Artwork failed first, but the playlist failure is the one surfaced.
        assert!(matches!(err, Error::Playlist(_)));
    }

    #[tokio::test]
    async fn artwork_temp_file_is_removed_even_when_tagging_fails() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Arc::new(FakeDownloader::new());
        let tagger = Arc::new(FakeTagger::failing());
        let playlist = Arc::new(FakePlaylist::new());
        let processor = processor(dir.path(), "", downloader.clone(), tagger, playlist);

        let track = track("Song", "https://example.com/audio", Some("https://example.com/art"));
        let err = processor.process(&track).await.unwrap_err();
        assert!(matches!(err, Error::Tag(_)));

        let artwork_dest = downloader.dest_for("https://example.com/art").unwrap();
        assert!(!artwork_dest.exists());
    }

    #[tokio::test]
    async fn empty_playlist_name_skips_registration() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Arc::new(FakeDownloader::new());
        let tagger = Arc::new(FakeTagger::new());
        let playlist = Arc::new(FakePlaylist::new());
        let processor = processor(dir.path(), "", downloader, tagger, playlist.clone());

        let track = track("Song", "https://example.com/audio", None);
        processor.process(&track).await.unwrap();

        assert!(playlist.adds.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_batch_is_refused_before_any_work() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Arc::new(FakeDownloader::new());
        let tagger = Arc::new(FakeTagger::new());
        let playlist = Arc::new(FakePlaylist::new());
        let batch = BatchProcessor::new(processor(
            dir.path(),
            "",
            downloader.clone(),
            tagger,
            playlist,
        ));

        let err = batch
            .process_all(&[], &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::EmptyBatch));
        assert!(downloader.fetched_urls().is_empty());
    }

    #[tokio::test]
    async fn batch_runs_in_reverse_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Arc::new(FakeDownloader::new());
        let tagger = Arc::new(FakeTagger::new());
        let playlist = Arc::new(FakePlaylist::new());
        let batch = BatchProcessor::new(processor(
            dir.path(),
            "",
            downloader.clone(),
            tagger,
            playlist,
        ));

        let tracks = vec![
            track("First", "https://example.com/first", None),
            track("Second", "https://example.com/second", None),
        ];
        let report = batch
            .process_all(&tracks, &CancellationToken::new())
            .await
            .unwrap();

        assert!(report.is_clean());
        assert_eq!(
            downloader.fetched_urls(),
            vec!["https://example.com/second", "https://example.com/first"]
        );
    }

    #[tokio::test]
    async fn batch_records_failures_and_keeps_going() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Arc::new(FakeDownloader::failing(&["https://example.com/bad"]));
        let tagger = Arc::new(FakeTagger::new());
        let playlist = Arc::new(FakePlaylist::new());
        let batch = BatchProcessor::new(processor(
            dir.path(),
            "",
            downloader.clone(),
            tagger,
            playlist,
        ));

        let good = track("Good", "https://example.com/good", None);
        let bad = track("Bad", "https://example.com/bad", None);
        let report = batch
            .process_all(&[good.clone(), bad.clone()], &CancellationToken::new())
            .await
            .unwrap();

        // Both tracks were attempted, bad one first (reverse order).
        assert_eq!(downloader.fetched_urls().len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].track, bad.fullname());
        assert!(matches!(report.failures[0].error, Error::Download(_)));
    }

    #[tokio::test]
    async fn cancelled_batch_stops_before_processing() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = Arc::new(FakeDownloader::new());
        let tagger = Arc::new(FakeTagger::new());
        let playlist = Arc::new(FakePlaylist::new());
        let batch = BatchProcessor::new(processor(
            dir.path(),
            "",
            downloader.clone(),
            tagger,
            playlist,
        ));

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = batch
            .process_all(&[track("Song", "https://example.com/audio", None)], &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Interrupted));
        assert!(downloader.fetched_urls().is_empty());
    }
}
