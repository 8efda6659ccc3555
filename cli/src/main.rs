use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tunegrab::config::{KEY_DOWNLOADER, KEY_DOWNLOAD_FOLDER, KEY_PLAYLIST};
use tunegrab::downloader::{CurlDownloader, HttpDownloader};
use tunegrab::playlist::MusicAppClient;
use tunegrab::tagger::LoftyTagger;
use tunegrab::{
    BatchProcessor, ConfigStore, Downloader, Error, PlaylistClient, Services, ServicesBuilder,
    Tagger, Track, TrackProcessor,
};

/// Fetch the tracks listed in a manifest, tag them and register them with a
/// playlist.
#[derive(Parser)]
#[command(name = "tunegrab", version)]
struct Args {
    /// JSON manifest: an array of track descriptors.
    manifest: PathBuf,

    /// Download into this folder instead of the configured one.
    #[arg(long)]
    folder: Option<String>,

    /// Register finished tracks with this playlist.
    #[arg(long)]
    playlist: Option<String>,

    /// Download backend to use (`curl` or `http`).
    #[arg(long)]
    downloader: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = ConfigStore::new();
    match config.load() {
        Ok(()) => {}
        Err(Error::ConfigNotFound) => {
            // Expected on a first run; defaults and flags still apply.
            warn!(
                "no config file at {}, continuing with defaults",
                config.path().display()
            );
        }
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    }
    if let Some(folder) = args.folder {
        config.set(KEY_DOWNLOAD_FOLDER, folder);
    }
    if let Some(playlist) = args.playlist {
        config.set(KEY_PLAYLIST, playlist);
    }
    if let Some(downloader) = args.downloader {
        config.set(KEY_DOWNLOADER, downloader);
    }

    let tracks = match load_manifest(&args.manifest) {
        Ok(tracks) => tracks,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let services = match ServicesBuilder::new()
        .add_downloader(CurlDownloader)
        .add_downloader(HttpDownloader::new())
        .add_tagger(LoftyTagger)
        .add_playlist_client(MusicAppClient)
        .build()
    {
        Ok(services) => services,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let (downloader, tagger, playlist_client) = match resolve(&services, &config) {
        Ok(collaborators) => collaborators,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let batch = BatchProcessor::new(TrackProcessor::from_config(
        &config,
        downloader,
        tagger,
        playlist_client,
    ));

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    match batch.process_all(&tracks, &cancel).await {
        Ok(report) if report.is_clean() => {
            info!("all tracks processed");
            ExitCode::SUCCESS
        }
        Ok(report) => {
            println!("There were errors while processing tracks:");
            for failure in &report.failures {
                println!("  {}: {}", failure.track, failure.error);
            }
            ExitCode::FAILURE
        }
        Err(Error::Interrupted) => {
            println!("Stopping early, see you around!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn resolve(
    services: &Services,
    config: &ConfigStore,
) -> Result<(Arc<dyn Downloader>, Arc<dyn Tagger>, Arc<dyn PlaylistClient>), String> {
    let wanted = config.get(KEY_DOWNLOADER);
    let wanted = (!wanted.is_empty()).then_some(wanted);
    let downloader = services
        .downloader(wanted)
        .ok_or_else(|| format!("unknown downloader {:?}", wanted.unwrap_or_default()))?;
    let tagger = services
        .tagger(None)
        .ok_or_else(|| "no tagger registered".to_string())?;
    let playlist_client = services
        .playlist_client(None)
        .ok_or_else(|| "no playlist client registered".to_string())?;
    Ok((downloader.clone(), tagger.clone(), playlist_client.clone()))
}

fn load_manifest(path: &Path) -> Result<Vec<Track>, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("couldn't read manifest {}: {e}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|e| format!("couldn't parse manifest {}: {e}", path.display()))
}
