pub mod config;
pub mod downloader;
pub mod error;
pub mod playlist;
pub mod processor;
pub mod services;
pub mod tagger;
pub mod track;
pub mod traits;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use processor::{BatchProcessor, BatchReport, FailureRecord, TrackProcessor};
pub use services::{Services, ServicesBuilder};
pub use track::Track;
pub use traits::{Artwork, Downloader, PlaylistClient, Tagger};
