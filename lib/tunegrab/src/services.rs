use std::collections::HashMap;
use std::sync::Arc;

use crate::traits::{Downloader, PlaylistClient, Tagger};

/// Registry of the collaborators the pipeline can be wired with, keyed by id.
/// The first registration of each concern becomes its default.
pub struct Services {
    downloaders: HashMap<String, Arc<dyn Downloader>>,
    taggers: HashMap<String, Arc<dyn Tagger>>,
    playlist_clients: HashMap<String, Arc<dyn PlaylistClient>>,
    default_downloader: Option<String>,
    default_tagger: Option<String>,
    default_playlist_client: Option<String>,
}

impl Services {
    pub fn downloader(&self, id: Option<&str>) -> Option<&Arc<dyn Downloader>> {
        let key = id.or(self.default_downloader.as_deref())?;
        self.downloaders.get(key)
    }

    pub fn tagger(&self, id: Option<&str>) -> Option<&Arc<dyn Tagger>> {
        let key = id.or(self.default_tagger.as_deref())?;
        self.taggers.get(key)
    }

    pub fn playlist_client(&self, id: Option<&str>) -> Option<&Arc<dyn PlaylistClient>> {
        let key = id.or(self.default_playlist_client.as_deref())?;
        self.playlist_clients.get(key)
    }

    pub fn list_downloaders(&self) -> Vec<(&str, &str)> {
        self.downloaders.values().map(|d| (d.id(), d.name())).collect()
    }
}

pub struct ServicesBuilder {
    downloaders: HashMap<String, Arc<dyn Downloader>>,
    taggers: HashMap<String, Arc<dyn Tagger>>,
    playlist_clients: HashMap<String, Arc<dyn PlaylistClient>>,
    default_downloader: Option<String>,
    default_tagger: Option<String>,
    default_playlist_client: Option<String>,
}

impl ServicesBuilder {
    pub fn new() -> Self {
        Self {
            downloaders: HashMap::new(),
            taggers: HashMap::new(),
            playlist_clients: HashMap::new(),
            default_downloader: None,
            default_tagger: None,
            default_playlist_client: None,
        }
    }

    pub fn add_downloader(mut self, downloader: impl Downloader + 'static) -> Self {
        let id = downloader.id().to_string();
        if self.default_downloader.is_none() {
            self.default_downloader = Some(id.clone());
        }
        self.downloaders.insert(id, Arc::new(downloader));
        self
    }

    pub fn add_tagger(mut self, tagger: impl Tagger + 'static) -> Self {
        let id = tagger.id().to_string();
        if self.default_tagger.is_none() {
            self.default_tagger = Some(id.clone());
        }
        self.taggers.insert(id, Arc::new(tagger));
        self
    }

    pub fn add_playlist_client(mut self, client: impl PlaylistClient + 'static) -> Self {
        let id = client.id().to_string();
        if self.default_playlist_client.is_none() {
            self.default_playlist_client = Some(id.clone());
        }
        self.playlist_clients.insert(id, Arc::new(client));
        self
    }

    pub fn default_downloader(mut self, id: &str) -> Self {
        self.default_downloader = Some(id.to_string());
        self
    }

    pub fn build(self) -> Result<Services, &'static str> {
        if self.downloaders.is_empty() {
            return Err("at least one downloader required");
        }
        if self.taggers.is_empty() {
            return Err("at least one tagger required");
        }
        if self.playlist_clients.is_empty() {
            return Err("at least one playlist client required");
        }

        Ok(Services {
            downloaders: self.downloaders,
            taggers: self.taggers,
            playlist_clients: self.playlist_clients,
            default_downloader: self.default_downloader,
            default_tagger: self.default_tagger,
            default_playlist_client: self.default_playlist_client,
        })
    }
}

impl Default for ServicesBuilder {
    fn default() -> Self {
        Self::new()
    }
}
