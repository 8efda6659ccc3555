use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};
use url::Url;

use crate::error::{Error, Result};
use crate::traits::Downloader;

/// Shells out to curl, leaving its progress bar on the user's terminal.
pub struct CurlDownloader;

#[async_trait]
impl Downloader for CurlDownloader {
    fn id(&self) -> &'static str {
        "curl"
    }

    fn name(&self) -> &'static str {
        "curl"
    }

    async fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        debug!("curl -# -o {} -L {}", dest.display(), url);
        let status = Command::new("curl")
            .arg("-#")
            .arg("-o")
            .arg(dest)
            .arg("-L")
            .arg(url)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| Error::Download(format!("couldn't run curl: {e}")))?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Download(format!(
                "curl exited with {status} for {url}"
            )))
        }
    }
}

/// In-process alternative to curl: fetches over HTTP and writes the body to
/// the destination file.
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    fn id(&self) -> &'static str {
        "http"
    }

    fn name(&self) -> &'static str {
        "built-in HTTP"
    }

    async fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        let url = Url::parse(url).map_err(|e| Error::Download(format!("invalid url {url}: {e}")))?;
        info!("Fetching {url}");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::Download(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Download(format!("{url} returned {status}")));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Download(e.to_string()))?;
        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|e| Error::Download(format!("couldn't write {}: {e}", dest.display())))?;
        Ok(())
    }
}
