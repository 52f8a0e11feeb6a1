//! HTTP downloads for source archives.

use anyhow::{bail, Result};
use reqwest::blocking::Client;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

/// Downloads files over HTTP/HTTPS.
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("brood/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Download `url` to `dest`, returning the number of bytes written.
    pub fn download_to(&self, url: &str, dest: &Path) -> Result<u64> {
        tracing::debug!("GET {}", url);
        let mut response = self.client.get(url).send()?;

        if !response.status().is_success() {
            bail!("HTTP {} fetching {}", response.status(), url);
        }

        let mut file = File::create(dest)?;
        let written = response.copy_to(&mut file)?;
        tracing::debug!("Downloaded {} bytes from {}", written, url);
        Ok(written)
    }
}
