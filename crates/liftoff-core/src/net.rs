//! Byte retrieval from URLs.
//!
//! The engine only depends on the [`Retriever`] trait; [`HttpRetriever`] is
//! the production implementation backed by reqwest.

use std::fs::File;
use std::io::{Read, Write};

use anyhow::Context;
use url::Url;

use crate::error::LaunchError;

/// Progress callback invoked with `(retrieved, total)` byte counts.
pub type ProgressFn<'a> = dyn FnMut(u64, Option<u64>) + 'a;

/// Blocking retrieval of remote resources.
pub trait Retriever: Send + Sync {
    /// Retrieve the whole resource into memory.
    fn retrieve(&self, url: &Url) -> anyhow::Result<Vec<u8>>;

    /// Stream the resource into `sink`, reporting progress.
    ///
    /// Returns the number of bytes written.
    fn retrieve_to(
        &self,
        url: &Url,
        sink: &mut dyn Write,
        progress: &mut ProgressFn<'_>,
    ) -> anyhow::Result<u64> {
        let bytes = self.retrieve(url)?;
        sink.write_all(&bytes)
            .with_context(|| format!("Failed to write content retrieved from {}", url))?;
        let total = bytes.len() as u64;
        progress(total, Some(total));
        Ok(total)
    }
}

/// Retriever for `http(s)://` and `file://` URLs.
pub struct HttpRetriever {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl HttpRetriever {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("liftoff/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        // Block on async requests using a private tokio runtime
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| anyhow::anyhow!("Failed to create tokio runtime: {}", e))?;

        Ok(Self { client, runtime })
    }

    fn open_file_url(url: &Url) -> anyhow::Result<File> {
        let path = url
            .to_file_path()
            .map_err(|_| anyhow::anyhow!("Invalid file URL: {}", url))?;
        File::open(&path).map_err(|e| {
            LaunchError::Network {
                url: url.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    async fn send(&self, url: &Url) -> anyhow::Result<reqwest::Response> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| LaunchError::Network {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(LaunchError::Network {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            }
            .into());
        }

        Ok(response)
    }
}

impl std::fmt::Debug for HttpRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRetriever").finish_non_exhaustive()
    }
}

impl Retriever for HttpRetriever {
    fn retrieve(&self, url: &Url) -> anyhow::Result<Vec<u8>> {
        if url.scheme() == "file" {
            let mut buffer = Vec::new();
            Self::open_file_url(url)?
                .read_to_end(&mut buffer)
                .with_context(|| format!("Failed to read {}", url))?;
            return Ok(buffer);
        }

        self.runtime.block_on(async {
            let response = self.send(url).await?;
            let bytes = response
                .bytes()
                .await
                .with_context(|| format!("Failed to read response body from {}", url))?;
            Ok(bytes.to_vec())
        })
    }

    fn retrieve_to(
        &self,
        url: &Url,
        sink: &mut dyn Write,
        progress: &mut ProgressFn<'_>,
    ) -> anyhow::Result<u64> {
        if url.scheme() == "file" {
            let mut file = Self::open_file_url(url)?;
            let total = file.metadata().ok().map(|m| m.len());
            let mut buffer = [0u8; 64 * 1024];
            let mut retrieved = 0u64;
            loop {
                let read = file
                    .read(&mut buffer)
                    .with_context(|| format!("Failed to read {}", url))?;
                if read == 0 {
                    break;
                }
                sink.write_all(&buffer[..read])
                    .with_context(|| format!("Failed to write content retrieved from {}", url))?;
                retrieved += read as u64;
                progress(retrieved, total);
            }
            return Ok(retrieved);
        }

        self.runtime.block_on(async {
            let mut response = self.send(url).await?;
            let total = response.content_length();
            let mut retrieved = 0u64;

            while let Some(chunk) = response
                .chunk()
                .await
                .with_context(|| format!("Failed to read response body from {}", url))?
            {
                sink.write_all(&chunk)
                    .with_context(|| format!("Failed to write content retrieved from {}", url))?;
                retrieved += chunk.len() as u64;
                progress(retrieved, total);
            }

            Ok(retrieved)
        })
    }
}
