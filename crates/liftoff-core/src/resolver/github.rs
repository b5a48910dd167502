//! GitHub "latest release" indirection.
//!
//! A declared URL like `https://github.com/<user>/<repo>/releases/latest/`
//! is resolved through the GitHub releases API to the download directory of
//! the latest release, provided that release ships the descriptor as an asset
//! and carries a version-like tag.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use super::{ActualBaseUrl, BaseUrlStrategy};
use crate::net::Retriever;
use crate::version::Version;

static LATEST_RELEASE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://github\.com/([^/]+)/([^/]+)/releases/latest/?$")
        .expect("latest release pattern is valid")
});

static RELEASE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\D*(\d.*)").expect("release tag pattern is valid"));

const API_BASE: &str = "https://api.github.com";

#[derive(Debug, Deserialize)]
struct LatestRelease {
    tag_name: String,
    #[serde(default)]
    assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Deserialize)]
struct ReleaseAsset {
    name: String,
    browser_download_url: String,
}

/// Extract the version from a release tag such as `v2.3.1`.
pub fn parse_tag_version(tag: &str) -> Option<Version> {
    let captures = RELEASE_TAG.captures(tag)?;
    Version::parse(captures.get(1)?.as_str()).ok()
}

/// Strategy querying the GitHub releases API.
pub struct GitHubLatestRelease {
    retriever: Arc<dyn Retriever>,
    api_base: String,
}

impl GitHubLatestRelease {
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self::with_api_base(retriever, API_BASE)
    }

    /// Strategy talking to an alternative API root.
    pub fn with_api_base(retriever: Arc<dyn Retriever>, api_base: impl Into<String>) -> Self {
        Self {
            retriever,
            api_base: api_base.into(),
        }
    }

    /// `(user, repo)` if `declared` points to a latest release page.
    pub fn match_latest_release(declared: &Url) -> Option<(String, String)> {
        let captures = LATEST_RELEASE_URL.captures(declared.as_str())?;
        Some((captures[1].to_string(), captures[2].to_string()))
    }

    fn api_url(&self, user: &str, repo: &str) -> Option<Url> {
        let raw = format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_base.trim_end_matches('/'),
            user,
            repo
        );
        match Url::parse(&raw) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Invalid GitHub API URL '{}': {}", raw, e);
                None
            }
        }
    }
}

impl BaseUrlStrategy for GitHubLatestRelease {
    fn name(&self) -> &str {
        "github-latest-release"
    }

    fn lookup(&self, declared: &Url, descriptor_file_name: &str) -> Option<ActualBaseUrl> {
        let Some((user, repo)) = Self::match_latest_release(declared) else {
            debug!("{} is not a GitHub latest release URL", declared);
            return None;
        };

        let api_url = self.api_url(&user, &repo)?;
        info!("Querying GitHub API at {}", api_url);

        let body = match self.retriever.retrieve(&api_url) {
            Ok(body) => body,
            Err(e) => {
                warn!("GitHub API request failed: {:#}", e);
                return None;
            }
        };

        let release: LatestRelease = match serde_json::from_slice(&body) {
            Ok(release) => release,
            Err(e) => {
                warn!("Failed to parse GitHub API response: {}", e);
                return None;
            }
        };

        let Some(asset) = release
            .assets
            .iter()
            .find(|asset| asset.name == descriptor_file_name)
        else {
            warn!(
                "The app descriptor ({}) is not an asset of the latest release of {}/{}",
                descriptor_file_name, user, repo
            );
            return None;
        };

        let descriptor_url = match Url::parse(&asset.browser_download_url) {
            Ok(url) => url,
            Err(e) => {
                warn!(
                    "Invalid download URL '{}': {}",
                    asset.browser_download_url, e
                );
                return None;
            }
        };

        let Some(version) = parse_tag_version(&release.tag_name) else {
            warn!(
                "Release tags must have the format <prefix><version>, not '{}'",
                release.tag_name
            );
            return None;
        };

        let url = match descriptor_url.join(".") {
            Ok(url) => url,
            Err(e) => {
                warn!("Cannot compute parent of {}: {}", descriptor_url, e);
                return None;
            }
        };

        debug!(
            "Latest release of {}/{} is version {} at {}",
            user, repo, version, url
        );
        Some(ActualBaseUrl {
            url,
            release_version: Some(version),
        })
    }
}
