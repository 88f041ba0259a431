// Author: Eshan Roy
// SPDX-License-Identifier: MIT

//! PyPI JSON API client.

use crate::config::RepinConfig;
use crate::error::{IndexError, RepinError, Result};
use crate::project::normalize_name;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use super::version::{is_prerelease, max_version};
use super::{LatestVersions, VersionSource};

/// The subset of `/pypi/<name>/json` that matters here.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectMetadata {
    pub info: ProjectInfo,
    #[serde(default)]
    pub releases: HashMap<String, Vec<ReleaseFile>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectInfo {
    pub version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseFile {
    #[serde(default)]
    pub yanked: bool,
}

/// Pick the upgrade target from project metadata.
///
/// Without `allow_pre`, a stable `info.version` wins outright; otherwise the
/// newest stable release with at least one non-yanked file is chosen. With
/// `allow_pre`, the newest release with files is chosen. Either way
/// `info.version` is the fallback.
pub fn select_latest(metadata: &ProjectMetadata, allow_pre: bool) -> String {
    let latest = &metadata.info.version;
    if !allow_pre && !is_prerelease(latest) {
        return latest.clone();
    }

    let candidates = metadata
        .releases
        .iter()
        .filter(|(_, files)| files.iter().any(|f| !f.yanked))
        .map(|(version, _)| version.as_str())
        .filter(|version| allow_pre || !is_prerelease(version));

    max_version(candidates)
        .map(str::to_string)
        .unwrap_or_else(|| latest.clone())
}

/// Blocking client for the PyPI JSON API.
pub struct PyPiClient {
    client: Client,
    base_url: String,
    concurrency: usize,
}

impl PyPiClient {
    /// Create a client for `base_url` (e.g. `https://pypi.org`).
    pub fn new(base_url: &str, timeout: Duration, concurrency: usize) -> Result<Self> {
        reqwest::Url::parse(base_url).map_err(|e| {
            RepinError::Index(IndexError::InvalidUrl {
                url: base_url.to_string(),
                message: e.to_string(),
            })
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("uvrepin/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                RepinError::Index(IndexError::ClientFailed {
                    message: e.to_string(),
                })
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            concurrency: concurrency.max(1),
        })
    }

    /// Create a client from configuration.
    pub fn from_config(config: &RepinConfig) -> Result<Self> {
        Self::new(
            &config.pypi_url,
            Duration::from_secs(config.timeout_secs),
            config.concurrency,
        )
    }

    /// Fetch project metadata.
    pub fn fetch(&self, package: &str) -> std::result::Result<ProjectMetadata, reqwest::Error> {
        let url = format!("{}/pypi/{}/json", self.base_url, package);
        self.client
            .get(&url)
            .send()?
            .error_for_status()?
            .json::<ProjectMetadata>()
    }
}

impl VersionSource for PyPiClient {
    fn name(&self) -> &str {
        "PyPI"
    }

    fn latest_version(&self, package: &str, allow_pre: bool) -> Option<String> {
        match self.fetch(package) {
            Ok(metadata) => Some(select_latest(&metadata, allow_pre)),
            Err(e) => {
                tracing::debug!("Lookup of {} failed: {}", package, e);
                None
            }
        }
    }

    fn latest_versions(&self, packages: &[String], allow_pre: bool) -> Result<LatestVersions> {
        if packages.is_empty() {
            return Ok(LatestVersions::new());
        }

        let queue: Mutex<VecDeque<&String>> = Mutex::new(packages.iter().collect());
        let results: Mutex<LatestVersions> = Mutex::new(LatestVersions::new());

        let progress = ProgressBar::new(packages.len() as u64);
        if let Ok(style) = ProgressStyle::with_template("{spinner} [{pos}/{len}] {msg}") {
            progress.set_style(style);
        }

        let workers = self.concurrency.min(packages.len());
        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let next = queue.lock().ok().and_then(|mut q| q.pop_front());
                    let Some(package) = next else {
                        break;
                    };
                    progress.set_message(package.clone());
                    if let Some(version) = self.latest_version(package, allow_pre) {
                        if let Ok(mut map) = results.lock() {
                            map.insert(normalize_name(package), version);
                        }
                    }
                    progress.inc(1);
                });
            }
        });
        progress.finish_and_clear();

        let latest = results.into_inner().unwrap_or_else(|e| e.into_inner());
        tracing::debug!("Resolved {}/{} packages", latest.len(), packages.len());

        if latest.is_empty() {
            return Err(RepinError::Index(IndexError::NoVersions));
        }
        Ok(latest)
    }
}
