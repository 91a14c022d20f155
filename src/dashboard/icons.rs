//! Favicon downloader for service cards.
//!
//! For each service the origin's `/favicon.ico` is tried first; when that is
//! not an image, the service page is fetched and the first `<link rel="icon">`
//! it declares is downloaded instead. Files land in one directory as
//! `<name>.ico`, ready to be referenced from `imageUrl` as `/icons/<file>`.

use crate::config::DashboardConfig;
use crate::error::{AppError, Result};
use crate::store::Service;
use reqwest::{StatusCode, header};
use std::path::Path;
use url::Url;

// Some services only hand out their icon to browsers
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Outcome counts of one download run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IconSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub missing: usize,
}

#[derive(Clone)]
pub struct IconFetcher {
    client: reqwest::Client,
}

impl IconFetcher {
    /// # Errors
    ///
    /// Returns error if HTTP client creation fails
    pub fn new(config: &DashboardConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(
                config.request_timeout_seconds,
            ))
            .user_agent(USER_AGENT)
            .no_proxy()
            .build()
            .map_err(|e| {
                AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    /// Download an icon for every service that has none in `dir` yet
    ///
    /// A service whose icon cannot be found or fetched is counted as missing
    /// and does not stop the run.
    ///
    /// # Errors
    ///
    /// Returns error if `dir` cannot be created or an icon cannot be written
    pub async fn download_all(&self, services: &[Service], dir: &Path) -> Result<IconSummary> {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "Failed to create {}: {}",
                dir.display(),
                e
            ))
        })?;

        let mut summary = IconSummary::default();
        for service in services {
            if let Some(existing) = existing_icon(service, dir) {
                tracing::info!(
                    "Icon for '{}' already exists at {}, skipping",
                    service.name,
                    existing.display()
                );
                summary.skipped += 1;
                continue;
            }

            let icon = match self.fetch_icon(&service.url).await {
                Ok(Some(icon)) => icon,
                Ok(None) => {
                    tracing::warn!("No icon found for '{}' at {}", service.name, service.url);
                    summary.missing += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Error fetching icon for '{}': {}", service.name, e);
                    summary.missing += 1;
                    continue;
                }
            };

            let file_name = icon_file_name(&service.name);
            let path = dir.join(&file_name);
            tokio::fs::write(&path, icon).await.map_err(|e| {
                AppError::Internal(anyhow::anyhow!(
                    "Failed to write {}: {}",
                    path.display(),
                    e
                ))
            })?;

            tracing::info!(
                "Saved icon for '{}' to {} (imageUrl: /icons/{})",
                service.name,
                path.display(),
                file_name
            );
            summary.downloaded += 1;
        }

        Ok(summary)
    }

    /// Icon bytes for the service at `service_url`, if one can be found
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid or a request fails outright
    pub async fn fetch_icon(&self, service_url: &str) -> Result<Option<Vec<u8>>> {
        let page = Url::parse(service_url)
            .map_err(|e| AppError::InvalidService(format!("Invalid URL {}: {}", service_url, e)))?;

        let favicon = page
            .join("/favicon.ico")
            .map_err(|e| AppError::InvalidService(format!("Invalid URL {}: {}", service_url, e)))?;
        if let Some(icon) = self.fetch_image(favicon).await? {
            return Ok(Some(icon));
        }

        tracing::debug!("No favicon.ico at {}, looking for a link tag", page);
        let response = self.client.get(page.clone()).send().await?;
        if response.status() != StatusCode::OK {
            return Ok(None);
        }
        let html = response.text().await?;

        let Some(href) = find_icon_href(&html) else {
            return Ok(None);
        };
        match page.join(&href) {
            Ok(icon_url) => self.fetch_image(icon_url).await,
            Err(e) => {
                tracing::debug!("Ignoring icon href {:?}: {}", href, e);
                Ok(None)
            }
        }
    }

    async fn fetch_image(&self, url: Url) -> Result<Option<Vec<u8>>> {
        let response = self.client.get(url.clone()).send().await?;

        let is_image = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("image"));

        if response.status() != StatusCode::OK || !is_image {
            tracing::debug!("{} is not an icon ({})", url, response.status());
            return Ok(None);
        }

        Ok(Some(response.bytes().await?.to_vec()))
    }
}

/// File name an icon for `name` is saved under
pub fn icon_file_name(name: &str) -> String {
    format!("{}.ico", name.to_lowercase())
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect()
}

fn existing_icon(service: &Service, dir: &Path) -> Option<std::path::PathBuf> {
    let referenced = service
        .image_url
        .as_deref()
        .and_then(|image_url| image_url.rsplit('/').next())
        .filter(|file| !file.is_empty())
        .map(|file| dir.join(file));

    referenced
        .into_iter()
        .chain(std::iter::once(dir.join(icon_file_name(&service.name))))
        .find(|path| path.is_file())
}

/// `href` of the first `<link>` whose `rel` lists `icon`
fn find_icon_href(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let mut rest = 0;

    while let Some(offset) = lower[rest..].find("<link") {
        let start = rest + offset;
        let end = lower[start..].find('>').map_or(lower.len(), |i| start + i);
        let tag = &html[start..end];
        rest = end;

        let is_icon = attribute(tag, "rel").is_some_and(|rel| {
            rel.split_ascii_whitespace()
                .any(|token| token.eq_ignore_ascii_case("icon"))
        });
        if !is_icon {
            continue;
        }
        if let Some(href) = attribute(tag, "href").filter(|href| !href.is_empty()) {
            return Some(href.to_string());
        }
    }

    None
}

/// Value of a quoted or bare attribute inside one tag
fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let lower = tag.to_ascii_lowercase();
    let mut from = 0;

    while let Some(offset) = lower[from..].find(name) {
        let at = from + offset;
        from = at + name.len();

        let preceded = lower[..at]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_whitespace());
        let after = lower[from..].trim_start();
        if !preceded || !after.starts_with('=') {
            continue;
        }

        let value_start = tag.len() - after.len() + 1;
        let value = tag[value_start..].trim_start();
        return match value.chars().next() {
            Some(quote @ ('"' | '\'')) => value[1..].split(quote).next(),
            _ => value.split_ascii_whitespace().next(),
        };
    }

    None
}
