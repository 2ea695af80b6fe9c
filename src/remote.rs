//! The remote archive and the catalog walker.
//!
//! The archive is a tree of year directories (`2004`), month directories (`02_Feb`) and
//! daily bundles (`SNODAS_20040201.tar`). Anything reachable through [`RemoteSource`] can
//! stand in for it.

use std::path::Path;

use anyhow::{anyhow, Context, Error, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Url};
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::{debug, instrument};

/// NSIDC's HTTPS mirror of the masked SNODAS archive (formerly `sidads.colorado.edu`).
pub const DEFAULT_ROOT: &str = "https://noaadata.apps.nsidc.org/NOAA/G02158/masked/";

/// List children of a path and retrieve named files.
///
/// Paths are relative to the source root and use `/` as a separator, e.g. `2004/02_Feb`.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Names of the entries directly below `path`.
    async fn list(&self, path: &str) -> Result<Vec<String>>;

    /// Writes the file at `path` to `destination`, returning the number of bytes written.
    async fn fetch(&self, path: &str, destination: &Path) -> Result<u64>;
}

/// Joins a child name onto a remote path.
pub fn child_path(parent: &str, name: &str) -> String {
    let parent = parent.trim_end_matches('/');
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Entries without a `.` are directories, everything else is a data file.
pub fn is_directory_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('.')
}

/// Returns the directory children of `path`.
///
/// A failure to reach the source is fatal for the run, so it is returned rather than
/// treated as an empty listing.
pub async fn list_directories(source: &dyn RemoteSource, path: &str) -> Result<Vec<String>> {
    let entries = source
        .list(path)
        .await
        .with_context(|| format!("Failed to list remote directory `{}`", path))?;

    Ok(entries
        .into_iter()
        .filter(|name| is_directory_name(name))
        .collect())
}

/// Returns the names below `path` with the given extension.
pub async fn list_files(
    source: &dyn RemoteSource,
    path: &str,
    extension: &str,
) -> Result<Vec<String>> {
    let suffix = format!(".{}", extension);
    let entries = source
        .list(path)
        .await
        .with_context(|| format!("Failed to list remote directory `{}`", path))?;

    Ok(entries
        .into_iter()
        .filter(|name| name.ends_with(&suffix))
        .collect())
}

/// An archive served as Apache-style HTML directory listings.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    root: Url,
}

impl HttpSource {
    pub fn new(root: &str) -> Result<Self> {
        // Without a trailing slash `Url::join` would replace the last segment.
        let root = if root.ends_with('/') {
            root.to_string()
        } else {
            format!("{}/", root)
        };
        let root = Url::parse(&root).with_context(|| format!("Invalid remote root `{}`", root))?;
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(HttpSource { client, root })
    }

    pub fn root(&self) -> &Url {
        &self.root
    }

    fn url(&self, path: &str, directory: bool) -> Result<Url> {
        let path = path.trim_matches('/');
        let relative = if directory && !path.is_empty() {
            format!("{}/", path)
        } else {
            path.to_string()
        };

        self.root
            .join(&relative)
            .with_context(|| format!("Invalid remote path `{}`", path))
    }
}

#[async_trait]
impl RemoteSource for HttpSource {
    #[instrument(level = "debug", skip(self))]
    async fn list(&self, path: &str) -> Result<Vec<String>> {
        let url = self.url(path, true)?;
        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("Failed to list {}: {}", url, response.status()));
        }

        let body = response.text().await?;
        let entries = parse_listing(&body);
        debug!(url = %url, entries = entries.len(), "Listed remote directory");

        Ok(entries)
    }

    #[instrument(level = "debug", skip(self, destination))]
    async fn fetch(&self, path: &str, destination: &Path) -> Result<u64> {
        let url = self.url(path, false)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::msg(format!("Failed to download {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(anyhow!("Failed to download {}: {}", url, response.status()));
        }

        let mut file = File::create(destination).await?;
        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| Error::msg(format!("Error reading chunk: {}", e)))?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(downloaded)
    }
}

/// Extracts entry names from the anchors of an HTML directory listing.
///
/// Sort links (`?C=N;O=D`), absolute links and the parent directory are dropped, and the
/// trailing `/` of directory links is removed.
pub fn parse_listing(body: &str) -> Vec<String> {
    let mut entries: Vec<String> = Vec::new();

    for (start, _) in body.match_indices("href=\"") {
        let rest = &body[start + 6..];
        let Some(end) = rest.find('"') else {
            continue;
        };
        let href = &rest[..end];

        if href.is_empty()
            || href.starts_with('?')
            || href.starts_with('/')
            || href.starts_with('#')
            || href.starts_with("..")
            || href.contains("://")
        {
            continue;
        }

        let name = href.trim_start_matches("./").trim_end_matches('/');
        if !name.is_empty() && !entries.iter().any(|e| e == name) {
            entries.push(name.to_string());
        }
    }

    entries
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemorySource;

    const LISTING: &str = r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 3.2 Final//EN">
<html>
 <head>
  <title>Index of /NOAA/G02158/masked/2004</title>
 </head>
 <body>
<h1>Index of /NOAA/G02158/masked/2004</h1>
<table>
<tr><th><a href="?C=N;O=D">Name</a></th><th><a href="?C=M;O=A">Last modified</a></th></tr>
<tr><td><a href="/NOAA/G02158/masked/">Parent Directory</a></td></tr>
<tr><td><a href="01_Jan/">01_Jan/</a></td></tr>
<tr><td><a href="02_Feb/">02_Feb/</a></td></tr>
<tr><td><a href="SNODAS_20040101.tar">SNODAS_20040101.tar</a></td></tr>
<tr><td><a href="https://nsidc.org/">NSIDC</a></td></tr>
</table>
</body></html>"#;

    #[test]
    fn should_parse_listing() {
        let entries = parse_listing(LISTING);

        assert_eq!(entries, vec!["01_Jan", "02_Feb", "SNODAS_20040101.tar"]);
    }

    #[test]
    fn should_classify_directory_names() {
        assert!(is_directory_name("2004"));
        assert!(is_directory_name("02_Feb"));
        assert!(!is_directory_name("SNODAS_20040201.tar"));
        assert!(!is_directory_name("README.txt"));
        assert!(!is_directory_name(""));
    }

    #[test]
    fn should_join_child_paths() {
        assert_eq!(child_path("", "2004"), "2004");
        assert_eq!(child_path("2004/", "02_Feb"), "2004/02_Feb");
        assert_eq!(child_path("2004", "02_Feb"), "2004/02_Feb");
    }

    #[test]
    fn should_build_urls_under_root() {
        let source = HttpSource::new("https://example.com/NOAA/G02158/masked").unwrap();

        assert_eq!(
            source.url("2004/02_Feb", true).unwrap().as_str(),
            "https://example.com/NOAA/G02158/masked/2004/02_Feb/"
        );
        assert_eq!(
            source.url("2004/02_Feb/SNODAS_20040201.tar", false).unwrap().as_str(),
            "https://example.com/NOAA/G02158/masked/2004/02_Feb/SNODAS_20040201.tar"
        );
        assert_eq!(
            source.url("", true).unwrap().as_str(),
            "https://example.com/NOAA/G02158/masked/"
        );
    }

    #[tokio::test]
    async fn should_list_directories_only() {
        let source = MemorySource::new()
            .with_file("2003/10_Oct/SNODAS_20031001.tar", b"a")
            .with_file("2004/01_Jan/SNODAS_20040101.tar", b"b")
            .with_file("README.txt", b"c");

        let years = list_directories(&source, "").await.unwrap();
        assert_eq!(years, vec!["2003", "2004"]);

        let months = list_directories(&source, "2004").await.unwrap();
        assert_eq!(months, vec!["01_Jan"]);
    }

    #[tokio::test]
    async fn should_fail_when_source_is_unreachable() {
        let source = MemorySource::new().unreachable();

        assert!(list_directories(&source, "").await.is_err());
    }
}
