//! Downloads the daily bundles of a month into the staging directory.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Error, Result};
use tracing::{debug, info, warn};

use crate::{
    cli::create_progress_bar,
    remote::{child_path, list_directories, list_files, RemoteSource},
};

/// Extension of the daily bundles.
pub const ARCHIVE_EXTENSION: &str = "tar";

/// Retry policy for a single transfer.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Attempts after the first before a transfer is declared failed.
    pub max_retries: u32,
    /// Delay before the first retry; grows linearly with each attempt.
    pub retry_delay: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// Downloads every bundle of every month of a year directory.
///
/// Returns every bundle in the staging directory once the year is done.
pub async fn fetch_year(
    source: &dyn RemoteSource,
    year_dir: &str,
    staging_dir: &Path,
    config: &FetchConfig,
) -> Result<Vec<PathBuf>> {
    let months = list_directories(source, year_dir).await?;

    info!(year = year_dir, months = months.len(), "Processing SNODAS year");

    for month in &months {
        fetch_month(source, &child_path(year_dir, month), staging_dir, config).await?;
    }

    info!(year = year_dir, "Wrote SNODAS bundles");

    staged_archives(staging_dir)
}

/// Downloads the bundles of one month directory.
///
/// Bundles already in the staging directory are not fetched again. The returned list is
/// every bundle currently staged, not only those of this month, so later stages always work
/// over everything on disk. A transfer that still fails after retrying aborts the month.
pub async fn fetch_month(
    source: &dyn RemoteSource,
    month_dir: &str,
    staging_dir: &Path,
    config: &FetchConfig,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(staging_dir)?;

    let archives = list_files(source, month_dir, ARCHIVE_EXTENSION).await?;
    let pb = create_progress_bar(archives.len() as u64, format!("Downloading {}", month_dir));
    let mut fetched = 0;

    for archive in &archives {
        let destination = staging_dir.join(archive);

        if destination.exists() {
            debug!(path = %destination.display(), "Bundle already staged, skipping download");
        } else {
            fetch_with_retry(source, &child_path(month_dir, archive), &destination, config)
                .await?;
            fetched += 1;
        }

        pb.inc(1);
    }

    pb.finish_with_message(format!("{} downloaded", month_dir));
    info!(
        month = month_dir,
        listed = archives.len(),
        fetched,
        "Month downloaded"
    );

    staged_archives(staging_dir)
}

// Writes to a `.partial` sibling and renames on success, so an interrupted transfer is never
// mistaken for a staged bundle.
async fn fetch_with_retry(
    source: &dyn RemoteSource,
    remote_path: &str,
    destination: &Path,
    config: &FetchConfig,
) -> Result<()> {
    let partial = partial_path(destination);
    let mut attempt = 0;

    loop {
        match source.fetch(remote_path, &partial).await {
            Ok(bytes) => {
                fs::rename(&partial, destination)?;
                debug!(path = %destination.display(), bytes, "Bundle downloaded");
                return Ok(());
            }
            Err(e) => {
                remove_if_exists(&partial)?;
                attempt += 1;

                if attempt > config.max_retries {
                    return Err(e).with_context(|| {
                        format!(
                            "Failed to download `{}` after {} attempts",
                            remote_path, attempt
                        )
                    });
                }

                let delay = config.retry_delay * attempt;
                warn!(
                    path = remote_path,
                    attempt,
                    error = %e,
                    "Download failed, retrying in {:?}",
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(Error::from(e)),
        _ => Ok(()),
    }
}

/// Returns every bundle in the staging directory, sorted by name.
pub fn staged_archives(staging_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut archives = Vec::new();

    for entry in fs::read_dir(staging_dir)
        .with_context(|| format!("Failed to read `{}`", staging_dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == ARCHIVE_EXTENSION) {
            archives.push(path);
        }
    }
    archives.sort();

    Ok(archives)
}

// -- Tests -------------------------------------------------------------------
