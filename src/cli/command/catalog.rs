//! Lists the remote archive.

use anyhow::Result;

use crate::{
    cli::{create_spinner, RemoteArgs},
    download::ARCHIVE_EXTENSION,
    remote::{child_path, list_directories, list_files, HttpSource, RemoteSource},
};

pub async fn catalog(remote: &RemoteArgs, year: Option<&str>) -> Result<Vec<String>> {
    let source = HttpSource::new(&remote.remote_root)?;

    let bar = create_spinner(format!("Listing {}...", source.root()));
    let lines = catalog_lines(&source, year).await;
    bar.finish_and_clear();

    lines
}

/// Year directories, or with `year` the month directories of that year and their bundle
/// counts.
pub async fn catalog_lines(source: &dyn RemoteSource, year: Option<&str>) -> Result<Vec<String>> {
    let Some(year) = year else {
        return list_directories(source, "").await;
    };

    let mut lines = Vec::new();
    for month in list_directories(source, year).await? {
        let bundles = list_files(source, &child_path(year, &month), ARCHIVE_EXTENSION).await?;
        lines.push(format!("{}/{}  {} bundles", year, month, bundles.len()));
    }

    Ok(lines)
}

// -- Tests -------------------------------------------------------------------
