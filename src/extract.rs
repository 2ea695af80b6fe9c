//! Unpacks the daily bundles.

use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use futures::future::join_all;
use tar::Archive;
use tracing::{error, info, warn};

use crate::cli::create_progress_bar;

/// Extension of the compressed members inside a bundle.
pub const MEMBER_EXTENSION: &str = "gz";

/// Unpacks every bundle into `working_dir` and returns the compressed members.
///
/// All extractions are started on the blocking pool and joined before the members are
/// collected, so no member is handed on while a bundle is still being written. A bundle
/// that fails partway is logged and contributes the members written in full before the
/// fault; the member it was writing is removed. Bundles are left in place.
pub async fn extract_bundles(bundles: &[PathBuf], working_dir: &Path) -> Result<Vec<PathBuf>> {
    let pb = create_progress_bar(bundles.len() as u64, "Extracting bundles...".to_string());

    let tasks: Vec<_> = bundles
        .iter()
        .map(|bundle| {
            let bundle = bundle.clone();
            let working_dir = working_dir.to_path_buf();
            let pb = pb.clone();
            tokio::task::spawn_blocking(move || {
                let mut unpacked = Vec::new();
                let result = unpack_bundle(&bundle, &working_dir, &mut unpacked);
                pb.inc(1);
                (bundle, unpacked, result)
            })
        })
        .collect();

    let mut members = Vec::new();
    for result in join_all(tasks).await {
        match result {
            Ok((_, unpacked, Ok(()))) => members.extend(unpacked),
            Ok((bundle, unpacked, Err(e))) => {
                warn!(
                    file = %bundle.display(),
                    complete = unpacked.len(),
                    error = %format!("{:#}", e),
                    "Bundle failed partway, keeping the complete members"
                );
                members.extend(unpacked);
            }
            Err(e) => error!(error = %e, "Extraction task failed"),
        }
    }
    pb.finish_with_message("Bundles extracted");

    members.retain(|m| m.extension().is_some_and(|e| e == MEMBER_EXTENSION));
    members.sort();
    members.dedup();

    info!(
        bundles = bundles.len(),
        members = members.len(),
        "Extracted bundles"
    );

    Ok(members)
}

/// Unpacks one bundle, pushing the path of each file written in full onto `unpacked`.
///
/// On failure `unpacked` still holds the members completed before the fault, and a member
/// cut short by the fault has been removed.
pub fn unpack_bundle(
    bundle: &Path,
    working_dir: &Path,
    unpacked: &mut Vec<PathBuf>,
) -> Result<()> {
    let file =
        File::open(bundle).with_context(|| format!("Failed to open `{}`", bundle.display()))?;
    let mut archive = Archive::new(file);

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let target = working_dir.join(entry.path()?);
        let expected = entry.size();

        let written = entry
            .unpack_in(working_dir)
            .with_context(|| format!("Failed to unpack `{}`", target.display()))
            .and_then(|written| {
                if !written {
                    return Ok(false);
                }
                let len = fs::metadata(&target)?.len();
                if len != expected {
                    return Err(anyhow!(
                        "`{}` is truncated: {} of {} bytes",
                        target.display(),
                        len,
                        expected
                    ));
                }
                Ok(true)
            });

        match written {
            Ok(true) => unpacked.push(target),
            Ok(false) => {}
            Err(e) => {
                remove_partial(&target);
                return Err(e);
            }
        }
    }

    Ok(())
}

fn remove_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(file = %path.display(), error = %e, "Failed to remove partial member"),
    }
}

// -- Tests -------------------------------------------------------------------
