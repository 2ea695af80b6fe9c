//! Crops rasters to the study area.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::cli::create_progress_bar;

use super::RasterTool;

/// Crops each raster to `boundary`, writing it under the same name in `dst_dir`.
///
/// `dst_dir` is created if absent. A failed crop is logged and the remaining rasters are
/// still cropped. Returns the rasters written.
pub async fn clip_rasters(
    tool: &dyn RasterTool,
    rasters: &[PathBuf],
    dst_dir: &Path,
    boundary: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dst_dir)
        .with_context(|| format!("Failed to create `{}`", dst_dir.display()))?;

    let pb = create_progress_bar(rasters.len() as u64, "Clipping rasters...".to_string());
    let mut clipped = Vec::with_capacity(rasters.len());

    for raster in rasters {
        let Some(name) = raster.file_name() else {
            continue;
        };
        let destination = dst_dir.join(name);

        match tool.crop(raster, &destination, boundary).await {
            Ok(()) => clipped.push(destination),
            Err(e) => error!(
                file = %raster.display(),
                error = %format!("{:#}", anyhow::Error::from(e)),
                "Clipping failed"
            ),
        }
        pb.inc(1);
    }
    pb.finish_with_message("Rasters clipped");

    info!(
        rasters = rasters.len(),
        clipped = clipped.len(),
        dir = %dst_dir.display(),
        "Clipped rasters"
    );

    Ok(clipped)
}

// -- Tests -------------------------------------------------------------------
