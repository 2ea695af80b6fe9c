//! Converts the data grids to GeoTIFF.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::{cli::create_progress_bar, product::MemberName};

use super::{RasterTool, TranslateOptions};

/// Extension of the converted rasters.
pub const RASTER_EXTENSION: &str = "tif";

/// Dimensions of a native grid.
///
/// Every grid is given the same corners, which is only right if every grid has these
/// dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub samples: u64,
    pub lines: u64,
    pub bytes_per_sample: u64,
}

impl GridShape {
    /// The masked contiguous US grid: 6935 x 3351 big-endian 16-bit integers.
    pub const SNODAS: GridShape = GridShape {
        samples: 6935,
        lines: 3351,
        bytes_per_sample: 2,
    };

    pub fn expected_len(&self) -> u64 {
        self.samples * self.lines * self.bytes_per_sample
    }

    /// Returns the actual size of `grid` if it does not match this shape.
    pub fn mismatch(&self, grid: &Path) -> Result<Option<u64>> {
        let len = fs::metadata(grid)
            .with_context(|| format!("Failed to read `{}`", grid.display()))?
            .len();

        Ok((len != self.expected_len()).then_some(len))
    }
}

/// A grid and the raster it becomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Pairs each grid with its raster name in `dir`.
///
/// Grids whose names cannot be parsed, and grids that would produce a raster name already
/// taken by an earlier grid, are logged and left out.
pub fn plan_conversions(grids: &[PathBuf], dir: &Path) -> Vec<Conversion> {
    let mut planned = Vec::with_capacity(grids.len());
    let mut outputs = HashSet::new();

    for grid in grids {
        let name = grid
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let raster_name = match MemberName::parse(&name) {
            Ok(member) => member.raster_name(),
            Err(e) => {
                warn!(file = %grid.display(), error = %e, "Skipping grid");
                continue;
            }
        };

        if !outputs.insert(raster_name.clone()) {
            error!(
                file = %grid.display(),
                raster = %raster_name,
                "Another grid already converts to this raster, skipping"
            );
            continue;
        }

        planned.push(Conversion {
            input: grid.clone(),
            output: dir.join(raster_name),
        });
    }

    planned
}

/// Converts each grid to a GeoTIFF in `dir`, then deletes every file in `dir` that is not a
/// GeoTIFF.
///
/// A grid whose size does not match `shape` is converted anyway, with a warning. A failed
/// conversion is logged and the grid is left out of the result.
pub async fn convert_grids(
    tool: &dyn RasterTool,
    grids: &[PathBuf],
    dir: &Path,
    options: &TranslateOptions,
    shape: &GridShape,
) -> Result<Vec<PathBuf>> {
    let conversions = plan_conversions(grids, dir);
    let pb = create_progress_bar(conversions.len() as u64, "Converting grids...".to_string());
    let mut rasters = Vec::with_capacity(conversions.len());

    for conversion in conversions {
        match shape.mismatch(&conversion.input) {
            Ok(Some(len)) => warn!(
                file = %conversion.input.display(),
                bytes = len,
                expected = shape.expected_len(),
                "Grid size does not match the grid shape, raster will be misplaced"
            ),
            Ok(None) => {}
            Err(e) => warn!(file = %conversion.input.display(), error = %e, "Cannot check grid size"),
        }

        match tool
            .translate(&conversion.input, &conversion.output, options)
            .await
        {
            Ok(()) => rasters.push(conversion.output),
            Err(e) => error!(
                file = %conversion.input.display(),
                error = %format!("{:#}", anyhow::Error::from(e)),
                "Conversion failed"
            ),
        }
        pb.inc(1);
    }
    pb.finish_with_message("Grids converted");

    let removed = remove_intermediates(dir)?;
    info!(rasters = rasters.len(), removed, "Converted grids");

    Ok(rasters)
}

/// Deletes every file in `dir` that is not a GeoTIFF, returning how many were deleted.
pub fn remove_intermediates(dir: &Path) -> Result<usize> {
    let mut removed = 0;

    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read `{}`", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && !path.extension().is_some_and(|e| e == RASTER_EXTENSION) {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove `{}`", path.display()))?;
            removed += 1;
        }
    }

    Ok(removed)
}

// -- Tests -------------------------------------------------------------------
