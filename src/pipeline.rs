//! Runs the local stages over a batch of staged bundles.
//!
//! Each stage finishes with the whole batch before the next one starts.

use std::{fmt, path::PathBuf};

use anyhow::Result;
use tracing::info;

use crate::{
    decompress::decompress_members,
    extract::extract_bundles,
    header::{assign_headers, HeaderTemplates},
    product::VariableSet,
    raster::{clip_rasters, convert_grids, GridShape, RasterTool, TranslateOptions},
};

pub struct Pipeline {
    pub working_dir: PathBuf,
    pub output_dir: PathBuf,
    pub boundary: PathBuf,
    pub templates: HeaderTemplates,
    pub variables: VariableSet,
    pub translate: TranslateOptions,
    pub shape: GridShape,
    pub tool: Box<dyn RasterTool>,
}

/// How many files each stage produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub bundles: usize,
    pub members: usize,
    pub grids: usize,
    pub descriptors: usize,
    pub headers: usize,
    pub rasters: usize,
    pub clipped: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bundles, {} members, {} grids, {} headers, {} rasters, {} clipped",
            self.bundles, self.members, self.grids, self.headers, self.rasters, self.clipped
        )
    }
}

impl Pipeline {
    /// Extracts, decompresses, georeferences, converts and clips `bundles`.
    pub async fn process_bundles(&self, bundles: &[PathBuf]) -> Result<Summary> {
        let members = extract_bundles(bundles, &self.working_dir).await?;
        let decompressed = decompress_members(&members, &self.variables)?;
        let headers = assign_headers(&decompressed.descriptors, &self.working_dir, &self.templates);
        let rasters = convert_grids(
            self.tool.as_ref(),
            &decompressed.grids,
            &self.working_dir,
            &self.translate,
            &self.shape,
        )
        .await?;
        let clipped =
            clip_rasters(self.tool.as_ref(), &rasters, &self.output_dir, &self.boundary).await?;

        let summary = Summary {
            bundles: bundles.len(),
            members: members.len(),
            grids: decompressed.grids.len(),
            descriptors: decompressed.descriptors.len(),
            headers: headers.len(),
            rasters: rasters.len(),
            clipped: clipped.len(),
        };
        info!(%summary, "Processed bundles");

        Ok(summary)
    }
}

// -- Tests -------------------------------------------------------------------
