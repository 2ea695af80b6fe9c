//! Converts and clips the bundles already in the working directory.

use anyhow::Result;

use crate::{cli::PipelineArgs, download::staged_archives, pipeline::Summary};

use super::make_pipeline;

pub async fn process(args: &PipelineArgs) -> Result<Summary> {
    let pipeline = make_pipeline(args)?;
    let bundles = staged_archives(&pipeline.working_dir)?;

    pipeline.process_bundles(&bundles).await
}

// -- Tests -------------------------------------------------------------------
