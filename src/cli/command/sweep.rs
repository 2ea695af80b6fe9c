//! Downloads, converts and clips the archive one year at a time.

use anyhow::Result;
use tracing::{info, warn};

use crate::{
    cli::{create_spinner, PipelineArgs, RemoteArgs},
    download::{fetch_year, FetchConfig},
    pipeline::{Pipeline, Summary},
    remote::{list_directories, HttpSource, RemoteSource},
};

use super::make_pipeline;

pub async fn sweep(
    remote: &RemoteArgs,
    pipeline_args: &PipelineArgs,
    years: &[String],
) -> Result<Summary> {
    let pipeline = make_pipeline(pipeline_args)?;
    let source = HttpSource::new(&remote.remote_root)?;

    run_sweep(&source, &pipeline, &remote.fetch_config(), years).await
}

/// Fetches each selected year and runs the local stages over it before moving on.
pub async fn run_sweep(
    source: &dyn RemoteSource,
    pipeline: &Pipeline,
    config: &FetchConfig,
    years: &[String],
) -> Result<Summary> {
    let bar = create_spinner("Listing archive years...".to_string());
    let available = list_directories(source, "").await?;
    bar.finish_with_message(format!("Found {} years", available.len()));

    let selected = select_years(available, years);
    let mut total = Summary::default();

    for year in &selected {
        let bundles = fetch_year(source, year, &pipeline.working_dir, config).await?;
        let summary = pipeline.process_bundles(&bundles).await?;
        info!(year = year.as_str(), %summary, "Year complete");

        total.bundles += summary.bundles;
        total.members += summary.members;
        total.grids += summary.grids;
        total.descriptors += summary.descriptors;
        total.headers += summary.headers;
        total.rasters += summary.rasters;
        total.clipped += summary.clipped;
    }

    Ok(total)
}

// Every available year when none are requested, otherwise the requested years in archive
// order. Requested years missing from the archive are reported and ignored.
fn select_years(available: Vec<String>, requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        return available;
    }

    for year in requested {
        if !available.contains(year) {
            warn!(year = year.as_str(), "Year not found in archive");
        }
    }

    available
        .into_iter()
        .filter(|year| requested.contains(year))
        .collect()
}

// -- Tests -------------------------------------------------------------------
