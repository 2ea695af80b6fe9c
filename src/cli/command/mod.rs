pub mod catalog;
pub mod process;
pub mod products;
pub mod sweep;

use anyhow::{anyhow, Result};
use tracing::debug;

pub use catalog::catalog;
pub use process::process;
pub use products::products;
pub use sweep::sweep;

use crate::{cli::PipelineArgs, pipeline::Pipeline, raster::TranslateOptions};

/// Builds the local stages from the command line, failing early on missing inputs.
pub fn make_pipeline(args: &PipelineArgs) -> Result<Pipeline> {
    let templates = args.templates();
    templates.check()?;

    if !args.boundary.exists() {
        return Err(anyhow!(
            "Boundary `{}` not found",
            args.boundary.display()
        ));
    }

    let pipeline = Pipeline {
        working_dir: args.working_dir.clone(),
        output_dir: args.output_dir(),
        boundary: args.boundary.clone(),
        templates,
        variables: args.variables(),
        translate: TranslateOptions::default(),
        shape: args.grid_shape(),
        tool: Box::new(args.raster_tool()),
    };
    debug!(
        working_dir = %pipeline.working_dir.display(),
        output_dir = %pipeline.output_dir.display(),
        variables = ?pipeline.variables,
        "Pipeline configured"
    );

    Ok(pipeline)
}
