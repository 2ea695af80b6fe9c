//! Command line interface.

pub mod command;

use std::{path::PathBuf, time::Duration};

use clap::{command, Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    download::FetchConfig,
    header::HeaderTemplates,
    product::{Product, VariableSet},
    raster::{GdalCli, GridShape},
    remote::DEFAULT_ROOT,
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Contains the commands
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download, convert and clip every year of the archive
    Sweep {
        #[command(flatten)]
        remote: RemoteArgs,
        #[command(flatten)]
        pipeline: PipelineArgs,
        /// Only process these year directories, e.g. `2004,2005`
        #[arg(long, value_delimiter = ',', env = "SNODAS_YEARS")]
        years: Vec<String>,
    },
    /// List the year directories of the archive, or the months of one year
    Catalog {
        #[command(flatten)]
        remote: RemoteArgs,
        /// List the months of this year directory
        #[arg(long)]
        year: Option<String>,
    },
    /// Convert and clip the bundles already in the working directory
    Process {
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// List the SNODAS products
    Products {},
}

#[derive(Args, Debug, Clone)]
pub struct RemoteArgs {
    /// Root of the remote archive
    #[arg(long, env = "SNODAS_REMOTE_ROOT", default_value = DEFAULT_ROOT)]
    pub remote_root: String,
    /// Retries for a failed bundle download before the run is aborted
    #[arg(long, env = "SNODAS_MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,
    /// Seconds to wait before the first retry
    #[arg(long, env = "SNODAS_RETRY_DELAY", default_value_t = 2)]
    pub retry_delay: u64,
}

impl RemoteArgs {
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            max_retries: self.max_retries,
            retry_delay: Duration::from_secs(self.retry_delay),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    /// Staging directory for bundles and intermediate files
    #[arg(long, env = "SNODAS_WORKING_DIR", default_value = "SNODAS")]
    pub working_dir: PathBuf,
    /// Directory for clipped rasters [default: ~/SNODAS/clipped]
    #[arg(long, env = "SNODAS_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,
    /// Study area boundary used to clip the rasters, e.g. a shapefile
    #[arg(long, env = "SNODAS_BOUNDARY")]
    pub boundary: PathBuf,
    /// Header for grids dated before 2013-10-01 [default: <working dir>/../pre_10_2013.hdr]
    #[arg(long, env = "SNODAS_PRE_TEMPLATE")]
    pub pre_template: Option<PathBuf>,
    /// Header for grids dated on or after 2013-10-01 [default: <working dir>/../post_10_2013.hdr]
    #[arg(long, env = "SNODAS_POST_TEMPLATE")]
    pub post_template: Option<PathBuf>,
    /// Products to unpack, by code or abbreviation [default: 1025,1034,1050]
    #[arg(long, value_delimiter = ',', value_parser = parse_product, env = "SNODAS_VARIABLES")]
    pub variables: Vec<Product>,
    /// Columns of the native grid
    #[arg(long, env = "SNODAS_GRID_SAMPLES", default_value_t = GridShape::SNODAS.samples)]
    pub grid_samples: u64,
    /// Rows of the native grid
    #[arg(long, env = "SNODAS_GRID_LINES", default_value_t = GridShape::SNODAS.lines)]
    pub grid_lines: u64,
    /// gdal_translate executable
    #[arg(long, env = "SNODAS_GDAL_TRANSLATE", default_value = "gdal_translate")]
    pub gdal_translate: String,
    /// gdalwarp executable
    #[arg(long, env = "SNODAS_GDALWARP", default_value = "gdalwarp")]
    pub gdalwarp: String,
}

impl PipelineArgs {
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_default()
                .join("SNODAS")
                .join("clipped")
        })
    }

    pub fn templates(&self) -> HeaderTemplates {
        let defaults = HeaderTemplates::beside(&self.working_dir);

        HeaderTemplates {
            pre_change: self.pre_template.clone().unwrap_or(defaults.pre_change),
            post_change: self.post_template.clone().unwrap_or(defaults.post_change),
        }
    }

    pub fn variables(&self) -> VariableSet {
        if self.variables.is_empty() {
            VariableSet::default()
        } else {
            VariableSet::new(self.variables.iter().copied())
        }
    }

    pub fn grid_shape(&self) -> GridShape {
        GridShape {
            samples: self.grid_samples,
            lines: self.grid_lines,
            ..GridShape::SNODAS
        }
    }

    pub fn raster_tool(&self) -> GdalCli {
        GdalCli::new(&self.gdal_translate, &self.gdalwarp)
    }
}

fn parse_product(s: &str) -> Result<Product, String> {
    s.parse()
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Creates a progress bar.
pub fn create_progress_bar(size: u64, message: String) -> ProgressBar {
    ProgressBar::new(size).with_message(message).with_style(
        ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("##-"),
    )
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_process_command_with_defaults() {
        let cli = Cli::try_parse_from(["snodas", "process", "--boundary", "cvws.shp"]).unwrap();

        let Commands::Process { pipeline } = cli.command else {
            panic!("expected process command");
        };
        assert_eq!(pipeline.working_dir, PathBuf::from("SNODAS"));
        assert_eq!(pipeline.variables(), VariableSet::default());
        assert_eq!(pipeline.grid_shape(), GridShape::SNODAS);
        assert_eq!(
            pipeline.templates().pre_change,
            PathBuf::from("SNODAS").join("..").join("pre_10_2013.hdr")
        );
    }

    #[test]
    fn should_parse_variable_override() {
        let cli = Cli::try_parse_from([
            "snodas",
            "process",
            "--boundary",
            "cvws.shp",
            "--variables",
            "1036,SMLT",
        ])
        .unwrap();

        let Commands::Process { pipeline } = cli.command else {
            panic!("expected process command");
        };
        assert_eq!(
            pipeline.variables(),
            VariableSet::new([Product::SnowDepth, Product::SnowMelt])
        );
    }

    #[test]
    fn should_reject_unknown_variable() {
        let result = Cli::try_parse_from([
            "snodas",
            "process",
            "--boundary",
            "cvws.shp",
            "--variables",
            "9999",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn should_parse_sweep_years() {
        let cli = Cli::try_parse_from([
            "snodas",
            "sweep",
            "--boundary",
            "cvws.shp",
            "--years",
            "2004,2005",
            "--max-retries",
            "1",
        ])
        .unwrap();

        let Commands::Sweep {
            remote,
            pipeline: _,
            years,
        } = cli.command
        else {
            panic!("expected sweep command");
        };
        assert_eq!(years, vec!["2004", "2005"]);
        assert_eq!(remote.remote_root, DEFAULT_ROOT);
        assert_eq!(remote.fetch_config().max_retries, 1);
    }

    #[test]
    fn should_create_progress_bar() {
        let pb = create_progress_bar(10, "Testing...".to_string());
        pb.inc(4);

        assert_eq!(pb.length(), Some(10));
        assert_eq!(pb.position(), 4);
    }
}
