//! Raster encoding and cropping.
//!
//! The pipeline only needs two raster operations, which [`RasterTool`] abstracts so the
//! stages can be exercised without GDAL installed. [`GdalCli`] runs the GDAL utilities.

pub mod clip;
pub mod convert;

use std::{ffi::OsString, path::Path, process::Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::RasterError;

pub use clip::clip_rasters;
pub use convert::{convert_grids, GridShape};

/// Corners of the SNODAS grid as upper-left x, upper-left y, lower-right x, lower-right y.
pub const SNODAS_EXTENT: [f64; 4] = [-124.73333333, 52.875, -66.94166667, 24.95];

/// Parameters for encoding a grid as a georeferenced raster.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslateOptions {
    pub format: String,
    pub srs: String,
    pub no_data: f64,
    pub ullr: [f64; 4],
}

impl Default for TranslateOptions {
    fn default() -> Self {
        TranslateOptions {
            format: "GTiff".to_string(),
            srs: "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs".to_string(),
            no_data: -9999.0,
            ullr: SNODAS_EXTENT,
        }
    }
}

#[async_trait]
pub trait RasterTool: Send + Sync {
    /// Encodes `src` as `dst`, assigning the reference system, no-data value and corners.
    async fn translate(
        &self,
        src: &Path,
        dst: &Path,
        options: &TranslateOptions,
    ) -> Result<(), RasterError>;

    /// Crops `src` to the polygons of `boundary`, writing `dst`.
    async fn crop(&self, src: &Path, dst: &Path, boundary: &Path) -> Result<(), RasterError>;
}

/// Runs `gdal_translate` and `gdalwarp`.
#[derive(Debug, Clone)]
pub struct GdalCli {
    translate: String,
    warp: String,
}

impl GdalCli {
    pub fn new(translate: &str, warp: &str) -> Self {
        GdalCli {
            translate: translate.to_string(),
            warp: warp.to_string(),
        }
    }

    pub fn translate_args(src: &Path, dst: &Path, options: &TranslateOptions) -> Vec<OsString> {
        let [ulx, uly, lrx, lry] = options.ullr;
        let mut args: Vec<OsString> = [
            "-of".to_string(),
            options.format.clone(),
            "-a_srs".to_string(),
            options.srs.clone(),
            "-a_nodata".to_string(),
            options.no_data.to_string(),
            "-a_ullr".to_string(),
            ulx.to_string(),
            uly.to_string(),
            lrx.to_string(),
            lry.to_string(),
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(src.into());
        args.push(dst.into());

        args
    }

    pub fn crop_args(src: &Path, dst: &Path, boundary: &Path) -> Vec<OsString> {
        vec![
            "-overwrite".into(),
            "-cutline".into(),
            boundary.into(),
            "-crop_to_cutline".into(),
            src.into(),
            dst.into(),
        ]
    }

    async fn run(&self, program: &str, args: Vec<OsString>) -> Result<(), RasterError> {
        debug!(program, ?args, "Running GDAL");

        let output = Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| RasterError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(RasterError::Failed {
                program: program.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

impl Default for GdalCli {
    fn default() -> Self {
        GdalCli::new("gdal_translate", "gdalwarp")
    }
}

#[async_trait]
impl RasterTool for GdalCli {
    async fn translate(
        &self,
        src: &Path,
        dst: &Path,
        options: &TranslateOptions,
    ) -> Result<(), RasterError> {
        self.run(&self.translate, GdalCli::translate_args(src, dst, options))
            .await
    }

    async fn crop(&self, src: &Path, dst: &Path, boundary: &Path) -> Result<(), RasterError> {
        self.run(&self.warp, GdalCli::crop_args(src, dst, boundary))
            .await
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_translate_arguments() {
        let args = GdalCli::translate_args(
            Path::new("in.dat"),
            Path::new("out.tif"),
            &TranslateOptions::default(),
        );

        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().to_string()).collect();
        assert_eq!(
            args,
            vec![
                "-of",
                "GTiff",
                "-a_srs",
                "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs",
                "-a_nodata",
                "-9999",
                "-a_ullr",
                "-124.73333333",
                "52.875",
                "-66.94166667",
                "24.95",
                "in.dat",
                "out.tif",
            ]
        );
    }

    #[test]
    fn should_build_crop_arguments() {
        let args = GdalCli::crop_args(
            Path::new("in.tif"),
            Path::new("clipped/in.tif"),
            Path::new("cvws.shp"),
        );

        assert_eq!(args[1], OsString::from("-cutline"));
        assert_eq!(args[2], OsString::from("cvws.shp"));
        assert_eq!(args[3], OsString::from("-crop_to_cutline"));
        assert_eq!(args[5], OsString::from("clipped/in.tif"));
    }

    #[tokio::test]
    async fn should_report_missing_executable() {
        let tool = GdalCli::new("snodas-no-such-gdal_translate", "snodas-no-such-gdalwarp");

        let result = tool
            .translate(
                Path::new("in.dat"),
                Path::new("out.tif"),
                &TranslateOptions::default(),
            )
            .await;

        assert!(matches!(result, Err(RasterError::Spawn { .. })));
    }
}
