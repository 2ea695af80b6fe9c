//! Assigns georeferencing headers to the unpacked grids.
//!
//! NOHRSC changed the SNODAS grid definition on 2013-10-01, so a grid needs one of two
//! header templates depending on its date. Using the wrong one shifts the whole raster, and
//! nothing downstream would notice.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use tracing::{info, warn};

use crate::product::file_name::product_date;

/// First day of the post-change grid definition.
pub const DATUM_CHANGE: NaiveDate = match NaiveDate::from_ymd_opt(2013, 10, 1) {
    Some(date) => date,
    None => panic!("invalid datum change date"),
};

/// Extension of the headers written next to the grids.
pub const HEADER_EXTENSION: &str = "hdr";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderEra {
    PreChange,
    PostChange,
}

impl HeaderEra {
    pub fn for_date(date: NaiveDate) -> Self {
        if date < DATUM_CHANGE {
            HeaderEra::PreChange
        } else {
            HeaderEra::PostChange
        }
    }
}

/// The two header templates. Their contents are copied, never parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderTemplates {
    pub pre_change: PathBuf,
    pub post_change: PathBuf,
}

impl HeaderTemplates {
    /// Templates named `pre_10_2013.hdr` and `post_10_2013.hdr` in the parent of `dir`.
    pub fn beside(dir: &Path) -> Self {
        let parent = dir.join("..");
        HeaderTemplates {
            pre_change: parent.join("pre_10_2013.hdr"),
            post_change: parent.join("post_10_2013.hdr"),
        }
    }

    pub fn select(&self, date: NaiveDate) -> &Path {
        match HeaderEra::for_date(date) {
            HeaderEra::PreChange => &self.pre_change,
            HeaderEra::PostChange => &self.post_change,
        }
    }

    /// Fails unless both templates exist.
    pub fn check(&self) -> Result<()> {
        for template in [&self.pre_change, &self.post_change] {
            if !template.is_file() {
                return Err(anyhow!("Header template `{}` not found", template.display()));
            }
        }

        Ok(())
    }
}

/// Copies the matching template to `<descriptor stem>.hdr` in `dir` for each descriptor.
///
/// A descriptor whose name carries no date is logged and skipped.
pub fn assign_headers(
    descriptors: &[PathBuf],
    dir: &Path,
    templates: &HeaderTemplates,
) -> Vec<PathBuf> {
    let mut headers = Vec::with_capacity(descriptors.len());

    for descriptor in descriptors {
        match assign_header(descriptor, dir, templates) {
            Ok(header) => headers.push(header),
            Err(e) => warn!(file = %descriptor.display(), error = %e, "Skipping descriptor"),
        }
    }

    info!(headers = headers.len(), "Assigned headers");

    headers
}

fn assign_header(descriptor: &Path, dir: &Path, templates: &HeaderTemplates) -> Result<PathBuf> {
    let name = descriptor
        .file_name()
        .ok_or_else(|| anyhow!("`{}` has no file name", descriptor.display()))?
        .to_string_lossy();
    let stem = descriptor
        .file_stem()
        .ok_or_else(|| anyhow!("`{}` has no file name", descriptor.display()))?
        .to_string_lossy();

    let date = product_date(&name)?;
    let template = templates.select(date);
    let header = dir.join(format!("{}.{}", stem, HEADER_EXTENSION));

    fs::copy(template, &header).with_context(|| {
        format!(
            "Failed to copy `{}` to `{}`",
            template.display(),
            header.display()
        )
    })?;

    Ok(header)
}

// -- Tests -------------------------------------------------------------------
