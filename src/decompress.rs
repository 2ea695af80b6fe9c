//! Selects the wanted products among the unpacked members and decompresses them.

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use tracing::{info, warn};

use crate::{
    cli::create_progress_bar,
    product::{file_name::product_code, VariableSet},
};

/// Extension of the binary data grids.
pub const GRID_EXTENSION: &str = "dat";
/// Extension of the text descriptors.
pub const DESCRIPTOR_EXTENSION: &str = "txt";

/// Decompressed members, split by kind.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Decompressed {
    pub grids: Vec<PathBuf>,
    pub descriptors: Vec<PathBuf>,
}

/// Decompresses the members whose product is in `variables`, then deletes every member.
///
/// Filtering only decides what is decompressed: members of other products, and members
/// whose names cannot be parsed, are deleted all the same.
pub fn decompress_members(members: &[PathBuf], variables: &VariableSet) -> Result<Decompressed> {
    let retained = filter_members(members, variables);
    let pb = create_progress_bar(retained.len() as u64, "Decompressing members...".to_string());
    let mut decompressed = Decompressed::default();

    for member in &retained {
        match decompress(member) {
            Ok(output) => {
                if has_extension(&output, GRID_EXTENSION) {
                    decompressed.grids.push(output);
                } else if has_extension(&output, DESCRIPTOR_EXTENSION) {
                    decompressed.descriptors.push(output);
                }
            }
            Err(e) => {
                warn!(file = %member.display(), error = %format!("{:#}", e), "Skipping member")
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("Members decompressed");

    for member in members {
        match fs::remove_file(member) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                return Err(e).with_context(|| format!("Failed to remove `{}`", member.display()))
            }
            _ => {}
        }
    }

    info!(
        members = members.len(),
        retained = retained.len(),
        grids = decompressed.grids.len(),
        descriptors = decompressed.descriptors.len(),
        "Decompressed members"
    );

    Ok(decompressed)
}

/// Returns the members whose product code is in `variables`.
pub fn filter_members<'a>(members: &'a [PathBuf], variables: &VariableSet) -> Vec<&'a PathBuf> {
    members
        .iter()
        .filter(|member| {
            let name = file_name(member);
            match product_code(&name) {
                Ok(code) => variables.contains_code(code),
                Err(e) => {
                    warn!(file = %member.display(), error = %e, "Member has no product code");
                    false
                }
            }
        })
        .collect()
}

/// Decompresses `member` into a sibling without the `.gz` extension.
fn decompress(member: &Path) -> Result<PathBuf> {
    let output = member.with_extension("");
    let mut decoder = GzDecoder::new(BufReader::new(
        File::open(member).with_context(|| format!("Failed to open `{}`", member.display()))?,
    ));
    let mut writer = BufWriter::new(
        File::create(&output).with_context(|| format!("Failed to create `{}`", output.display()))?,
    );

    if let Err(e) = io::copy(&mut decoder, &mut writer) {
        drop(writer);
        let _ = fs::remove_file(&output);
        return Err(e).with_context(|| format!("Failed to decompress `{}`", member.display()));
    }

    Ok(output)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|e| e == extension)
}

// -- Tests -------------------------------------------------------------------
