//! Per-file faults.
//!
//! Stage and command boundaries use `anyhow`; these types describe the faults that cause a
//! single file to be skipped while the rest of the batch carries on.

use std::{io, process::ExitStatus};

use thiserror::Error;

/// A file name that does not follow the SNODAS naming convention.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NameError {
    #[error("`{name}` has no `{marker}` marker")]
    MissingMarker { marker: &'static str, name: String },

    #[error("`{name}` ends before the {width} characters following `{marker}`")]
    Truncated {
        marker: &'static str,
        width: usize,
        name: String,
    },

    #[error("`{name}` has malformed product code `{code}`")]
    MalformedCode { code: String, name: String },

    #[error("`{name}` has malformed date `{token}`")]
    MalformedDate { token: String, name: String },

    #[error("`{name}` has product code `{code}`, which is not a known SNODAS product")]
    UnknownProduct { code: String, name: String },

    #[error("`{name}` is a precipitation grid with neither an `L00` nor an `L01` token")]
    MissingPhase { name: String },
}

/// A failed call to an external raster tool.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("failed to run `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}
