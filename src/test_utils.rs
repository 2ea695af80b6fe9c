//! Fakes and fixtures shared by the unit tests.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use flate2::{write::GzEncoder, Compression};

use crate::{
    error::RasterError,
    raster::{RasterTool, TranslateOptions},
    remote::RemoteSource,
};

/// A grid member name for `code` on `date` (YYYYMMDD).
pub(crate) fn grid_name(code: &str, date: &str) -> String {
    format!("us_ssmv1{}tS__T0001TTNATS{}05HP001.dat", code, date)
}

/// A descriptor member name for `code` on `date` (YYYYMMDD).
pub(crate) fn descriptor_name(code: &str, date: &str) -> String {
    format!("us_ssmv1{}tS__T0001TTNATS{}05HP001.txt", code, date)
}

/// A precipitation grid name carrying the phase `token` (`L00` or `L01`).
pub(crate) fn precipitation_name(token: &str, date: &str, extension: &str) -> String {
    format!("us_ssmv01025Sl{}T0024TTNATS{}05DP001.{}", token, date, extension)
}

pub(crate) fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Writes a tar bundle holding `members` into `dir`.
pub(crate) fn write_bundle(dir: &Path, name: &str, members: &[(String, Vec<u8>)]) -> PathBuf {
    let path = dir.join(name);
    let mut builder = tar::Builder::new(File::create(&path).unwrap());

    for (member, data) in members {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, member, data.as_slice()).unwrap();
    }
    builder.finish().unwrap();

    path
}

/// Writes `data` to `dir/name`.
pub(crate) fn touch(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, data).unwrap();
    path
}

/// Sorted file names in `dir`.
pub(crate) fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

/// An in-memory archive keyed by `/` separated path.
#[derive(Default)]
pub(crate) struct MemorySource {
    files: BTreeMap<String, Vec<u8>>,
    unreachable: bool,
    failures: AtomicUsize,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        MemorySource::default()
    }

    pub fn with_file(mut self, path: &str, data: &[u8]) -> Self {
        self.files.insert(path.to_string(), data.to_vec());
        self
    }

    /// Every call fails, as if the host could not be reached.
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// The next `count` fetches fail.
    pub fn failing(self, count: usize) -> Self {
        self.failures.store(count, Ordering::SeqCst);
        self
    }

    /// Number of completed fetches.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteSource for MemorySource {
    async fn list(&self, path: &str) -> Result<Vec<String>> {
        if self.unreachable {
            return Err(anyhow!("connection refused"));
        }

        let path = path.trim_matches('/');
        let prefix = if path.is_empty() {
            String::new()
        } else {
            format!("{}/", path)
        };

        let children: BTreeSet<String> = self
            .files
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter_map(|rest| rest.split('/').next())
            .map(|child| child.to_string())
            .collect();

        Ok(children.into_iter().collect())
    }

    async fn fetch(&self, path: &str, destination: &Path) -> Result<u64> {
        if self.unreachable {
            return Err(anyhow!("connection refused"));
        }
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            std::fs::write(destination, b"trunc")?;
            return Err(anyhow!("connection reset while fetching {}", path));
        }

        let data = self
            .files
            .get(path.trim_matches('/'))
            .ok_or_else(|| anyhow!("no such file {}", path))?;
        std::fs::write(destination, data)?;
        self.fetches.fetch_add(1, Ordering::SeqCst);

        Ok(data.len() as u64)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RasterCall {
    Translate {
        src: PathBuf,
        dst: PathBuf,
        options: TranslateOptions,
    },
    Crop {
        src: PathBuf,
        dst: PathBuf,
        boundary: PathBuf,
    },
}

/// Records every call and writes a placeholder output, failing for sources named in `failing`.
#[derive(Default)]
pub(crate) struct RecordingTool {
    pub calls: Mutex<Vec<RasterCall>>,
    pub failing: Vec<String>,
}

impl RecordingTool {
    pub fn failing_on(names: &[&str]) -> Self {
        RecordingTool {
            calls: Mutex::new(Vec::new()),
            failing: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn calls(&self) -> Vec<RasterCall> {
        self.calls.lock().unwrap().clone()
    }

    fn complete(&self, src: &Path, dst: &Path) -> Result<(), RasterError> {
        let name = src.file_name().unwrap().to_string_lossy().to_string();
        if self.failing.contains(&name) {
            return Err(RasterError::Spawn {
                program: "recording".to_string(),
                source: io::Error::new(io::ErrorKind::Other, format!("cannot open {}", name)),
            });
        }
        std::fs::write(dst, b"II*\0").unwrap();
        Ok(())
    }
}

#[async_trait]
impl RasterTool for RecordingTool {
    async fn translate(
        &self,
        src: &Path,
        dst: &Path,
        options: &TranslateOptions,
    ) -> Result<(), RasterError> {
        self.calls.lock().unwrap().push(RasterCall::Translate {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
            options: options.clone(),
        });
        self.complete(src, dst)
    }

    async fn crop(&self, src: &Path, dst: &Path, boundary: &Path) -> Result<(), RasterError> {
        self.calls.lock().unwrap().push(RasterCall::Crop {
            src: src.to_path_buf(),
            dst: dst.to_path_buf(),
            boundary: boundary.to_path_buf(),
        });
        self.complete(src, dst)
    }
}
