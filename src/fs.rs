//! Thin wrappers around file access that attach the path to any error.

use std::{
    io,
    path::{Path, PathBuf},
};

use miette::Diagnostic;
use thiserror::Error;
use tokio::fs::File;
use tracing::trace;

pub(crate) fn read_to_string<P: AsRef<Path> + Into<PathBuf>>(path: P) -> Result<String, Error> {
    trace!("Reading {}", path.as_ref().display());
    std::fs::read_to_string(path.as_ref()).map_err(|source| Error::Read {
        path: path.into(),
        source,
    })
}

/// Open `path` for streaming its contents somewhere else.
pub(crate) async fn open(path: &Path) -> Result<File, Error> {
    trace!("Opening {}", path.display());
    File::open(path).await.map_err(|source| Error::Open {
        path: path.into(),
        source,
    })
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum Error {
    #[error("Error reading from {path}: {source}")]
    #[diagnostic(
        code(fs::read),
        help("Make sure you have permission to read this file.")
    )]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Unable to open file {path}: {source}")]
    #[diagnostic(
        code(fs::open),
        help("Make sure the file still exists and you have permission to read it.")
    )]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
