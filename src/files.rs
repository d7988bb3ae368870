use std::path::PathBuf;

use itertools::Itertools;
use miette::{Diagnostic, SourceSpan};
use thiserror::Error;
use tracing::{debug, warn};

/// Expand comma-separated glob patterns into the files they match.
///
/// Matches keep the order of the patterns, then the (sorted) order of matches within each
/// pattern. A pattern matching nothing contributes nothing, and a file matched by more than one
/// pattern is only listed the first time.
///
/// ## Errors
/// 1. Any pattern is not a valid glob
pub(crate) fn expand(patterns: &str) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    for pattern in patterns
        .split(',')
        .map(str::trim)
        .filter(|pattern| !pattern.is_empty())
    {
        let paths = glob::glob(pattern).map_err(|err| Error::new(pattern, &err))?;
        let mut matched = 0;
        for entry in paths {
            match entry {
                Ok(path) if path.is_dir() => debug!("Skipping directory {}", path.display()),
                Ok(path) => {
                    matched += 1;
                    files.push(path);
                }
                Err(err) => warn!("Unable to read {}: {}", err.path().display(), err.error()),
            }
        }
        if matched == 0 {
            debug!("{pattern} did not match any files");
        }
    }
    Ok(files.into_iter().unique().collect())
}

#[derive(Debug, Diagnostic, Error)]
#[error("Unable to glob {pattern}: {message}")]
#[diagnostic(
    code(files::invalid_pattern),
    help("Fix this pattern in PLUGIN_FILES, patterns are separated by commas.")
)]
pub(crate) struct Error {
    #[source_code]
    pattern: String,
    message: &'static str,
    #[label("{message}")]
    span: SourceSpan,
}

impl Error {
    fn new(pattern: &str, err: &glob::PatternError) -> Self {
        let length = usize::from(err.pos < pattern.len());
        Self {
            pattern: pattern.to_string(),
            message: err.msg,
            span: (err.pos, length).into(),
        }
    }
}
