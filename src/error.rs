use std::path::PathBuf;
use thiserror::Error;

/// Fatal conditions the caller needs to tell apart from generic I/O failures.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No eligible files after filtering. Check the extension filter and exclude patterns.")]
    NoEligibleFiles,

    #[error("Invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Path {} isn't a directory!", .0.display())]
    NotADirectory(PathBuf),
}
