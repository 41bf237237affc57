use std::path::PathBuf;

use crate::exif::ContainerError;

/// Errors surfaced by the library.
///
/// Only [`Error::MissingInputDirectory`] and [`Error::NotADirectory`] are fatal;
/// everything else is per-file and is turned into a bucket placement by
/// [`crate::pipeline`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The byte stream is not a JPEG, or its EXIF container cannot be parsed/encoded.
    #[error("metadata container is unreadable: {0}")]
    ContainerUnreadable(#[from] ContainerError),

    /// The filename matches none of the known naming conventions.
    #[error("unknown file name format: {0}")]
    PatternUnrecognized(String),

    /// No input directory was supplied.
    #[error("no input directory given (use --folder or set DATEFIX_FOLDER)")]
    MissingInputDirectory,

    /// The input path does not exist or is not a directory.
    #[error("input path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
