use std::path::PathBuf;

use thiserror::Error;

/// Reasons a byte source could not be opened.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("No file name specified for reading.")]
    NoFilenameSpecified,
    #[error("No such file \"{}\"", path.display())]
    NotFound { path: PathBuf },
    #[error("Could not open file \"{}\" for reading: {source}", path.display())]
    OpenReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not get info on \"{}\": {source}", path.display())]
    StatFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("\"{}\" is a directory.", path.display())]
    IsDirectory { path: PathBuf },
    #[error("File \"{}\" is a socket.", path.display())]
    IsSocket { path: PathBuf },
    #[error("a file is already open")]
    AlreadyOpen,
}

/// Rejected property changes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("changing the location while a file is open is not supported")]
    WrongState,
}
