use std::fs::{File, FileType};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::shared::constants::LOG_TARGET;
use crate::source::domain::source_error::SourceError;

/// An open, regular file read front to back, plus a count of the frames
/// read from it so far.
///
/// Reads go straight to the file without buffering: each row read must see
/// exactly what the OS returns so a short read can be taken as the end of
/// the stream.
#[derive(Debug)]
pub struct FileByteSource {
    file: File,
    path: PathBuf,
    frames_read: u64,
}

impl FileByteSource {
    /// Opens `path` and checks that it is something we can read frames from.
    ///
    /// On a validation failure the file is dropped, and thereby closed,
    /// before the error is returned.
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        if path.as_os_str().is_empty() {
            return Err(SourceError::NoFilenameSpecified);
        }

        log::info!(target: LOG_TARGET, "Opening raw video file {}", path.display());

        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => SourceError::NotFound {
                path: path.to_path_buf(),
            },
            _ => SourceError::OpenReadFailed {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let metadata = file.metadata().map_err(|e| SourceError::StatFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        check_file_type(path, metadata.file_type())?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            frames_read: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Records one more complete frame and returns its index.
    pub fn advance_frame(&mut self) -> u64 {
        let index = self.frames_read;
        self.frames_read += 1;
        index
    }

    pub fn close(self) {
        log::debug!(
            target: LOG_TARGET,
            "Closing {} after {} frames",
            self.path.display(),
            self.frames_read
        );
    }
}

impl Read for FileByteSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

fn check_file_type(path: &Path, file_type: FileType) -> Result<(), SourceError> {
    if file_type.is_dir() {
        return Err(SourceError::IsDirectory {
            path: path.to_path_buf(),
        });
    }
    if is_socket(&file_type) {
        return Err(SourceError::IsSocket {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(unix)]
fn is_socket(file_type: &FileType) -> bool {
    use std::os::unix::fs::FileTypeExt;
    file_type.is_socket()
}

#[cfg(not(unix))]
fn is_socket(_file_type: &FileType) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_open_regular_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("frames.nv12");
        fs::write(&path, [1u8, 2, 3, 4]).unwrap();

        let mut source = FileByteSource::open(&path).unwrap();
        assert_eq!(source.path(), path);
        assert_eq!(source.frames_read(), 0);

        let mut buf = [0u8; 4];
        assert_eq!(source.read(&mut buf).unwrap(), 4);
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(source.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_empty_path_is_no_filename() {
        assert!(matches!(
            FileByteSource::open(Path::new("")),
            Err(SourceError::NoFilenameSpecified)
        ));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("missing.nv12");
        match FileByteSource::open(&path) {
            Err(SourceError::NotFound { path: reported }) => assert_eq!(reported, path),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_directory_is_rejected() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            FileByteSource::open(tmp.path()),
            Err(SourceError::IsDirectory { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_socket_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sock");
        let _listener = std::os::unix::net::UnixListener::bind(&path).unwrap();
        // Linux refuses to open() a socket outright; other systems get as
        // far as the file type check.
        assert!(matches!(
            FileByteSource::open(&path),
            Err(SourceError::IsSocket { .. } | SourceError::OpenReadFailed { .. })
        ));
    }

    #[test]
    fn test_advance_frame_counts_up() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("frames.nv12");
        fs::write(&path, b"").unwrap();

        let mut source = FileByteSource::open(&path).unwrap();
        assert_eq!(source.advance_frame(), 0);
        assert_eq!(source.advance_frame(), 1);
        assert_eq!(source.frames_read(), 2);
        source.close();
    }

    #[test]
    fn test_error_messages_name_the_path() {
        let err = SourceError::IsDirectory {
            path: PathBuf::from("/tmp/frames"),
        };
        assert_eq!(err.to_string(), "\"/tmp/frames\" is a directory.");
    }
}
