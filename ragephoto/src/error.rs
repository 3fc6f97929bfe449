use std::sync::Arc;

use ragephoto_types::ErrorKind;

/// An error from loading or saving a photo on disk.
#[derive(Clone, Debug)]
pub enum FileError {
    /// The file couldn't be read or written.
    Io(
        // note: `Arc` allows us to impl `Clone`
        Arc<std::io::Error>,
    ),

    /// The file was accessed fine, but its contents weren't.
    Photo(ErrorKind),
}

impl FileError {
    /// The status this error leaves in [`Photo::error`](crate::Photo::error).
    ///
    /// I/O failures are reported as [`ErrorKind::Uninitialised`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            FileError::Io(_) => ErrorKind::Uninitialised,
            FileError::Photo(kind) => *kind,
        }
    }
}

impl core::fmt::Display for FileError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FileError::Io(e) => write!(f, "Couldn't access the photo file. err: {e}"),
            FileError::Photo(e) => write!(f, "The photo file is invalid. err: {e}"),
        }
    }
}

impl core::error::Error for FileError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            FileError::Io(e) => Some(e.as_ref()),
            FileError::Photo(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for FileError {
    fn from(value: std::io::Error) -> Self {
        FileError::Io(value.into())
    }
}

impl From<ErrorKind> for FileError {
    fn from(value: ErrorKind) -> Self {
        FileError::Photo(value)
    }
}
