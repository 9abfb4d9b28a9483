use std::path::PathBuf;

use thiserror::Error;

use crate::classfile;
use crate::name::ClassName;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Hard failures of a dependency check.
///
/// A missing class is not an error; it is reported through
/// [`Outcome::Missing`](crate::closure::Outcome::Missing).
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("archive unavailable: {}", path.display())]
    ArchiveUnavailable {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    #[error("failed to read {entry} from {archive}")]
    ArchiveRead {
        archive: String,
        entry: String,
        #[source]
        source: BoxError,
    },
    #[error("{class} in {archive} is not a valid class file")]
    ClassDecode {
        class: ClassName,
        archive: String,
        #[source]
        source: classfile::Error,
    },
}

impl CheckError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        CheckError::ArchiveUnavailable {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn is_archive_unavailable(&self) -> bool {
        matches!(self, CheckError::ArchiveUnavailable { .. })
    }
}
