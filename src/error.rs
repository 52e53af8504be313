use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures reading or writing a sidecar document.
#[derive(Debug, Error)]
pub enum SidecarError {
    #[error("failed to access sidecar {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed sidecar {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode sidecar {}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SidecarError {
    pub fn path(&self) -> &PathBuf {
        match self {
            SidecarError::Io { path, .. }
            | SidecarError::Parse { path, .. }
            | SidecarError::Encode { path, .. } => path,
        }
    }
}

#[derive(Debug, Error)]
pub enum UsageError {
    #[error("identifier must not be empty")]
    EmptyIdentifier,

    #[error("could not build usage pattern for `{identifier}`")]
    Pattern {
        identifier: String,
        #[source]
        source: regex::Error,
    },
}
