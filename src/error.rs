//! Error taxonomy for the import pipeline.
//!
//! Every fallible import step returns an [`ImportError`]. None of them abort the
//! process: the orchestrator logs the failure and skips the offending file.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    /// The requested input file does not exist.
    #[error("file does not exist: {}", .0.display())]
    InputMissing(PathBuf),

    /// The container could be read but not understood (malformed document,
    /// unsupported topology/geometry, unresolved data reference, empty mapped region).
    #[error("unable to decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    /// No importer is registered for this file.
    #[error("no importer for {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// Texture bytes that cannot be turned into an uploadable image.
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Gltf(#[from] gltf::Error),

    #[error(transparent)]
    Obj(#[from] tobj::LoadError),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl ImportError {
    pub fn decode(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = ImportError> = std::result::Result<T, E>;
