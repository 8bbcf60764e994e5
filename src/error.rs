//! Error handling for the detviz batch visualiser
//!
//! Every failure in a run is fatal. The variants below name the precondition
//! or I/O step that failed so `main` can report it before exiting.

use crate::config::ConfigError;
use crate::data::DataError;
use crate::inference::InferenceError;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for a visualisation run
#[derive(Error, Debug)]
pub enum DetVizError {
    // Network preconditions
    #[error("Network description {0} declares no image data layer")]
    MissingDataLayer(PathBuf),

    #[error("Unknown feature blob name {blob} in the network {description}")]
    UnknownBlob { blob: String, description: PathBuf },

    #[error("the dim of feature is not equal to 4: blob {blob} has shape {shape:?}")]
    BadBlobShape { blob: String, shape: Vec<usize> },

    // Output directory
    #[error("mkdir {0} failed: directory already exists")]
    OutputDirExists(PathBuf),

    #[error("mkdir {path} failed: {source}")]
    OutputDirectoryError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Per-sample image I/O
    #[error("read image {path} failed: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("write image {path} failed: {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Image path has no file name: {0}")]
    NoFileName(PathBuf),

    // Wrapped subsystem errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Result type alias for convenience
pub type DetVizResult<T> = std::result::Result<T, DetVizError>;
