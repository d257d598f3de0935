//! Error types for the repose pipeline.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("missing resource: {}", path.display())]
    MissingResource { path: PathBuf },

    #[error("no heatmaps accumulated: aggregate requested over an empty input set")]
    EmptyInput,

    #[error("sample {index} ({filename}) is missing required field `{field}`")]
    MissingField {
        index: usize,
        filename: String,
        field: &'static str,
    },

    #[error("malformed pair list at line {line}: {message}")]
    PairList { line: usize, message: String },

    #[error("keypoint file error: {0}")]
    KeypointFile(String),

    #[error("image error: {0}")]
    Image(String),

    #[error("tensor error: {0}")]
    Tensor(String),

    #[error("I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::KeypointFile(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<candle_core::Error> for Error {
    fn from(e: candle_core::Error) -> Self {
        Error::Tensor(e.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e.to_string())
    }
}
