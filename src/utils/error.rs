use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Image processing error: {0}")]
    ImageProcessingError(String),
    #[error("Recognition error: {0}")]
    RecognitionError(String),
    #[error("Recognition timed out after {0:?}")]
    RecognitionTimeout(Duration),
    #[error("Recognition engine is closed")]
    EngineClosed,
    #[error("Processing was cancelled")]
    Cancelled,
    #[error("Pipeline error: {0}")]
    PipelineError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        ScanError::IoError(err.to_string())
    }
}

impl From<image::ImageError> for ScanError {
    fn from(err: image::ImageError) -> Self {
        ScanError::ImageProcessingError(err.to_string())
    }
}
