// THEORY:
// Every failure inside the verification engine is described by one `VisionError`.
// The public verification entry points never hand these to the caller: they are
// folded into neutral states (`Verdict::Unverified`, `FaceMatch::Unknown`,
// `Extraction::NoText`) at the point of use. The error type exists so the
// individual stages stay honest about *why* they could not produce a result, and
// so that reason can be logged.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("image payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("image could not be decoded: {0}")]
    Image(#[from] image::ImageError),

    #[error("image has no pixels")]
    EmptyImage,

    #[error("hash must carry between 1 and 64 bits, got {0}")]
    InvalidHashLength(usize),

    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("text recognition failed: {0}")]
    Recognition(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("operation timed out after {0:?}")]
    TimedOut(Duration),
}

pub type VisionResult<T> = Result<T, VisionError>;
