//! Landmark sources: where per-frame eye keypoints come from.

pub mod replay;

use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::vision::EyeLandmarkSet;

pub use replay::JsonLinesSource;

/// Detector outcome for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Detection {
    Face(EyeLandmarkSet),
    NoFace,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub timestamp: DateTime<Utc>,
    pub detection: Detection,
}

impl Frame {
    pub fn face(eyes: EyeLandmarkSet) -> Self {
        Self {
            timestamp: Utc::now(),
            detection: Detection::Face(eyes),
        }
    }

    pub fn no_face() -> Self {
        Self {
            timestamp: Utc::now(),
            detection: Detection::NoFace,
        }
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open landmark source '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("landmark stream read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One call per frame. `Ok(None)` marks the end of the stream.
///
/// The returned future must be cancel safe: the monitor drops it when the
/// frame timeout elapses.
pub trait LandmarkSource: Send {
    fn next_frame(&mut self) -> impl Future<Output = Result<Option<Frame>, SourceError>> + Send;
}
