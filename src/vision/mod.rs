//! Facial landmark geometry.
//!
//! - `landmarks`: keypoints and the fixed eye index mapping
//! - `ear`: Eye Aspect Ratio computation

pub mod ear;
pub mod landmarks;

pub use ear::{eye_aspect_ratio, eye_ratio};
pub use landmarks::{EyeLandmarkSet, Keypoint, LandmarkError};
