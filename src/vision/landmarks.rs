//! 面部关键点与眼部索引映射
//!
//! 关键点采用 iBUG 68 点布局。每只眼睛 6 个点，顺序为：
//! p1 外/内眼角 → p2, p3 上眼睑 → p4 另一侧眼角 → p5, p6 下眼睑。
//! 索引在编译期固定，不按帧重新计算。

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{FACE_LANDMARK_COUNT, LEFT_EYE_INDICES, RIGHT_EYE_INDICES};

/// A 2-D landmark coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
}

impl Keypoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Keypoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Keypoint {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LandmarkError {
    #[error("expected {expected} face landmarks, got {actual}")]
    WrongCount { expected: usize, actual: usize },
}

/// The twelve eye keypoints of one face, six per eye in p1..p6 order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeLandmarkSet {
    pub left: [Keypoint; 6],
    pub right: [Keypoint; 6],
}

impl EyeLandmarkSet {
    pub const fn new(left: [Keypoint; 6], right: [Keypoint; 6]) -> Self {
        Self { left, right }
    }

    /// Extract both eyes from a full 68-point face.
    pub fn from_face(points: &[Keypoint]) -> Result<Self, LandmarkError> {
        if points.len() != FACE_LANDMARK_COUNT {
            return Err(LandmarkError::WrongCount {
                expected: FACE_LANDMARK_COUNT,
                actual: points.len(),
            });
        }

        Ok(Self {
            left: LEFT_EYE_INDICES.map(|i| points[i]),
            right: RIGHT_EYE_INDICES.map(|i| points[i]),
        })
    }

    /// Apply the same transform to every keypoint.
    pub fn map(&self, f: impl Fn(Keypoint) -> Keypoint) -> Self {
        Self {
            left: self.left.map(&f),
            right: self.right.map(&f),
        }
    }
}
