//! EAR (Eye Aspect Ratio) 计算模块
//!
//! 标准 6 点公式: EAR = (|p2-p6| + |p3-p5|) / (2 * |p1-p4|)
//! - p1, p4: 眼角点（水平方向）
//! - p2, p3: 上眼睑点
//! - p5, p6: 下眼睑点
//!
//! Degenerate geometry saturates to `0.0`: an eye whose width is below
//! `MIN_EYE_WIDTH`, or which contains a non-finite coordinate, reports a ratio
//! of zero. The result is never NaN or infinite.

use crate::constants::MIN_EYE_WIDTH;
use crate::vision::landmarks::{EyeLandmarkSet, Keypoint};

/// Openness ratio of a single eye.
pub fn eye_ratio(eye: &[Keypoint; 6]) -> f64 {
    let [p1, p2, p3, p4, p5, p6] = eye;

    if !eye.iter().all(Keypoint::is_finite) {
        return 0.0;
    }

    let horizontal = p1.distance(p4);
    if horizontal < MIN_EYE_WIDTH {
        return 0.0;
    }

    let vertical1 = p2.distance(p6);
    let vertical2 = p3.distance(p5);
    let ear = (vertical1 + vertical2) / (2.0 * horizontal);

    // 坐标极大时距离可能溢出为 inf
    if ear.is_finite() {
        ear
    } else {
        0.0
    }
}

/// Average of the left and right eye ratios.
pub fn eye_aspect_ratio(eyes: &EyeLandmarkSet) -> f64 {
    (eye_ratio(&eyes.left) + eye_ratio(&eyes.right)) / 2.0
}
