use drowsiness_monitor::alert::TelemetryRoute;
use drowsiness_monitor::config::{DetectionConfig, PayloadFormat};
use drowsiness_monitor::source::Frame;
use drowsiness_monitor::vision::{EyeLandmarkSet, Keypoint};

pub const TOPIC: &str = "driver/drowsiness";

pub fn detection() -> DetectionConfig {
    DetectionConfig {
        ear_threshold: 0.25,
        consec_frames: 20,
    }
}

pub fn route() -> TelemetryRoute {
    TelemetryRoute {
        topic: TOPIC.to_string(),
        client_id: "DrowsinessDetectorClient".to_string(),
        format: PayloadFormat::Json,
        publish_cleared: true,
    }
}

/// Eye of width 4 whose ratio is exactly `ear`.
pub fn eye_with_ear(ear: f64) -> [Keypoint; 6] {
    // (2h + 2h) / (2 * 4) = h / 2
    let h = ear * 2.0;
    [
        Keypoint::new(0.0, 0.0),
        Keypoint::new(1.0, h),
        Keypoint::new(3.0, h),
        Keypoint::new(4.0, 0.0),
        Keypoint::new(3.0, -h),
        Keypoint::new(1.0, -h),
    ]
}

pub fn eyes_with_ear(ear: f64) -> EyeLandmarkSet {
    EyeLandmarkSet::new(eye_with_ear(ear), eye_with_ear(ear))
}

pub fn face_frame(ear: f64) -> Frame {
    Frame::face(eyes_with_ear(ear))
}

/// Full 68-point landmark line for the JSON-lines source.
pub fn landmark_line(ear: Option<f64>) -> String {
    let Some(ear) = ear else {
        return r#"{"landmarks": null}"#.to_string();
    };
    let eye = eye_with_ear(ear);
    let points: Vec<[f64; 2]> = (0..68)
        .map(|i| match i {
            36..=41 => [eye[i - 36].x + 10.0, eye[i - 36].y],
            42..=47 => [eye[i - 42].x + 20.0, eye[i - 42].y],
            _ => [i as f64, 0.0],
        })
        .collect();
    serde_json::json!({ "landmarks": points }).to_string()
}
