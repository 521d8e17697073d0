//! Per-frame facial measurements handed over by the face-landmark collaborator

use serde::{Deserialize, Serialize};

/// 2D image point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Mouth contours and corner landmarks of one face
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MouthGeometry {
    /// Bottom edge of the upper lip, left to right
    pub upper_lip_bottom: Vec<Point>,
    /// Top edge of the lower lip, left to right
    pub lower_lip_top: Vec<Point>,
    pub mouth_left: Option<Point>,
    pub mouth_right: Option<Point>,
}

/// Mouth aspect ratio: lip gap at the contour centre over mouth width.
///
/// Missing or degenerate geometry yields 0 (not yawning).
pub fn mouth_aspect_ratio(mouth: &MouthGeometry) -> f32 {
    let (Some(left), Some(right)) = (mouth.mouth_left, mouth.mouth_right) else {
        return 0.0;
    };

    let centre = mouth.upper_lip_bottom.len() / 2;
    let (Some(upper), Some(lower)) = (
        mouth.upper_lip_bottom.get(centre),
        mouth.lower_lip_top.get(centre),
    ) else {
        return 0.0;
    };

    let width = left.distance(&right);
    if width <= 0.0 || !width.is_finite() {
        return 0.0;
    }

    let ratio = upper.distance(lower) / width;
    if ratio.is_finite() {
        ratio
    } else {
        0.0
    }
}

/// Raw measurements of one detected face
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceMetrics {
    /// Left eye open probability, if the classifier produced one
    pub left_eye_open_prob: Option<f32>,
    /// Right eye open probability, if the classifier produced one
    pub right_eye_open_prob: Option<f32>,
    /// Up/down rotation (degrees)
    pub head_pitch_deg: f32,
    /// Left/right rotation (degrees)
    pub head_yaw_deg: f32,
    /// Mouth geometry, when contours were detected
    pub mouth: Option<MouthGeometry>,
}

/// One analysed camera frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceFrameSample {
    /// Capture time (milliseconds, monotonic within a session)
    pub timestamp_ms: u64,
    pub left_eye_open_prob: f32,
    pub right_eye_open_prob: f32,
    pub head_pitch_deg: f32,
    pub head_yaw_deg: f32,
    #[serde(default)]
    pub mouth_aspect_ratio: f32,
    pub face_visible: bool,
}

impl FaceFrameSample {
    /// Frame in which no face was found
    pub fn face_absent(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            left_eye_open_prob: 1.0,
            right_eye_open_prob: 1.0,
            head_pitch_deg: 0.0,
            head_yaw_deg: 0.0,
            mouth_aspect_ratio: 0.0,
            face_visible: false,
        }
    }

    /// Build a sample from all faces detected in a frame.
    ///
    /// Only the primary face (first in detection order) is evaluated.
    pub fn from_detections(timestamp_ms: u64, faces: &[FaceMetrics]) -> Self {
        let Some(face) = faces.first() else {
            return Self::face_absent(timestamp_ms);
        };

        Self {
            timestamp_ms,
            left_eye_open_prob: face.left_eye_open_prob.unwrap_or(1.0),
            right_eye_open_prob: face.right_eye_open_prob.unwrap_or(1.0),
            head_pitch_deg: face.head_pitch_deg,
            head_yaw_deg: face.head_yaw_deg,
            mouth_aspect_ratio: face.mouth.as_ref().map_or(0.0, mouth_aspect_ratio),
            face_visible: true,
        }
    }

    /// Copy with non-finite or out-of-range values replaced by safe defaults
    pub fn sanitized(&self) -> Self {
        fn probability(p: f32) -> f32 {
            if p.is_nan() {
                1.0
            } else {
                p.clamp(0.0, 1.0)
            }
        }

        fn finite_or_zero(v: f32) -> f32 {
            if v.is_finite() {
                v
            } else {
                0.0
            }
        }

        let mar = if self.mouth_aspect_ratio.is_finite() && self.mouth_aspect_ratio > 0.0 {
            self.mouth_aspect_ratio
        } else {
            0.0
        };

        Self {
            left_eye_open_prob: probability(self.left_eye_open_prob),
            right_eye_open_prob: probability(self.right_eye_open_prob),
            head_pitch_deg: finite_or_zero(self.head_pitch_deg),
            head_yaw_deg: finite_or_zero(self.head_yaw_deg),
            mouth_aspect_ratio: mar,
            ..*self
        }
    }
}
