//! Frame-level signal classification

use crate::analysis::SignalSet;
use crate::detector::FaceFrameSample;
use crate::DmsConfig;

/// Stateless mapping from facial metrics to boolean signals
#[derive(Debug, Clone)]
pub struct SignalClassifier {
    ear_threshold: f32,
    head_nod_angle_deg: f32,
    distraction_angle_deg: f32,
    mar_threshold: f32,
}

impl SignalClassifier {
    pub fn new(config: &DmsConfig) -> Self {
        Self {
            ear_threshold: config.ear_threshold,
            head_nod_angle_deg: config.head_nod_angle_deg,
            distraction_angle_deg: config.distraction_angle_deg,
            mar_threshold: config.mar_threshold,
        }
    }

    /// Classify one frame
    pub fn classify(&self, sample: &FaceFrameSample) -> SignalSet {
        if !sample.face_visible {
            return SignalSet::face_absent();
        }

        let sample = sample.sanitized();
        let pitch = sample.head_pitch_deg.abs();
        let yaw = sample.head_yaw_deg.abs();

        SignalSet {
            eyes_closed: sample.left_eye_open_prob < self.ear_threshold
                && sample.right_eye_open_prob < self.ear_threshold,
            head_nodding: pitch > self.head_nod_angle_deg,
            is_yawning: sample.mouth_aspect_ratio > self.mar_threshold,
            is_distracted: yaw > self.distraction_angle_deg || pitch > self.distraction_angle_deg,
            face_visible: true,
        }
    }
}

impl Default for SignalClassifier {
    fn default() -> Self {
        Self::new(&DmsConfig::default())
    }
}
