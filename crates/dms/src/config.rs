//! DMS configuration

use serde::{Deserialize, Serialize};

use crate::DmsError;

/// Debounce thresholds per signal kind (milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceThresholds {
    pub eyes_closed_ms: u64,
    pub yawn_ms: u64,
    pub distraction_ms: u64,
    pub head_nod_ms: u64,
    pub face_not_visible_ms: u64,
}

impl Default for DebounceThresholds {
    fn default() -> Self {
        Self {
            eyes_closed_ms: 2000,
            yawn_ms: 1500,
            distraction_ms: 2000,
            head_nod_ms: 2000,
            face_not_visible_ms: 5000,
        }
    }
}

/// DMS configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DmsConfig {
    /// Eye-open probability below which an eye counts as closed
    pub ear_threshold: f32,

    /// Absolute head pitch above which the head counts as nodding (degrees)
    pub head_nod_angle_deg: f32,

    /// Absolute head yaw or pitch above which the driver counts as distracted (degrees)
    pub distraction_angle_deg: f32,

    /// Mouth aspect ratio above which the driver counts as yawning
    pub mar_threshold: f32,

    /// Continuous-signal durations required before an alert fires
    pub thresholds: DebounceThresholds,

    /// Halve the analysed frame rate to save power
    pub low_power_mode: bool,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            ear_threshold: 0.25,
            head_nod_angle_deg: 20.0,
            distraction_angle_deg: 30.0,
            mar_threshold: 0.5,
            thresholds: DebounceThresholds::default(),
            low_power_mode: false,
        }
    }
}

impl DmsConfig {
    /// Create strict config (earlier eye-closure detection, shorter debounce)
    pub fn strict() -> Self {
        Self {
            ear_threshold: 0.3,
            thresholds: DebounceThresholds {
                eyes_closed_ms: 1500,
                distraction_ms: 1500,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Create lenient config (later eye-closure detection, longer debounce)
    pub fn lenient() -> Self {
        Self {
            ear_threshold: 0.2,
            thresholds: DebounceThresholds {
                eyes_closed_ms: 2500,
                distraction_ms: 3000,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Frame rate the camera collaborator should analyse at
    pub fn frame_rate_hz(&self) -> u32 {
        if self.low_power_mode {
            15
        } else {
            30
        }
    }

    /// Reject values the classifier cannot work with
    pub fn validate(&self) -> Result<(), DmsError> {
        if !(0.0..=1.0).contains(&self.ear_threshold) {
            return Err(DmsError::Config(format!(
                "ear_threshold {} outside [0, 1]",
                self.ear_threshold
            )));
        }

        for (name, value) in [
            ("head_nod_angle_deg", self.head_nod_angle_deg),
            ("distraction_angle_deg", self.distraction_angle_deg),
            ("mar_threshold", self.mar_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(DmsError::Config(format!("{} must be a non-negative number", name)));
            }
        }

        let t = &self.thresholds;
        if [t.eyes_closed_ms, t.yawn_ms, t.distraction_ms, t.head_nod_ms, t.face_not_visible_ms]
            .contains(&0)
        {
            return Err(DmsError::Config("debounce thresholds must be non-zero".into()));
        }

        Ok(())
    }
}
