//! Accelerometer shake (possible accident) detection

use serde::{Deserialize, Serialize};

/// Magnitude jump that counts as a shake (m/s²)
pub const SHAKE_THRESHOLD: f32 = 15.0;

/// Minimum gap between two shakes (ms)
pub const SHAKE_INTERVAL_MS: u64 = 1000;

/// One accelerometer reading (m/s²)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccelSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub timestamp_ms: u64,
}

impl AccelSample {
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Detects sudden changes in acceleration magnitude between consecutive samples
#[derive(Debug, Clone)]
pub struct ShakeDetector {
    threshold: f32,
    interval_ms: u64,
    last_magnitude: f32,
    last_shake_ms: Option<u64>,
}

impl ShakeDetector {
    pub fn new() -> Self {
        Self {
            threshold: SHAKE_THRESHOLD,
            interval_ms: SHAKE_INTERVAL_MS,
            last_magnitude: 0.0,
            last_shake_ms: None,
        }
    }

    /// Feed a sample; true when it is a new shake
    pub fn update(&mut self, sample: &AccelSample) -> bool {
        let magnitude = sample.magnitude();
        if !magnitude.is_finite() {
            return false;
        }

        let delta = (magnitude - self.last_magnitude).abs();
        self.last_magnitude = magnitude;
        if delta <= self.threshold {
            return false;
        }

        match self.last_shake_ms {
            Some(last) if sample.timestamp_ms.saturating_sub(last) <= self.interval_ms => false,
            _ => {
                self.last_shake_ms = Some(sample.timestamp_ms);
                true
            }
        }
    }
}

impl Default for ShakeDetector {
    fn default() -> Self {
        Self::new()
    }
}
