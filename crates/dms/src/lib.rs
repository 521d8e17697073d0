//! Driver Monitoring System (DMS)
//!
//! Turns per-frame facial measurements into debounced driver-state alerts:
//! - Primary face selection and mouth aspect ratio
//! - Eye closure, head nod, yawn and distraction classification
//! - Per-signal temporal debouncing into repeating alert events

pub mod analysis;
pub mod classifier;
pub mod config;
pub mod debounce;
pub mod detector;

pub use analysis::{AlertEvent, AlertKind, DmsAnalysis, SignalSet};
pub use classifier::SignalClassifier;
pub use config::{DebounceThresholds, DmsConfig};
pub use debounce::{DebounceTimer, SignalKind, TemporalDebouncer};
pub use detector::{mouth_aspect_ratio, FaceFrameSample, FaceMetrics, MouthGeometry, Point};

use thiserror::Error;
use tracing::info;

/// DMS error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DmsError {
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Driver monitoring module: classifier plus debouncer for one session
pub struct DmsModule {
    config: DmsConfig,
    classifier: SignalClassifier,
    debouncer: TemporalDebouncer,
    yawning: bool,
}

impl DmsModule {
    /// Create a new DMS module with configuration
    pub fn new(config: DmsConfig) -> Result<Self, DmsError> {
        config.validate()?;
        info!(
            "DMS module created (ear_threshold={}, frame rate {} Hz)",
            config.ear_threshold,
            config.frame_rate_hz()
        );

        Ok(Self {
            classifier: SignalClassifier::new(&config),
            debouncer: TemporalDebouncer::new(&config.thresholds),
            yawning: false,
            config,
        })
    }

    /// Analyze a single frame for driver state
    pub fn analyze(&mut self, sample: &FaceFrameSample) -> DmsAnalysis {
        let signals = self.classifier.classify(sample);
        let alerts = self.debouncer.process(&signals, sample.timestamp_ms);

        let yawn_started = signals.is_yawning && !self.yawning;
        self.yawning = signals.is_yawning;

        DmsAnalysis {
            timestamp_ms: sample.timestamp_ms,
            signals,
            alerts,
            yawn_started,
        }
    }

    /// Replace the configuration. Debounce state is cleared.
    pub fn update_config(&mut self, config: DmsConfig) -> Result<(), DmsError> {
        config.validate()?;
        self.classifier = SignalClassifier::new(&config);
        self.debouncer = TemporalDebouncer::new(&config.thresholds);
        self.yawning = false;
        self.config = config;
        Ok(())
    }

    /// Reset driver state (session stop or driver change)
    pub fn reset_state(&mut self) {
        self.debouncer.reset();
        self.yawning = false;
    }

    pub fn config(&self) -> &DmsConfig {
        &self.config
    }

    pub fn debouncer(&self) -> &TemporalDebouncer {
        &self.debouncer
    }
}
