//! Monitoring Session
//!
//! One task owns the driver-monitoring pipeline, the alert controller, the
//! fatigue-risk scorer and the trip counters. Frames, risk ticks, timer
//! expiries, I/O completions and driver actions all reach that task as
//! messages through a [`MonitorHandle`], so the alert state has one writer.

pub mod clock;
mod monitor;
pub mod shake;

use std::sync::Arc;

use alerting::{AlertConfig, AlertOutput, EmergencyContact, LocationProvider, SosSender};
use dms::{DmsConfig, DmsError};
use fatigue_risk::{RiskConfig, RiskError};
use serde::{Deserialize, Serialize};
use storage::TripStore;
use thiserror::Error;

pub use clock::{Clock, SystemClock};
pub use monitor::{Monitor, MonitorHandle, MonitorSnapshot};
pub use shake::{AccelSample, ShakeDetector};

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Monitor task has stopped")]
    Closed,

    #[error("Frame queue full")]
    Full,

    #[error(transparent)]
    Dms(#[from] DmsError),

    #[error(transparent)]
    Risk(#[from] RiskError),
}

/// Everything the session needs to know up front
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub dms: DmsConfig,
    pub alerts: AlertConfig,
    pub risk: RiskConfig,
    pub contacts: Vec<EmergencyContact>,
    /// Pending command capacity; frames beyond it are rejected by `try_push_frame`
    pub queue_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            dms: DmsConfig::default(),
            alerts: AlertConfig::default(),
            risk: RiskConfig::default(),
            contacts: Vec::new(),
            queue_capacity: 64,
        }
    }
}

/// External collaborators driven by the session
#[derive(Clone)]
pub struct Collaborators {
    pub output: Arc<dyn AlertOutput>,
    pub sos: Arc<dyn SosSender>,
    pub location: Arc<dyn LocationProvider>,
    pub store: Arc<dyn TripStore>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// Collaborators using the system clock
    pub fn new(
        output: Arc<dyn AlertOutput>,
        sos: Arc<dyn SosSender>,
        location: Arc<dyn LocationProvider>,
        store: Arc<dyn TripStore>,
    ) -> Self {
        Self {
            output,
            sos,
            location,
            store,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}
