//! DMS analysis results and alert events

use serde::{Deserialize, Serialize};

/// Alert kinds raised by the monitoring core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertKind {
    /// Eyes closed or sustained yawning
    Drowsiness,

    /// Driver not looking at the road
    Distraction,

    /// Head dropped for a sustained period (possible loss of consciousness)
    Faint,

    /// Emergency: driver not visible, accident, or explicit request
    Sos,
}

impl AlertKind {
    /// Rank used to pick the most severe of several alerts
    pub fn severity_rank(self) -> u8 {
        match self {
            AlertKind::Distraction => 0,
            AlertKind::Drowsiness => 1,
            AlertKind::Faint => 2,
            AlertKind::Sos => 3,
        }
    }
}

/// A discrete alert condition, emitted once per debounce firing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub timestamp_ms: u64,
    pub message: String,
}

impl AlertEvent {
    pub fn new(kind: AlertKind, timestamp_ms: u64, message: impl Into<String>) -> Self {
        Self {
            kind,
            timestamp_ms,
            message: message.into(),
        }
    }
}

/// Boolean signals derived from one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSet {
    pub eyes_closed: bool,
    pub head_nodding: bool,
    pub is_yawning: bool,
    pub is_distracted: bool,
    pub face_visible: bool,
}

impl SignalSet {
    /// Signals for a frame without a visible face: everything else forced false
    pub fn face_absent() -> Self {
        Self::default()
    }
}

/// Complete DMS analysis of one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DmsAnalysis {
    /// Frame timestamp (ms)
    pub timestamp_ms: u64,

    /// Signals classified from the frame
    pub signals: SignalSet,

    /// Alerts fired by the debouncer on this frame
    pub alerts: Vec<AlertEvent>,

    /// A new yawn episode began on this frame
    pub yawn_started: bool,
}

impl DmsAnalysis {
    /// Check if any alerts fired
    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty()
    }

    /// Get highest severity alert
    pub fn highest_severity_alert(&self) -> Option<&AlertEvent> {
        self.alerts.iter().max_by_key(|a| a.kind.severity_rank())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highest_severity_alert() {
        let analysis = DmsAnalysis {
            alerts: vec![
                AlertEvent::new(AlertKind::Distraction, 10, "Keep eyes on the road!"),
                AlertEvent::new(AlertKind::Faint, 10, "Possible Faint Detected"),
                AlertEvent::new(AlertKind::Drowsiness, 10, "Drowsiness Detected!"),
            ],
            ..Default::default()
        };

        assert!(analysis.has_alerts());
        assert_eq!(analysis.highest_severity_alert().map(|a| a.kind), Some(AlertKind::Faint));
    }

    #[test]
    fn test_no_alerts() {
        let analysis = DmsAnalysis::default();
        assert!(!analysis.has_alerts());
        assert!(analysis.highest_severity_alert().is_none());
    }
}
