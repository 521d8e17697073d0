//! Temporal debouncing of frame signals into alert events

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::{AlertEvent, AlertKind, SignalSet};
use crate::config::DebounceThresholds;

/// Signal kinds tracked by the debouncer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    EyesClosed,
    Yawn,
    Distraction,
    HeadNod,
    FaceNotVisible,
}

impl SignalKind {
    pub const ALL: [SignalKind; 5] = [
        SignalKind::EyesClosed,
        SignalKind::Yawn,
        SignalKind::Distraction,
        SignalKind::HeadNod,
        SignalKind::FaceNotVisible,
    ];

    /// Alert kind emitted when this signal fires
    pub fn alert_kind(self) -> AlertKind {
        match self {
            SignalKind::EyesClosed | SignalKind::Yawn => AlertKind::Drowsiness,
            SignalKind::Distraction => AlertKind::Distraction,
            SignalKind::HeadNod => AlertKind::Faint,
            SignalKind::FaceNotVisible => AlertKind::Sos,
        }
    }

    /// Source message attached to the emitted event
    pub fn message(self) -> &'static str {
        match self {
            SignalKind::EyesClosed => "Drowsiness Detected!",
            SignalKind::Yawn => "Yawning Detected - Take a break!",
            SignalKind::Distraction => "Keep eyes on the road!",
            SignalKind::HeadNod => "Possible Faint Detected",
            SignalKind::FaceNotVisible => "Driver not visible - Emergency?",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    fn threshold_ms(self, thresholds: &DebounceThresholds) -> u64 {
        match self {
            SignalKind::EyesClosed => thresholds.eyes_closed_ms,
            SignalKind::Yawn => thresholds.yawn_ms,
            SignalKind::Distraction => thresholds.distraction_ms,
            SignalKind::HeadNod => thresholds.head_nod_ms,
            SignalKind::FaceNotVisible => thresholds.face_not_visible_ms,
        }
    }
}

/// Onset tracker for one signal kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceTimer {
    onset_ms: Option<u64>,
    threshold_ms: u64,
}

impl DebounceTimer {
    pub fn new(threshold_ms: u64) -> Self {
        Self {
            onset_ms: None,
            threshold_ms,
        }
    }

    /// Feed the current signal value. Returns true when the timer fires.
    ///
    /// Firing re-arms the onset at `now_ms`, so a held signal fires again
    /// every `threshold_ms`.
    pub fn update(&mut self, active: bool, now_ms: u64) -> bool {
        if !active {
            self.onset_ms = None;
            return false;
        }

        match self.onset_ms {
            None => {
                self.onset_ms = Some(now_ms);
                false
            }
            Some(onset) if now_ms.saturating_sub(onset) >= self.threshold_ms => {
                self.onset_ms = Some(now_ms);
                true
            }
            Some(_) => false,
        }
    }

    pub fn clear(&mut self) {
        self.onset_ms = None;
    }

    pub fn onset_ms(&self) -> Option<u64> {
        self.onset_ms
    }

    pub fn threshold_ms(&self) -> u64 {
        self.threshold_ms
    }
}

/// One independent debounce timer per signal kind
#[derive(Debug, Clone)]
pub struct TemporalDebouncer {
    timers: [DebounceTimer; 5],
}

impl TemporalDebouncer {
    pub fn new(thresholds: &DebounceThresholds) -> Self {
        Self {
            timers: SignalKind::ALL.map(|kind| DebounceTimer::new(kind.threshold_ms(thresholds))),
        }
    }

    /// Process the signals of one frame, returning the alerts that fired
    pub fn process(&mut self, signals: &SignalSet, now_ms: u64) -> Vec<AlertEvent> {
        let mut events = Vec::new();

        if !signals.face_visible {
            for kind in [
                SignalKind::EyesClosed,
                SignalKind::Yawn,
                SignalKind::Distraction,
                SignalKind::HeadNod,
            ] {
                self.timer_mut(kind).clear();
            }
            self.step(SignalKind::FaceNotVisible, true, now_ms, &mut events);
            return events;
        }

        self.timer_mut(SignalKind::FaceNotVisible).clear();
        self.step(SignalKind::EyesClosed, signals.eyes_closed, now_ms, &mut events);
        self.step(SignalKind::Yawn, signals.is_yawning, now_ms, &mut events);
        self.step(SignalKind::Distraction, signals.is_distracted, now_ms, &mut events);

        // Distraction suppresses head-nod debouncing so one head motion alerts once
        if signals.is_distracted {
            self.timer_mut(SignalKind::HeadNod).clear();
        } else {
            self.step(SignalKind::HeadNod, signals.head_nodding, now_ms, &mut events);
        }

        events
    }

    /// Clear every timer
    pub fn reset(&mut self) {
        for timer in &mut self.timers {
            timer.clear();
        }
    }

    pub fn timer(&self, kind: SignalKind) -> &DebounceTimer {
        &self.timers[kind.index()]
    }

    fn timer_mut(&mut self, kind: SignalKind) -> &mut DebounceTimer {
        &mut self.timers[kind.index()]
    }

    fn step(&mut self, kind: SignalKind, active: bool, now_ms: u64, events: &mut Vec<AlertEvent>) {
        if self.timer_mut(kind).update(active, now_ms) {
            debug!("{:?} held for {} ms, firing {:?}", kind, self.timer(kind).threshold_ms(), kind.alert_kind());
            events.push(AlertEvent::new(kind.alert_kind(), now_ms, kind.message()));
        }
    }
}

impl Default for TemporalDebouncer {
    fn default() -> Self {
        Self::new(&DebounceThresholds::default())
    }
}
