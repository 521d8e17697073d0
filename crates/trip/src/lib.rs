//! Trip Scoring
//!
//! Accumulates alert counts over a monitoring session and turns them into a
//! bounded safety score and an immutable trip summary.

use chrono::{DateTime, Utc};
use dms::AlertKind;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

/// Running counters for the active trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripCounters {
    /// Drowsiness alerts
    pub alert_count: u32,
    /// SOS-severity alerts (SOS and faint)
    pub sos_count: u32,
    pub distraction_count: u32,
    pub yawn_count: u32,
    pub started_at: DateTime<Utc>,
}

impl TripCounters {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            alert_count: 0,
            sos_count: 0,
            distraction_count: 0,
            yawn_count: 0,
            started_at,
        }
    }

    /// Safety score for the counts so far
    pub fn safety_score(&self) -> u8 {
        safety_score(self.alert_count, self.distraction_count, self.sos_count, self.yawn_count)
    }
}

/// 100 minus weighted penalties, clamped to 0-100
pub fn safety_score(alert_count: u32, distraction_count: u32, sos_count: u32, yawn_count: u32) -> u8 {
    let penalty = alert_count as i64 * 10
        + distraction_count as i64 * 2
        + sos_count as i64 * 50
        + yawn_count as i64;
    (100 - penalty).clamp(0, 100) as u8
}

/// Immutable record of a finished trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub alert_count: u32,
    pub sos_count: u32,
    pub distraction_count: u32,
    pub yawn_count: u32,
    pub safety_score: u8,
}

impl TripSummary {
    /// Drowsiness plus distraction alerts
    pub fn total_alerts(&self) -> u32 {
        self.alert_count + self.distraction_count
    }
}

/// Trip scorer; counters exist only while a trip is active
#[derive(Debug, Clone, Default)]
pub struct TripScorer {
    counters: Option<TripCounters>,
}

impl TripScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a trip, resetting all counters
    pub fn start_trip(&mut self, started_at: DateTime<Utc>) {
        info!("Trip started at {}", started_at);
        self.counters = Some(TripCounters::new(started_at));
    }

    pub fn is_active(&self) -> bool {
        self.counters.is_some()
    }

    pub fn counters(&self) -> Option<&TripCounters> {
        self.counters.as_ref()
    }

    /// Count an alert against the active trip. Ignored when no trip is active.
    pub fn record_alert(&mut self, kind: AlertKind) {
        let Some(counters) = self.counters.as_mut() else {
            return;
        };

        match kind {
            AlertKind::Drowsiness => counters.alert_count += 1,
            AlertKind::Distraction => counters.distraction_count += 1,
            AlertKind::Sos | AlertKind::Faint => counters.sos_count += 1,
        }
        debug!("Recorded {:?} alert", kind);
    }

    /// Count an observed yawn. Ignored when no trip is active.
    pub fn record_yawn(&mut self) {
        if let Some(counters) = self.counters.as_mut() {
            counters.yawn_count += 1;
        }
    }

    /// Finish the trip. Returns `None` when no trip is active.
    pub fn end_trip(&mut self, ended_at: DateTime<Utc>) -> Option<TripSummary> {
        let counters = self.counters.take()?;
        let duration_ms = (ended_at - counters.started_at).num_milliseconds().max(0) as u64;

        let summary = TripSummary {
            id: Uuid::new_v4(),
            started_at: counters.started_at,
            ended_at,
            duration_ms,
            alert_count: counters.alert_count,
            sos_count: counters.sos_count,
            distraction_count: counters.distraction_count,
            yawn_count: counters.yawn_count,
            safety_score: counters.safety_score(),
        };

        info!(
            "Trip {} ended after {} ms, safety score {}",
            summary.id, summary.duration_ms, summary.safety_score
        );
        Some(summary)
    }
}
