//! Predictive Fatigue Risk
//!
//! Combines circadian (time-of-day) risk with continuous-driving-duration
//! risk into a 0-100 score, evaluated periodically while a trip is active.

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use dms::{AlertEvent, AlertKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Message attached to risk-triggered alerts
pub const HIGH_RISK_MESSAGE: &str = "High fatigue risk";

/// Longest accepted check period (one day)
pub const MAX_CHECK_INTERVAL_SECS: u64 = 86_400;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RiskError {
    #[error("Invalid risk configuration: {0}")]
    Config(String),
}

/// Fatigue risk configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Score at or above which a drowsiness alert is raised
    pub alert_threshold: u8,
    /// Period of the risk check (seconds)
    pub check_interval_secs: u64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            alert_threshold: 90,
            check_interval_secs: 60,
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), RiskError> {
        if !(1..=MAX_CHECK_INTERVAL_SECS).contains(&self.check_interval_secs) {
            return Err(RiskError::Config(format!(
                "check_interval_secs {} outside [1, {}]",
                self.check_interval_secs, MAX_CHECK_INTERVAL_SECS
            )));
        }
        if self.alert_threshold > 100 {
            return Err(RiskError::Config(format!(
                "alert_threshold {} above 100",
                self.alert_threshold
            )));
        }
        Ok(())
    }
}

/// Driving state tracked for the duration component
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FatigueRiskState {
    pub is_driving: bool,
    pub drive_started_at: Option<DateTime<Utc>>,
}

/// Result of one periodic check
#[derive(Debug, Clone, PartialEq)]
pub struct RiskAssessment {
    pub score: u8,
    pub alert: Option<AlertEvent>,
}

/// Circadian risk for an hour of the day (0-23)
pub fn circadian_score(hour: u32) -> u8 {
    match hour {
        2..=5 => 80,
        0..=1 => 60,
        22..=23 => 40,
        13..=15 => 50,
        16..=21 => 20,
        _ => 10,
    }
}

/// Risk for time spent driving without a break
pub fn duration_score(driving: Duration) -> u8 {
    let hours = driving.num_milliseconds().max(0) as f64 / 3_600_000.0;
    if hours < 1.0 {
        0
    } else if hours < 2.0 {
        10
    } else if hours < 3.0 {
        30
    } else if hours < 4.0 {
        60
    } else {
        90
    }
}

/// Periodic fatigue risk scorer for one trip
#[derive(Debug, Clone)]
pub struct FatigueRiskScorer {
    config: RiskConfig,
    state: FatigueRiskState,
}

impl FatigueRiskScorer {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            config,
            state: FatigueRiskState::default(),
        }
    }

    /// Begin tracking a drive
    pub fn start_drive(&mut self, started_at: DateTime<Utc>) {
        info!("Fatigue risk tracking started at {}", started_at);
        self.state = FatigueRiskState {
            is_driving: true,
            drive_started_at: Some(started_at),
        };
    }

    /// Stop tracking; subsequent scores are 0
    pub fn stop_drive(&mut self) {
        self.state = FatigueRiskState::default();
    }

    pub fn state(&self) -> FatigueRiskState {
        self.state
    }

    /// Risk score at `now`, clamped to 0-100. 0 when no trip is active.
    pub fn calculate_risk<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> u8 {
        if !self.state.is_driving {
            return 0;
        }

        let driving = self
            .state
            .drive_started_at
            .map(|start| now.with_timezone(&Utc) - start)
            .unwrap_or_else(Duration::zero);

        let total = circadian_score(now.hour()) as u16 + duration_score(driving) as u16;
        total.min(100) as u8
    }

    /// Periodic check: score plus an alert when the threshold is reached
    pub fn check<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> RiskAssessment {
        let score = self.calculate_risk(now);
        debug!("Fatigue risk score {}", score);

        let alert = if self.state.is_driving && score >= self.config.alert_threshold {
            warn!("Fatigue risk {} >= {}, raising drowsiness alert", score, self.config.alert_threshold);
            let timestamp_ms = u64::try_from(now.timestamp_millis()).unwrap_or(0);
            Some(AlertEvent::new(AlertKind::Drowsiness, timestamp_ms, HIGH_RISK_MESSAGE))
        } else {
            None
        };

        RiskAssessment { score, alert }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }
}

impl Default for FatigueRiskScorer {
    fn default() -> Self {
        Self::new(RiskConfig::default())
    }
}
