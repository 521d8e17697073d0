//! Application settings
//!
//! Loaded from an optional TOML file, then `FATIGUE__`-prefixed environment
//! variables (`FATIGUE__DMS__EAR_THRESHOLD=0.3`, `FATIGUE__ALERTS__LANGUAGE=TA`).

use std::path::Path;

use alerting::{AlertConfig, EmergencyContact, GeoLocation};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use dms::DmsConfig;
use fatigue_risk::RiskConfig;
use serde::{Deserialize, Serialize};
use session::MonitorConfig;

/// Settings file looked up in the working directory when none is given
pub const DEFAULT_SETTINGS_FILE: &str = "fatigue-monitor";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub dms: DmsConfig,
    pub alerts: AlertConfig,
    pub risk: RiskConfig,
    pub contacts: Vec<EmergencyContact>,
    /// Fixed position reported with SOS messages; none means "unavailable"
    pub location: Option<GeoLocation>,
    /// Trip summaries kept in the repository
    pub trip_retention: usize,
    pub queue_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        let monitor = MonitorConfig::default();
        Self {
            dms: monitor.dms,
            alerts: monitor.alerts,
            risk: monitor.risk,
            contacts: monitor.contacts,
            location: None,
            trip_retention: 1000,
            queue_capacity: monitor.queue_capacity,
        }
    }
}

impl Settings {
    /// Load settings. An explicit path must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_SETTINGS_FILE).required(false),
        };

        Self::build(Config::builder().add_source(file))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder
            .add_source(
                Environment::with_prefix("FATIGUE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            dms: self.dms.clone(),
            alerts: self.alerts.clone(),
            risk: self.risk.clone(),
            contacts: self.contacts.clone(),
            queue_capacity: self.queue_capacity,
        }
    }
}
