//! Alert rendering configuration

use serde::{Deserialize, Serialize};

/// Language for spoken alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "EN", alias = "ENGLISH", alias = "en")]
    English,
    #[serde(rename = "TA", alias = "TAMIL", alias = "ta")]
    Tamil,
}

/// Alert configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub language: Language,
    /// Output volume percentage (0-100)
    pub alert_volume: u8,
    pub vibration_enabled: bool,
    pub tts_enabled: bool,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            language: Language::English,
            alert_volume: 80,
            vibration_enabled: true,
            tts_enabled: true,
        }
    }
}

impl AlertConfig {
    /// Volume clamped to 0-100
    pub fn volume(&self) -> u8 {
        self.alert_volume.min(100)
    }
}
