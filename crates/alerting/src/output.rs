//! Alert output collaborator and per-kind render profiles

use async_trait::async_trait;
use dms::AlertKind;
use serde::Serialize;

use crate::config::{AlertConfig, Language};
use crate::AlertError;

/// Tone played by the audio collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tone {
    AlertCallGuard,
    Pip,
    EmergencyRingback,
}

/// How one alert kind is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderProfile {
    pub tone: Tone,
    /// Tone length (ms)
    pub tone_ms: u32,
    /// Off/on vibration waveform (ms), played once
    pub vibration_pattern_ms: &'static [u64],
    pub message_en: &'static str,
    pub message_ta: &'static str,
    /// Played at full volume regardless of the configured volume
    pub emergency: bool,
}

const DROWSINESS: RenderProfile = RenderProfile {
    tone: Tone::AlertCallGuard,
    tone_ms: 1000,
    vibration_pattern_ms: &[0, 500, 200, 500, 200, 500],
    message_en: "Alert! You look sleepy. Please stop and rest.",
    message_ta: "அலர்ட்! நீங்கள் தூங்கப்போகிறீர்கள். தயவுசெய்து ஓய்வெடுக்கவும்.",
    emergency: false,
};

const DISTRACTION: RenderProfile = RenderProfile {
    tone: Tone::Pip,
    tone_ms: 1000,
    vibration_pattern_ms: &[0, 200, 100, 200],
    message_en: "Keep your eyes on the road.",
    message_ta: "சாலையை கவனிக்கவும்.",
    emergency: false,
};

const FAINT: RenderProfile = RenderProfile {
    tone: Tone::EmergencyRingback,
    tone_ms: 1000,
    vibration_pattern_ms: &[0, 1000, 500, 1000],
    message_en: "Are you okay? Faint detected.",
    message_ta: "நீங்கள் நலமாக இருக்கிறீர்களா?",
    emergency: false,
};

const SOS: RenderProfile = RenderProfile {
    tone: Tone::EmergencyRingback,
    tone_ms: 2000,
    vibration_pattern_ms: &[0, 1000, 500, 1000, 500, 1000],
    message_en: "Emergency SOS activated. Help is being contacted.",
    message_ta: "அவசர SOS செயல்படுத்தப்பட்டது. உதவி தொடர்பு கொள்ளப்படுகிறது.",
    emergency: true,
};

/// Render profile for an alert kind
pub fn profile_for(kind: AlertKind) -> &'static RenderProfile {
    match kind {
        AlertKind::Drowsiness => &DROWSINESS,
        AlertKind::Distraction => &DISTRACTION,
        AlertKind::Faint => &FAINT,
        AlertKind::Sos => &SOS,
    }
}

/// Parameters handed to the alert output collaborator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderRequest {
    pub kind: AlertKind,
    pub language: Language,
    /// Effective volume (0-100)
    pub volume: u8,
    pub vibration_enabled: bool,
    pub tts_enabled: bool,
    pub profile: RenderProfile,
}

impl RenderRequest {
    pub fn new(kind: AlertKind, config: &AlertConfig) -> Self {
        let profile = *profile_for(kind);
        Self {
            kind,
            language: config.language,
            volume: if profile.emergency { 100 } else { config.volume() },
            vibration_enabled: config.vibration_enabled,
            tts_enabled: config.tts_enabled,
            profile,
        }
    }

    /// Spoken message in the configured language, if speech is enabled
    pub fn speech(&self) -> Option<&'static str> {
        if !self.tts_enabled {
            return None;
        }
        Some(match self.language {
            Language::English => self.profile.message_en,
            Language::Tamil => self.profile.message_ta,
        })
    }

    /// Vibration waveform, if vibration is enabled
    pub fn vibration(&self) -> Option<&'static [u64]> {
        self.vibration_enabled.then_some(self.profile.vibration_pattern_ms)
    }
}

/// Audio / vibration / speech collaborator.
///
/// Calls may be repeated; `stop_current_alert` must be safe when nothing plays.
#[async_trait]
pub trait AlertOutput: Send + Sync {
    async fn render_alert(&self, request: &RenderRequest) -> Result<(), AlertError>;

    fn stop_current_alert(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emergency_plays_at_full_volume() {
        let config = AlertConfig {
            alert_volume: 30,
            ..Default::default()
        };
        assert_eq!(RenderRequest::new(AlertKind::Sos, &config).volume, 100);
        assert_eq!(RenderRequest::new(AlertKind::Drowsiness, &config).volume, 30);
    }

    #[test]
    fn test_speech_follows_language_and_toggle() {
        let mut config = AlertConfig {
            language: Language::Tamil,
            ..Default::default()
        };
        let request = RenderRequest::new(AlertKind::Distraction, &config);
        assert_eq!(request.speech(), Some("சாலையை கவனிக்கவும்."));

        config.tts_enabled = false;
        assert_eq!(RenderRequest::new(AlertKind::Distraction, &config).speech(), None);
    }

    #[test]
    fn test_vibration_toggle() {
        let config = AlertConfig {
            vibration_enabled: false,
            ..Default::default()
        };
        assert!(RenderRequest::new(AlertKind::Faint, &config).vibration().is_none());
        assert_eq!(
            RenderRequest::new(AlertKind::Faint, &AlertConfig::default()).vibration(),
            Some(&[0u64, 1000, 500, 1000][..])
        );
    }
}
