//! Log-backed collaborators for replay and bench runs

use std::sync::Arc;

use alerting::{
    compose_sos_message, AlertError, AlertOutput, EmergencyContact, GeoLocation, LocationFix, LocationProvider,
    RenderRequest, SosResult, SosSender,
};
use async_trait::async_trait;
use session::Clock;
use tracing::{debug, info, warn};

/// Writes alerts to the log instead of a speaker
#[derive(Debug, Default)]
pub struct LogAlertOutput;

#[async_trait]
impl AlertOutput for LogAlertOutput {
    async fn render_alert(&self, request: &RenderRequest) -> Result<(), AlertError> {
        info!(
            "ALERT {:?}: tone {:?} for {} ms at volume {}",
            request.kind, request.profile.tone, request.profile.tone_ms, request.volume
        );
        if let Some(pattern) = request.vibration() {
            debug!("Vibration pattern {:?}", pattern);
        }
        if let Some(speech) = request.speech() {
            info!("Speak ({:?}): {}", request.language, speech);
        }
        Ok(())
    }

    fn stop_current_alert(&self) {
        debug!("Alert output stopped");
    }
}

/// Logs the SMS that would go to each contact
pub struct LogSosSender {
    clock: Arc<dyn Clock>,
}

impl LogSosSender {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl SosSender for LogSosSender {
    async fn send_sos(
        &self,
        contacts: &[EmergencyContact],
        location: &LocationFix,
        automatic: bool,
    ) -> Result<SosResult, AlertError> {
        let message = compose_sos_message(location, automatic, self.clock.now().naive_local());

        Ok(SosResult::deliver_to_all(contacts, |contact| {
            if contact.phone_number.trim().is_empty() {
                return Err(AlertError::Sos(format!("{} has no phone number", contact.name)));
            }
            warn!("SMS to {} ({}):\n{}", contact.name, contact.phone_number, message);
            Ok(())
        }))
    }
}

/// Reports a fixed position, or none
#[derive(Debug, Default)]
pub struct StaticLocation {
    location: Option<GeoLocation>,
}

impl StaticLocation {
    pub fn new(location: Option<GeoLocation>) -> Self {
        Self { location }
    }
}

#[async_trait]
impl LocationProvider for StaticLocation {
    async fn current_location(&self) -> Result<GeoLocation, AlertError> {
        self.location
            .ok_or_else(|| AlertError::Location("no position configured".into()))
    }
}
