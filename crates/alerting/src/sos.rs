//! Emergency messaging: contacts, location, SOS delivery results

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::AlertError;

/// Person notified when an SOS is sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub phone_number: String,
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

/// A position fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// Location handed to the SOS sender: a fix, or why there is none
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LocationFix {
    Known(GeoLocation),
    Unavailable(String),
}

impl LocationFix {
    /// Human-readable location line for messages
    pub fn describe(&self) -> String {
        match self {
            LocationFix::Known(loc) => format!(
                "{}, {} (https://maps.google.com/?q={},{})",
                loc.latitude, loc.longitude, loc.latitude, loc.longitude
            ),
            LocationFix::Unavailable(reason) => format!("Location unavailable: {}", reason),
        }
    }
}

impl From<Result<GeoLocation, AlertError>> for LocationFix {
    fn from(result: Result<GeoLocation, AlertError>) -> Self {
        match result {
            Ok(location) => LocationFix::Known(location),
            Err(AlertError::Location(reason)) => LocationFix::Unavailable(reason),
            Err(e) => LocationFix::Unavailable(e.to_string()),
        }
    }
}

/// Outcome of one SOS delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SosResult {
    pub success: bool,
    pub sent_count: usize,
    pub total_count: usize,
    pub error: Option<String>,
}

impl SosResult {
    /// Delivery that reached nobody
    pub fn failed(total_count: usize, error: impl Into<String>) -> Self {
        Self {
            success: false,
            sent_count: 0,
            total_count,
            error: Some(error.into()),
        }
    }

    /// Try every contact, continuing past individual failures.
    ///
    /// Succeeds when at least one contact was reached; keeps the last error.
    pub fn deliver_to_all<F>(contacts: &[EmergencyContact], mut send: F) -> Self
    where
        F: FnMut(&EmergencyContact) -> Result<(), AlertError>,
    {
        if contacts.is_empty() {
            return Self::failed(0, "No emergency contacts configured");
        }

        let mut sent_count = 0;
        let mut error = None;
        for contact in contacts {
            match send(contact) {
                Ok(()) => sent_count += 1,
                Err(e) => {
                    warn!("SOS to {} failed: {}", contact.name, e);
                    error = Some(e.to_string());
                }
            }
        }

        Self {
            success: sent_count > 0,
            sent_count,
            total_count: contacts.len(),
            error,
        }
    }
}

/// SMS body for an SOS
pub fn compose_sos_message(location: &LocationFix, automatic: bool, at: NaiveDateTime) -> String {
    let sos_type = if automatic { "AUTO" } else { "MANUAL" };
    format!(
        "EMERGENCY ALERT\n\
         \n\
         SOS Type: {} SOS\n\
         Time: {}\n\
         Location: {}\n\
         \n\
         The driver may be in distress or unconscious.\n\
         Please contact emergency services immediately.",
        sos_type,
        at.format("%Y-%m-%d %H:%M:%S"),
        location.describe()
    )
}

/// Emergency messaging collaborator
#[async_trait]
pub trait SosSender: Send + Sync {
    async fn send_sos(
        &self,
        contacts: &[EmergencyContact],
        location: &LocationFix,
        automatic: bool,
    ) -> Result<SosResult, AlertError>;
}

/// Current-position collaborator
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_location(&self) -> Result<GeoLocation, AlertError>;
}
