//! Alerting
//!
//! Alert escalation, render profiles, and the output / SOS / location
//! collaborator seams used by the monitoring session.

pub mod config;
pub mod controller;
pub mod output;
pub mod sos;

use thiserror::Error;

pub use config::{AlertConfig, Language};
pub use controller::{
    AlertController, AlertOrigin, AlertPhase, AlertPrompt, AlertSession, DeadlineId, Effect, SosReport,
    SosStatus, SosTicket, UserAction, RESPONSE_TIMEOUT_MS,
};
pub use output::{profile_for, AlertOutput, RenderProfile, RenderRequest, Tone};
pub use sos::{
    compose_sos_message, EmergencyContact, GeoLocation, LocationFix, LocationProvider, SosResult, SosSender,
};

/// Collaborator failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlertError {
    #[error("Alert output failed: {0}")]
    Output(String),

    #[error("SOS delivery failed: {0}")]
    Sos(String),

    #[error("Location unavailable: {0}")]
    Location(String),
}
