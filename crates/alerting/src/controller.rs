//! Alert escalation state machine
//!
//! Renders one alert at a time. Faint and accident alerts open a response
//! window; if it lapses the controller escalates to an automatic SOS.
//! The controller performs no I/O itself: every transition returns the
//! [`Effect`]s its owner must carry out.

use std::time::Duration;

use dms::{AlertEvent, AlertKind};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::AlertConfig;
use crate::output::RenderRequest;
use crate::sos::SosResult;

/// Time the driver has to answer a faint or accident alert (milliseconds)
pub const RESPONSE_TIMEOUT_MS: u64 = 10_000;

/// Where an alert came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertOrigin {
    /// Debounced camera signal
    Camera,
    /// Periodic fatigue-risk check
    FatigueRisk,
    /// Accelerometer shake (possible accident)
    Shake,
}

/// Identifies one response deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DeadlineId(pub u64);

/// Identifies one SOS delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SosTicket {
    pub id: u64,
    pub automatic: bool,
}

/// Progress of an SOS shown in the active alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SosStatus {
    Sending(SosTicket),
    Sent { sent_count: usize, total_count: usize },
    Failed { error: String },
}

/// The single alert session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AlertSession {
    Idle,
    Active {
        kind: AlertKind,
        origin: AlertOrigin,
        started_at_ms: u64,
        sos: Option<SosStatus>,
    },
    AwaitingResponse {
        kind: AlertKind,
        origin: AlertOrigin,
        started_at_ms: u64,
        deadline_ms: u64,
        deadline: DeadlineId,
    },
}

/// Coarse state of the alert session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertPhase {
    Idle,
    Active,
    AwaitingResponse,
}

/// Title and message shown for the current alert
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertPrompt {
    pub title: String,
    pub message: String,
}

impl AlertPrompt {
    fn new(title: &str, message: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
        }
    }
}

impl AlertSession {
    pub fn phase(&self) -> AlertPhase {
        match self {
            AlertSession::Idle => AlertPhase::Idle,
            AlertSession::Active { .. } => AlertPhase::Active,
            AlertSession::AwaitingResponse { .. } => AlertPhase::AwaitingResponse,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, AlertSession::Idle)
    }

    pub fn kind(&self) -> Option<AlertKind> {
        match self {
            AlertSession::Idle => None,
            AlertSession::Active { kind, .. } | AlertSession::AwaitingResponse { kind, .. } => Some(*kind),
        }
    }

    /// What the driver sees for this state
    pub fn prompt(&self) -> Option<AlertPrompt> {
        match self {
            AlertSession::Idle => None,
            AlertSession::Active { sos: Some(status), .. } => Some(match status {
                SosStatus::Sending(_) => AlertPrompt::new("Emergency Detected!", "Sending SOS to your contacts..."),
                SosStatus::Sent { .. } => AlertPrompt::new("SOS Sent", "Emergency message sent."),
                SosStatus::Failed { error } => AlertPrompt::new("SOS Failed", format!("Failed: {}", error)),
            }),
            AlertSession::Active { kind, origin, .. } | AlertSession::AwaitingResponse { kind, origin, .. } => {
                Some(alert_prompt(*kind, *origin))
            }
        }
    }
}

fn alert_prompt(kind: AlertKind, origin: AlertOrigin) -> AlertPrompt {
    match (origin, kind) {
        (AlertOrigin::FatigueRisk, _) => AlertPrompt::new(
            "High Fatigue Risk!",
            "You have been driving for too long. Please take a break immediately.",
        ),
        (AlertOrigin::Shake, _) => AlertPrompt::new("Possible Accident!", "Are you okay?"),
        (_, AlertKind::Drowsiness) => {
            AlertPrompt::new("Drowsiness Detected", "You appear to be getting sleepy. Please take a break.")
        }
        (_, AlertKind::Distraction) => AlertPrompt::new("Distraction Detected", "Keep your eyes on the road."),
        (_, AlertKind::Faint) => AlertPrompt::new("Possible Faint Detected!", "Please respond if you're okay!"),
        (_, AlertKind::Sos) => AlertPrompt::new("Emergency Detected!", "Sending SOS to your contacts..."),
    }
}

/// Explicit driver responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UserAction {
    ImOk,
    TakeBreak,
    ManualSos,
}

/// Side effects requested by a transition, in execution order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Start rendering an alert (fire-and-forget)
    Render(RenderRequest),
    /// Stop any alert output in progress
    StopOutput,
    /// Count an alert against the running trip
    RecordAlert(AlertKind),
    /// Schedule `deadline_elapsed(id)` after the delay
    StartDeadline { id: DeadlineId, after: Duration },
    /// Drop any scheduled deadline
    CancelDeadline,
    /// Send an SOS and report back via `sos_finished`
    SendSos(SosTicket),
}

/// Last SOS outcome, kept after the alert is dismissed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SosReport {
    pub ticket: SosTicket,
    pub result: SosResult,
}

/// Alert escalation controller
#[derive(Debug)]
pub struct AlertController {
    config: AlertConfig,
    session: AlertSession,
    next_id: u64,
    last_sos: Option<SosReport>,
}

impl AlertController {
    pub fn new(config: AlertConfig) -> Self {
        Self {
            config,
            session: AlertSession::Idle,
            next_id: 1,
            last_sos: None,
        }
    }

    pub fn session(&self) -> &AlertSession {
        &self.session
    }

    pub fn last_sos(&self) -> Option<&SosReport> {
        self.last_sos.as_ref()
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    /// Rendering settings only; escalation is unaffected
    pub fn update_config(&mut self, config: AlertConfig) {
        self.config = config;
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Raise an alert. Dropped unless the session is idle.
    pub fn raise(&mut self, event: &AlertEvent, origin: AlertOrigin, now_ms: u64) -> Vec<Effect> {
        if !self.session.is_idle() {
            debug!(
                "Dropping {:?} alert ({}): {:?} alert already active",
                event.kind,
                event.message,
                self.session.kind()
            );
            return Vec::new();
        }

        info!("Alert raised: {:?} from {:?} ({})", event.kind, origin, event.message);
        let mut effects = vec![
            Effect::Render(RenderRequest::new(event.kind, &self.config)),
            Effect::RecordAlert(event.kind),
        ];

        let needs_response = match event.kind {
            AlertKind::Faint => true,
            AlertKind::Sos => origin == AlertOrigin::Shake,
            AlertKind::Drowsiness | AlertKind::Distraction => false,
        };

        if needs_response {
            let deadline = DeadlineId(self.next_id());
            let after = Duration::from_millis(RESPONSE_TIMEOUT_MS);
            info!("Awaiting driver response for {} ms", after.as_millis());
            self.session = AlertSession::AwaitingResponse {
                kind: event.kind,
                origin,
                started_at_ms: now_ms,
                deadline_ms: now_ms.saturating_add(RESPONSE_TIMEOUT_MS),
                deadline,
            };
            effects.push(Effect::StartDeadline { id: deadline, after });
        } else if event.kind == AlertKind::Sos {
            let ticket = SosTicket {
                id: self.next_id(),
                automatic: true,
            };
            warn!("SOS alert, sending automatic SOS immediately");
            self.session = AlertSession::Active {
                kind: event.kind,
                origin,
                started_at_ms: now_ms,
                sos: Some(SosStatus::Sending(ticket)),
            };
            effects.push(Effect::SendSos(ticket));
        } else {
            self.session = AlertSession::Active {
                kind: event.kind,
                origin,
                started_at_ms: now_ms,
                sos: None,
            };
        }

        effects
    }

    /// Response window lapsed. Stale deadlines are ignored.
    pub fn deadline_elapsed(&mut self, id: DeadlineId) -> Vec<Effect> {
        let AlertSession::AwaitingResponse {
            kind,
            origin,
            started_at_ms,
            deadline,
            ..
        } = self.session
        else {
            debug!("Deadline {:?} elapsed with no pending response", id);
            return Vec::new();
        };

        if deadline != id {
            debug!("Ignoring stale deadline {:?}", id);
            return Vec::new();
        }

        let ticket = SosTicket {
            id: self.next_id(),
            automatic: true,
        };
        warn!("No response to {:?} alert, escalating to automatic SOS", kind);
        self.session = AlertSession::Active {
            kind,
            origin,
            started_at_ms,
            sos: Some(SosStatus::Sending(ticket)),
        };
        vec![Effect::SendSos(ticket)]
    }

    /// Driver action: always returns to idle
    pub fn respond(&mut self, action: UserAction) -> Vec<Effect> {
        info!("Driver action {:?} in {:?}", action, self.session.phase());
        self.session = AlertSession::Idle;

        let mut effects = vec![Effect::CancelDeadline, Effect::StopOutput];
        if action == UserAction::ManualSos {
            effects.push(Effect::SendSos(SosTicket {
                id: self.next_id(),
                automatic: false,
            }));
        }
        effects
    }

    /// SOS delivery finished
    pub fn sos_finished(&mut self, ticket: SosTicket, result: SosResult) -> Vec<Effect> {
        if result.success {
            info!(
                "SOS {} delivered to {}/{} contacts",
                ticket.id, result.sent_count, result.total_count
            );
        } else {
            warn!(
                "SOS {} failed: {}",
                ticket.id,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }

        if let AlertSession::Active { sos: Some(status), .. } = &mut self.session {
            if *status == SosStatus::Sending(ticket) {
                *status = if result.success {
                    SosStatus::Sent {
                        sent_count: result.sent_count,
                        total_count: result.total_count,
                    }
                } else {
                    SosStatus::Failed {
                        error: result.error.clone().unwrap_or_else(|| "unknown error".to_string()),
                    }
                };
            }
        }

        let mut effects = Vec::new();
        if !ticket.automatic && result.success {
            effects.push(Effect::RecordAlert(AlertKind::Sos));
        }
        self.last_sos = Some(SosReport { ticket, result });
        effects
    }

    /// Monitoring stopped: drop the session and silence output
    pub fn reset(&mut self) -> Vec<Effect> {
        self.session = AlertSession::Idle;
        vec![Effect::CancelDeadline, Effect::StopOutput]
    }
}

impl Default for AlertController {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: AlertKind) -> AlertEvent {
        AlertEvent::new(kind, 1000, "test")
    }

    fn sent(count: usize) -> SosResult {
        SosResult {
            success: true,
            sent_count: count,
            total_count: count,
            error: None,
        }
    }

    fn sos_ticket(effects: &[Effect]) -> Option<SosTicket> {
        effects.iter().find_map(|e| match e {
            Effect::SendSos(ticket) => Some(*ticket),
            _ => None,
        })
    }

    fn deadline(effects: &[Effect]) -> Option<DeadlineId> {
        effects.iter().find_map(|e| match e {
            Effect::StartDeadline { id, .. } => Some(*id),
            _ => None,
        })
    }

    #[test]
    fn test_drowsiness_renders_and_records() {
        let mut controller = AlertController::default();
        let effects = controller.raise(&event(AlertKind::Drowsiness), AlertOrigin::Camera, 1000);

        assert!(matches!(&effects[0], Effect::Render(r) if r.kind == AlertKind::Drowsiness));
        assert_eq!(effects[1], Effect::RecordAlert(AlertKind::Drowsiness));
        assert_eq!(effects.len(), 2);
        assert_eq!(controller.session().phase(), AlertPhase::Active);
        assert_eq!(
            controller.session().prompt().unwrap().title,
            "Drowsiness Detected"
        );
    }

    #[test]
    fn test_second_alert_dropped_while_active() {
        let mut controller = AlertController::default();
        controller.raise(&event(AlertKind::Distraction), AlertOrigin::Camera, 0);
        let effects = controller.raise(&event(AlertKind::Sos), AlertOrigin::Camera, 10);

        assert!(effects.is_empty());
        assert_eq!(controller.session().kind(), Some(AlertKind::Distraction));
    }

    #[test]
    fn test_second_alert_dropped_while_awaiting_response() {
        let mut controller = AlertController::default();
        controller.raise(&event(AlertKind::Faint), AlertOrigin::Camera, 0);
        assert!(controller
            .raise(&event(AlertKind::Drowsiness), AlertOrigin::FatigueRisk, 10)
            .is_empty());
        assert_eq!(controller.session().phase(), AlertPhase::AwaitingResponse);
    }

    #[test]
    fn test_faint_escalates_after_deadline() {
        let mut controller = AlertController::default();
        let effects = controller.raise(&event(AlertKind::Faint), AlertOrigin::Camera, 1000);

        let id = deadline(&effects).expect("deadline scheduled");
        assert!(effects.contains(&Effect::StartDeadline {
            id,
            after: Duration::from_millis(10_000)
        }));
        match controller.session() {
            AlertSession::AwaitingResponse { deadline_ms, .. } => assert_eq!(*deadline_ms, 11_000),
            other => panic!("unexpected session {:?}", other),
        }

        let effects = controller.deadline_elapsed(id);
        let ticket = sos_ticket(&effects).expect("sos sent");
        assert!(ticket.automatic);
        assert_eq!(controller.session().phase(), AlertPhase::Active);
        assert_eq!(controller.session().prompt().unwrap().title, "Emergency Detected!");

        controller.sos_finished(ticket, sent(2));
        assert_eq!(controller.session().prompt().unwrap().title, "SOS Sent");
        assert_eq!(controller.session().phase(), AlertPhase::Active);
    }

    #[test]
    fn test_response_window_fixed_across_config_and_clock() {
        let mut controller = AlertController::new(AlertConfig {
            alert_volume: 0,
            vibration_enabled: false,
            ..Default::default()
        });
        let effects = controller.raise(&event(AlertKind::Faint), AlertOrigin::Camera, u64::MAX - 5);

        let id = deadline(&effects).expect("deadline scheduled");
        assert!(effects.contains(&Effect::StartDeadline {
            id,
            after: Duration::from_millis(RESPONSE_TIMEOUT_MS)
        }));
        match controller.session() {
            AlertSession::AwaitingResponse { deadline_ms, .. } => assert_eq!(*deadline_ms, u64::MAX),
            other => panic!("unexpected session {:?}", other),
        }
    }

    #[test]
    fn test_stale_deadline_ignored() {
        let mut controller = AlertController::default();
        let effects = controller.raise(&event(AlertKind::Faint), AlertOrigin::Camera, 0);
        let first = deadline(&effects).unwrap();
        controller.respond(UserAction::ImOk);

        let effects = controller.raise(&event(AlertKind::Faint), AlertOrigin::Camera, 100);
        let second = deadline(&effects).unwrap();
        assert_ne!(first, second);

        assert!(controller.deadline_elapsed(first).is_empty());
        assert_eq!(controller.session().phase(), AlertPhase::AwaitingResponse);
        assert!(sos_ticket(&controller.deadline_elapsed(second)).is_some());
    }

    #[test]
    fn test_sos_event_sends_immediately() {
        let mut controller = AlertController::default();
        let effects = controller.raise(&event(AlertKind::Sos), AlertOrigin::Camera, 5000);

        assert!(deadline(&effects).is_none());
        let ticket = sos_ticket(&effects).expect("immediate sos");
        assert!(ticket.automatic);
        assert!(matches!(&effects[0], Effect::Render(r) if r.volume == 100));
        assert!(effects.contains(&Effect::RecordAlert(AlertKind::Sos)));
    }

    #[test]
    fn test_shake_sos_waits_for_response() {
        let mut controller = AlertController::default();
        let effects = controller.raise(&event(AlertKind::Sos), AlertOrigin::Shake, 0);

        assert!(deadline(&effects).is_some());
        assert!(sos_ticket(&effects).is_none());
        assert_eq!(controller.session().prompt().unwrap().title, "Possible Accident!");
    }

    #[test]
    fn test_sos_failure_reported() {
        let mut controller = AlertController::default();
        let effects = controller.raise(&event(AlertKind::Sos), AlertOrigin::Camera, 0);
        let ticket = sos_ticket(&effects).unwrap();

        let effects = controller.sos_finished(ticket, SosResult::failed(2, "no signal"));
        assert!(effects.is_empty());
        let prompt = controller.session().prompt().unwrap();
        assert_eq!(prompt.title, "SOS Failed");
        assert_eq!(prompt.message, "Failed: no signal");
        assert!(!controller.last_sos().unwrap().result.success);
    }

    #[test]
    fn test_user_actions_return_to_idle() {
        for action in [UserAction::ImOk, UserAction::TakeBreak] {
            let mut controller = AlertController::default();
            controller.raise(&event(AlertKind::Faint), AlertOrigin::Camera, 0);
            let effects = controller.respond(action);
            assert_eq!(effects, vec![Effect::CancelDeadline, Effect::StopOutput]);
            assert!(controller.session().is_idle());
            assert!(controller.session().prompt().is_none());
        }
    }

    #[test]
    fn test_manual_sos_from_idle() {
        let mut controller = AlertController::default();
        let effects = controller.respond(UserAction::ManualSos);
        let ticket = sos_ticket(&effects).expect("manual sos");
        assert!(!ticket.automatic);
        assert!(controller.session().is_idle());

        let effects = controller.sos_finished(ticket, sent(1));
        assert_eq!(effects, vec![Effect::RecordAlert(AlertKind::Sos)]);
        assert!(controller.session().is_idle());
        assert_eq!(controller.last_sos().unwrap().ticket, ticket);
    }

    #[test]
    fn test_automatic_sos_success_not_double_counted() {
        let mut controller = AlertController::default();
        let effects = controller.raise(&event(AlertKind::Sos), AlertOrigin::Camera, 0);
        let ticket = sos_ticket(&effects).unwrap();
        assert!(controller.sos_finished(ticket, sent(1)).is_empty());
    }

    #[test]
    fn test_sos_result_after_dismissal_keeps_idle() {
        let mut controller = AlertController::default();
        let effects = controller.raise(&event(AlertKind::Sos), AlertOrigin::Camera, 0);
        let ticket = sos_ticket(&effects).unwrap();
        controller.respond(UserAction::ImOk);

        controller.sos_finished(ticket, sent(1));
        assert!(controller.session().is_idle());
    }

    #[test]
    fn test_fatigue_risk_prompt() {
        let mut controller = AlertController::default();
        controller.raise(&event(AlertKind::Drowsiness), AlertOrigin::FatigueRisk, 0);
        assert_eq!(controller.session().prompt().unwrap().title, "High Fatigue Risk!");
    }

    #[test]
    fn test_reset_goes_idle() {
        let mut controller = AlertController::default();
        controller.raise(&event(AlertKind::Faint), AlertOrigin::Camera, 0);
        let effects = controller.reset();
        assert!(controller.session().is_idle());
        assert!(effects.contains(&Effect::CancelDeadline));
        assert!(effects.contains(&Effect::StopOutput));
    }
}
