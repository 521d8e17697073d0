//! Session actor and its handle

use std::cmp::Reverse;
use std::sync::Arc;
use std::time::Duration;

use alerting::{
    AlertController, AlertOrigin, AlertPrompt, AlertSession, DeadlineId, Effect, EmergencyContact, LocationFix,
    RenderRequest, SosReport, SosResult, SosTicket, UserAction,
};
use chrono::Utc;
use dms::{AlertEvent, AlertKind, DmsModule, FaceFrameSample};
use fatigue_risk::FatigueRiskScorer;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use trip::{TripCounters, TripScorer, TripSummary};

use crate::shake::{AccelSample, ShakeDetector};
use crate::{Collaborators, MonitorConfig, SessionError};

const ACCIDENT_MESSAGE: &str = "Possible accident detected";

enum Command {
    Start,
    Stop(oneshot::Sender<Option<TripSummary>>),
    Frame(FaceFrameSample),
    Raise(AlertEvent, AlertOrigin),
    UserAction(UserAction),
    Accelerometer(AccelSample),
    RiskTick,
    DeadlineElapsed(DeadlineId),
    SosFinished(SosTicket, SosResult),
    Snapshot(oneshot::Sender<MonitorSnapshot>),
    Shutdown(oneshot::Sender<()>),
}

/// Point-in-time view of the session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitorSnapshot {
    pub monitoring: bool,
    pub alert: AlertSession,
    pub prompt: Option<AlertPrompt>,
    pub counters: Option<TripCounters>,
    pub last_risk_score: Option<u8>,
    pub last_sos: Option<SosReport>,
}

/// Cloneable access point to a running session
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    tx: mpsc::Sender<Command>,
}

impl MonitorHandle {
    async fn send(&self, command: Command) -> Result<(), SessionError> {
        self.tx.send(command).await.map_err(|_| SessionError::Closed)
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T, SessionError> {
        let (reply, response) = oneshot::channel();
        self.send(command(reply)).await?;
        response.await.map_err(|_| SessionError::Closed)
    }

    /// Start a trip. No-op when already monitoring.
    pub async fn start_monitoring(&self) -> Result<(), SessionError> {
        self.send(Command::Start).await
    }

    /// Stop monitoring and finalize the trip
    pub async fn stop_monitoring(&self) -> Result<Option<TripSummary>, SessionError> {
        self.request(Command::Stop).await
    }

    /// Queue a frame, waiting for room
    pub async fn push_frame(&self, sample: FaceFrameSample) -> Result<(), SessionError> {
        self.send(Command::Frame(sample)).await
    }

    /// Queue a frame without waiting; fails with `Full` when the session is behind
    pub fn try_push_frame(&self, sample: FaceFrameSample) -> Result<(), SessionError> {
        self.tx.try_send(Command::Frame(sample)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SessionError::Full,
            mpsc::error::TrySendError::Closed(_) => SessionError::Closed,
        })
    }

    /// Raise an alert from an outside source
    pub async fn raise(&self, event: AlertEvent, origin: AlertOrigin) -> Result<(), SessionError> {
        self.send(Command::Raise(event, origin)).await
    }

    pub async fn user_action(&self, action: UserAction) -> Result<(), SessionError> {
        self.send(Command::UserAction(action)).await
    }

    pub async fn accelerometer(&self, sample: AccelSample) -> Result<(), SessionError> {
        self.send(Command::Accelerometer(sample)).await
    }

    pub async fn snapshot(&self) -> Result<MonitorSnapshot, SessionError> {
        self.request(Command::Snapshot).await
    }

    /// Stop monitoring if needed and end the session task
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.request(Command::Shutdown).await
    }
}

/// Session state, owned by a single task
pub struct Monitor {
    dms: DmsModule,
    controller: AlertController,
    trip: TripScorer,
    risk: FatigueRiskScorer,
    shake: ShakeDetector,
    contacts: Arc<[EmergencyContact]>,
    collaborators: Collaborators,
    commands: mpsc::WeakSender<Command>,
    monitoring: bool,
    last_risk_score: Option<u8>,
    ticker: Option<JoinHandle<()>>,
    deadline: Option<JoinHandle<()>>,
    render: Option<JoinHandle<()>>,
}

impl Monitor {
    /// Spawn the session task. Must be called within a tokio runtime.
    pub fn spawn(config: MonitorConfig, collaborators: Collaborators) -> Result<MonitorHandle, SessionError> {
        config.risk.validate()?;
        let dms = DmsModule::new(config.dms)?;
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));

        info!(
            "Monitor session created ({} emergency contacts, risk check every {} s)",
            config.contacts.len(),
            config.risk.check_interval_secs
        );

        let monitor = Monitor {
            dms,
            controller: AlertController::new(config.alerts),
            trip: TripScorer::new(),
            risk: FatigueRiskScorer::new(config.risk),
            shake: ShakeDetector::new(),
            contacts: config.contacts.into(),
            collaborators,
            commands: tx.downgrade(),
            monitoring: false,
            last_risk_score: None,
            ticker: None,
            deadline: None,
            render: None,
        };

        tokio::spawn(monitor.run(rx));
        Ok(MonitorHandle { tx })
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        debug!("Monitor session task running");
        while let Some(command) = rx.recv().await {
            if !self.handle(command) {
                info!("Monitor session shut down");
                return;
            }
        }

        debug!("All monitor handles dropped");
        self.close();
    }

    /// Returns false once the session should end
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Start => self.start(),
            Command::Stop(reply) => {
                let summary = self.stop();
                let _ = reply.send(summary);
            }
            Command::Frame(sample) => self.on_frame(&sample),
            Command::Raise(event, origin) => self.raise(&event, origin),
            Command::UserAction(action) => {
                let effects = self.controller.respond(action);
                self.apply(effects);
            }
            Command::Accelerometer(sample) => self.on_accelerometer(&sample),
            Command::RiskTick => self.on_risk_tick(),
            Command::DeadlineElapsed(id) => {
                let effects = self.controller.deadline_elapsed(id);
                self.apply(effects);
            }
            Command::SosFinished(ticket, result) => {
                let effects = self.controller.sos_finished(ticket, result);
                self.apply(effects);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
            Command::Shutdown(ack) => {
                self.close();
                let _ = ack.send(());
                return false;
            }
        }
        true
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.collaborators.clock.now().timestamp_millis()).unwrap_or(0)
    }

    fn start(&mut self) {
        if self.monitoring {
            debug!("Monitoring already active");
            return;
        }

        let started_at = self.collaborators.clock.now().with_timezone(&Utc);
        self.dms.reset_state();
        self.trip.start_trip(started_at);
        self.risk.start_drive(started_at);
        self.last_risk_score = None;
        self.monitoring = true;
        info!("Monitoring started");

        self.on_risk_tick();
        self.ticker = Some(self.spawn_risk_ticker());
    }

    fn stop(&mut self) -> Option<TripSummary> {
        if !self.monitoring {
            debug!("Stop requested while not monitoring");
            return None;
        }
        self.monitoring = false;

        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
        let effects = self.controller.reset();
        self.apply(effects);
        self.dms.reset_state();
        self.risk.stop_drive();
        self.last_risk_score = None;

        let ended_at = self.collaborators.clock.now().with_timezone(&Utc);
        let summary = self.trip.end_trip(ended_at)?;
        self.persist(summary.clone());
        info!("Monitoring stopped");
        Some(summary)
    }

    fn close(&mut self) {
        self.stop();
        for task in [self.ticker.take(), self.deadline.take(), self.render.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }
    }

    fn on_frame(&mut self, sample: &FaceFrameSample) {
        if !self.monitoring {
            debug!("Ignoring frame at {} ms: not monitoring", sample.timestamp_ms);
            return;
        }

        let mut analysis = self.dms.analyze(sample);
        if analysis.yawn_started {
            self.trip.record_yawn();
        }

        analysis.alerts.sort_by_key(|event| Reverse(event.kind.severity_rank()));
        for event in &analysis.alerts {
            self.raise(event, AlertOrigin::Camera);
        }
    }

    fn on_risk_tick(&mut self) {
        if !self.monitoring {
            return;
        }

        let now = self.collaborators.clock.now();
        let assessment = self.risk.check(&now);
        self.last_risk_score = Some(assessment.score);
        if let Some(event) = assessment.alert {
            self.raise(&event, AlertOrigin::FatigueRisk);
        }
    }

    fn on_accelerometer(&mut self, sample: &AccelSample) {
        if !self.shake.update(sample) {
            return;
        }
        if self.monitoring {
            debug!("Shake at {} ms ignored while monitoring", sample.timestamp_ms);
            return;
        }

        warn!("Shake detected at {} ms, possible accident", sample.timestamp_ms);
        let event = AlertEvent::new(AlertKind::Sos, sample.timestamp_ms, ACCIDENT_MESSAGE);
        self.raise(&event, AlertOrigin::Shake);
    }

    fn raise(&mut self, event: &AlertEvent, origin: AlertOrigin) {
        let now_ms = self.now_ms();
        let effects = self.controller.raise(event, origin, now_ms);
        self.apply(effects);
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Render(request) => self.render(request),
                Effect::StopOutput => self.stop_output(),
                Effect::RecordAlert(kind) => self.trip.record_alert(kind),
                Effect::StartDeadline { id, after } => self.start_deadline(id, after),
                Effect::CancelDeadline => {
                    if let Some(task) = self.deadline.take() {
                        task.abort();
                    }
                }
                Effect::SendSos(ticket) => self.send_sos(ticket),
            }
        }
    }

    fn render(&mut self, request: RenderRequest) {
        if let Some(task) = self.render.take() {
            task.abort();
        }

        let output = Arc::clone(&self.collaborators.output);
        self.render = Some(tokio::spawn(async move {
            if let Err(e) = output.render_alert(&request).await {
                warn!("Rendering {:?} alert failed: {}", request.kind, e);
            }
        }));
    }

    fn stop_output(&mut self) {
        if let Some(task) = self.render.take() {
            task.abort();
        }
        self.collaborators.output.stop_current_alert();
    }

    fn start_deadline(&mut self, id: DeadlineId, after: Duration) {
        if let Some(task) = self.deadline.take() {
            task.abort();
        }

        let commands = self.commands.clone();
        self.deadline = Some(tokio::spawn(async move {
            time::sleep(after).await;
            if let Some(tx) = commands.upgrade() {
                let _ = tx.send(Command::DeadlineElapsed(id)).await;
            }
        }));
    }

    fn send_sos(&self, ticket: SosTicket) {
        let sender = Arc::clone(&self.collaborators.sos);
        let location = Arc::clone(&self.collaborators.location);
        let contacts = Arc::clone(&self.contacts);
        let commands = self.commands.clone();

        info!("Sending {} SOS {}", if ticket.automatic { "automatic" } else { "manual" }, ticket.id);
        tokio::spawn(async move {
            let fix = LocationFix::from(location.current_location().await);
            let result = match sender.send_sos(&contacts, &fix, ticket.automatic).await {
                Ok(result) => result,
                Err(e) => {
                    error!("SOS sender failed: {}", e);
                    SosResult::failed(contacts.len(), e.to_string())
                }
            };

            if let Some(tx) = commands.upgrade() {
                let _ = tx.send(Command::SosFinished(ticket, result)).await;
            }
        });
    }

    fn persist(&self, summary: TripSummary) {
        let store = Arc::clone(&self.collaborators.store);
        tokio::spawn(async move {
            if let Err(e) = store.persist(&summary).await {
                error!("Failed to persist trip {}: {}", summary.id, e);
            }
        });
    }

    fn spawn_risk_ticker(&self) -> JoinHandle<()> {
        let period = Duration::from_secs(self.risk.config().check_interval_secs);
        let commands = self.commands.clone();

        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(tx) = commands.upgrade() else {
                    break;
                };
                if tx.send(Command::RiskTick).await.is_err() {
                    break;
                }
            }
        })
    }

    fn snapshot(&self) -> MonitorSnapshot {
        let alert = self.controller.session().clone();
        MonitorSnapshot {
            monitoring: self.monitoring,
            prompt: alert.prompt(),
            alert,
            counters: self.trip.counters().copied(),
            last_risk_score: self.last_risk_score,
            last_sos: self.controller.last_sos().cloned(),
        }
    }
}
