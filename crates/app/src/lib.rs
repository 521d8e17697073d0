//! Fatigue Monitor Application
//!
//! Wires a monitoring session to log-backed collaborators and replays
//! recorded face-metric frames through it.

pub mod collaborators;
pub mod settings;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use dms::FaceFrameSample;
use session::{Collaborators, Monitor, MonitorHandle, SystemClock};
use storage::Repository;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

pub use collaborators::{LogAlertOutput, LogSosSender, StaticLocation};
pub use settings::Settings;

/// Initialize logging to stderr. `RUST_LOG` overrides the INFO default.
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if json { builder.json().try_init() } else { builder.try_init() };
    if let Err(e) = result {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Spawn a session with log-backed collaborators
pub fn start_session(settings: &Settings) -> Result<(MonitorHandle, Arc<Repository>)> {
    let clock = Arc::new(SystemClock);
    let store = Arc::new(Repository::with_retention(settings.trip_retention));
    let collaborators = Collaborators::new(
        Arc::new(LogAlertOutput),
        Arc::new(LogSosSender::new(clock.clone())),
        Arc::new(StaticLocation::new(settings.location)),
        store.clone(),
    )
    .with_clock(clock);

    let handle = Monitor::spawn(settings.monitor_config(), collaborators).context("invalid monitor settings")?;
    Ok((handle, store))
}

/// Push JSON-lines frames into the session; returns the number of frames.
///
/// With `realtime`, frames are paced by their timestamp deltas.
pub async fn replay<R>(handle: &MonitorHandle, reader: R, realtime: bool) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut count = 0;
    let mut line_no = 0;
    let mut last_ts: Option<u64> = None;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let sample: FaceFrameSample =
            serde_json::from_str(line).with_context(|| format!("invalid frame on line {}", line_no))?;

        if realtime {
            if let Some(prev) = last_ts {
                tokio::time::sleep(Duration::from_millis(sample.timestamp_ms.saturating_sub(prev))).await;
            }
        }
        last_ts = Some(sample.timestamp_ms);

        handle.push_frame(sample).await?;
        count += 1;
    }

    debug!("Replay finished after {} lines", line_no);
    Ok(count)
}

/// Replay a frames file
pub async fn replay_file(handle: &MonitorHandle, path: &Path, realtime: bool) -> Result<usize> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("cannot open {}", path.display()))?;
    info!("Replaying frames from {}", path.display());
    replay(handle, BufReader::new(file), realtime).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::{AlertPhase, SosStatus};

    fn absent_lines(until_ms: u64) -> String {
        (0..=until_ms)
            .step_by(100)
            .map(|ts| {
                format!(
                    r#"{{"timestamp_ms":{},"left_eye_open_prob":1.0,"right_eye_open_prob":1.0,"head_pitch_deg":0.0,"head_yaw_deg":0.0,"face_visible":false}}"#,
                    ts
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_drives_session() {
        let settings = Settings {
            contacts: vec![alerting::EmergencyContact {
                name: "Priya".into(),
                phone_number: "+91-9000000001".into(),
                relationship: None,
                is_primary: true,
            }],
            ..Default::default()
        };
        let (handle, store) = start_session(&settings).unwrap();
        handle.start_monitoring().await.unwrap();

        let input = format!("# face lost\n\n{}\n", absent_lines(5000));
        let count = replay(&handle, input.as_bytes(), true).await.unwrap();
        assert_eq!(count, 51);

        tokio::time::sleep(Duration::from_millis(1)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.alert.phase(), AlertPhase::Active);
        assert!(matches!(
            snapshot.alert,
            alerting::AlertSession::Active {
                sos: Some(SosStatus::Sent { sent_count: 1, .. }),
                ..
            }
        ));

        let summary = handle.stop_monitoring().await.unwrap().unwrap();
        assert_eq!(summary.sos_count, 1);
        handle.shutdown().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(store.trip_count(), 1);
    }

    #[tokio::test]
    async fn test_replay_rejects_bad_line() {
        let (handle, _store) = start_session(&Settings::default()).unwrap();
        let err = replay(&handle, "{\"timestamp_ms\": 1}\n".as_bytes(), false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
