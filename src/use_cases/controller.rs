// Per-connection session orchestration: owns the sensor between sessions and enforces
// stop-then-start sequencing when a new session replaces a running one.

use super::game::{SessionOutputs, SessionSettings, session_task};
use super::sensor::IdleSensor;
use super::types::{AudioCue, FrameUpdate, SessionCommand, SessionEvent, SessionState};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info, info_span, warn};

/// Connection-side handle to a controller task.
pub struct ControllerHandle {
    pub commands_tx: mpsc::Sender<SessionCommand>,
    pub frame_tx: broadcast::Sender<FrameUpdate>,
    pub cue_tx: broadcast::Sender<AudioCue>,
    pub state_rx: watch::Receiver<SessionState>,
}

struct RunningSession {
    id: u64,
    events_tx: mpsc::Sender<SessionEvent>,
    handle: JoinHandle<IdleSensor>,
}

impl RunningSession {
    /// Stops the session and waits until the sensor is fully released.
    async fn shutdown(self) -> Option<IdleSensor> {
        // The task may already have returned (e.g. the sensor was denied).
        let _ = self.events_tx.send(SessionEvent::Stop).await;
        match self.handle.await {
            Ok(idle) => Some(idle),
            Err(e) => {
                error!(session = self.id, error = %e, "session task failed; sensor lost");
                None
            }
        }
    }
}

/// Spawns the controller for one connection and returns its handle. The task exits, after
/// releasing the sensor, once every command sender is dropped.
pub fn spawn_controller(
    sensor: IdleSensor,
    settings: SessionSettings,
) -> (ControllerHandle, JoinHandle<()>) {
    let (commands_tx, commands_rx) = mpsc::channel(settings.command_channel_capacity);
    let (frame_tx, _frame_rx) = broadcast::channel(settings.frame_broadcast_capacity);
    let (cue_tx, _cue_rx) = broadcast::channel(settings.cue_broadcast_capacity);
    let (state_tx, state_rx) = watch::channel(SessionState::Idle);

    let outputs = SessionOutputs {
        frame_tx: frame_tx.clone(),
        cue_tx: cue_tx.clone(),
        state_tx,
    };
    let task = tokio::spawn(
        controller_task(sensor, settings, commands_rx, outputs).in_current_span(),
    );

    (
        ControllerHandle {
            commands_tx,
            frame_tx,
            cue_tx,
            state_rx,
        },
        task,
    )
}

async fn controller_task(
    sensor: IdleSensor,
    settings: SessionSettings,
    mut commands_rx: mpsc::Receiver<SessionCommand>,
    outputs: SessionOutputs,
) {
    let mut idle = Some(sensor);
    let mut running: Option<RunningSession> = None;
    let mut next_session_id: u64 = 1;

    while let Some(command) = commands_rx.recv().await {
        match command {
            SessionCommand::Start { beatmap, debug } => {
                // The previous session must hand the sensor back before it is started again.
                if let Some(previous) = running.take() {
                    idle = previous.shutdown().await.or(idle);
                }

                let Some(sensor) = idle.take() else {
                    warn!("no sensor available; start rejected");
                    outputs.state_tx.send_replace(SessionState::PermissionDenied {
                        reason: "sensor unavailable".to_string(),
                    });
                    continue;
                };

                let id = next_session_id;
                next_session_id += 1;
                let (events_tx, events_rx) = mpsc::channel(settings.event_channel_capacity);
                let handle = tokio::spawn(
                    session_task(
                        sensor,
                        beatmap,
                        debug.sanitized(),
                        settings.clone(),
                        events_rx,
                        outputs.clone(),
                    )
                    .instrument(info_span!("session", session = id)),
                );
                info!(session = id, "session spawned");
                running = Some(RunningSession {
                    id,
                    events_tx,
                    handle,
                });
            }
            SessionCommand::Stop => {
                if let Some(previous) = running.take() {
                    idle = previous.shutdown().await.or(idle);
                }
                outputs.state_tx.send_replace(SessionState::Idle);
            }
            SessionCommand::Pause => forward(running.as_ref(), SessionEvent::Pause),
            SessionCommand::Resume => forward(running.as_ref(), SessionEvent::Resume),
            SessionCommand::Debug(config) => {
                forward(running.as_ref(), SessionEvent::Debug(config.sanitized()))
            }
        }
    }

    if let Some(previous) = running.take() {
        previous.shutdown().await;
    }
    info!("session controller exited");
}

fn forward(running: Option<&RunningSession>, event: SessionEvent) {
    let Some(session) = running else {
        return;
    };
    match session.events_tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            warn!(session = session.id, ?event, "session event channel full; dropping event");
        }
        // Session already finished (sensor denied or similar); nothing to control.
        Err(TrySendError::Closed(_)) => {}
    }
}
