use crate::domain::{Beatmap, DebugConfig, PoseFrame};
use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::protocol::{
    AudioCueDto, CaptureDto, ClientMessage, FrameUpdateDto, ServerMessage, SessionStateDto,
};
use crate::interface_adapters::sensors::{
    CaptureCommand, RemotePoseSensor, SensorLink, SensorStatus,
};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::rng::rand_id;
use crate::use_cases::{
    AudioCue, ControllerHandle, FrameUpdate, IdleSensor, SessionCommand, SessionState,
    spawn_controller,
};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    ControllerClosed,
    SensorClosed,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
// Upper bound for the controller to release the sensor after the socket goes away.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        // Connection id correlates every log line of this player's sessions.
        let conn_id = rand_id();
        handle_socket(socket, state).instrument(info_span!("conn", conn_id))
    })
}

struct ConnCtx {
    commands_tx: mpsc::Sender<SessionCommand>,
    state_rx: watch::Receiver<SessionState>,
    frame_rx: broadcast::Receiver<FrameUpdate>,
    cue_rx: broadcast::Receiver<AudioCue>,

    // Ends of the remote pose sensor owned by the controller.
    capture_rx: mpsc::Receiver<CaptureCommand>,
    status_tx: mpsc::Sender<SensorStatus>,
    inbox_tx: watch::Sender<Option<PoseFrame>>,

    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    poses_in: u64,
    frames_lagged: u64,

    invalid_json: u32,

    last_command_full_log: Instant,
    last_frame_lag_log: Instant,
    last_invalid_input_log: Instant,

    close_frame: Option<CloseFrame>,
}

impl ConnCtx {
    fn new(handle: &ControllerHandle, link: SensorLink) -> Self {
        let now = Instant::now() - LOG_THROTTLE;
        Self {
            commands_tx: handle.commands_tx.clone(),
            state_rx: handle.state_rx.clone(),
            frame_rx: handle.frame_tx.subscribe(),
            cue_rx: handle.cue_tx.subscribe(),
            capture_rx: link.capture_rx,
            status_tx: link.status_tx,
            inbox_tx: link.inbox_tx,
            msgs_in: 0,
            msgs_out: 0,
            bytes_in: 0,
            bytes_out: 0,
            poses_in: 0,
            frames_lagged: 0,
            invalid_json: 0,
            last_command_full_log: now,
            last_frame_lag_log: now,
            last_invalid_input_log: now,
            close_frame: None,
        }
    }
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let (sensor, link) = RemotePoseSensor::pair(state.sensor_channel_capacity);
    let (handle, controller) = spawn_controller(IdleSensor::new(sensor), state.settings.clone());
    let mut ctx = ConnCtx::new(&handle, link);
    // The context holds the only command sender the connection needs.
    drop(handle);

    info!("client connected");

    // Tell the client where the session starts so its UI can render the idle screen.
    let initial = ServerMessage::State(ctx.state_rx.borrow_and_update().clone().into());
    match send_message(&mut socket, &initial).await {
        Ok(bytes) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes as u64;
            if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
                warn!(error = ?e, "client loop exited with error");
            }
        }
        Err(e) => warn!(error = ?e, "failed to send initial state"),
    }

    disconnect_cleanup(ctx, controller).await;
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let mut fatal: Option<NetError> = None;

    loop {
        // disconnect becomes true on error
        let disconnect: bool = tokio::select! {
            // Incoming Message from Client
            incoming = socket.recv() => {
                match handle_incoming_ws(socket, incoming, ctx).await {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            // Camera control requested by the sensor adapter.
            command = ctx.capture_rx.recv() => {
                match command {
                    Some(command) => {
                        let msg = ServerMessage::Capture(CaptureDto::from(command));
                        forward(socket, &msg, ctx, "capture command").await
                    }
                    None => {
                        fatal = Some(NetError::SensorClosed);
                        true
                    }
                }
            }

            // Session lifecycle transitions.
            changed = ctx.state_rx.changed() => {
                match changed {
                    Ok(()) => {
                        let state = ctx.state_rx.borrow_and_update().clone();
                        let msg = ServerMessage::State(SessionStateDto::from(state));
                        forward(socket, &msg, ctx, "session state").await
                    }
                    Err(_) => {
                        fatal = Some(NetError::ControllerClosed);
                        true
                    }
                }
            }

            // Outgoing frame snapshot
            frame = ctx.frame_rx.recv() => {
                match frame {
                    Ok(update) => {
                        let msg = ServerMessage::Frame(FrameUpdateDto::from(update));
                        forward(socket, &msg, ctx, "frame update").await
                    }
                    // Every frame is a full snapshot; the next one catches the client up.
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        ctx.frames_lagged += n;
                        if should_log(&mut ctx.last_frame_lag_log) {
                            warn!(missed = n, "frame updates lagged; skipping to latest");
                        }
                        false
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::ControllerClosed);
                        true
                    }
                }
            }

            // Outgoing audio cues
            cue = ctx.cue_rx.recv() => {
                match cue {
                    Ok(cue) => {
                        let msg = ServerMessage::Cue(AudioCueDto::from(cue));
                        forward(socket, &msg, ctx, "audio cue").await
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(&mut ctx.last_frame_lag_log) {
                            warn!(missed = n, "audio cues lagged; dropping");
                        }
                        false
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::ControllerClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = ctx.close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Some(err) = fatal {
        Err(err)
    } else {
        Ok(())
    }
}

// Returns true when the socket should be closed.
async fn forward(
    socket: &mut WebSocket,
    msg: &ServerMessage,
    ctx: &mut ConnCtx,
    what: &'static str,
) -> bool {
    match send_message(socket, msg).await {
        Ok(bytes) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes as u64;
            false
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, what, "failed to send message");
            true
        }
    }
}

async fn handle_incoming_ws(
    socket: &mut WebSocket,
    incoming: Option<Result<Message, Error>>,
    ctx: &mut ConnCtx,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                ctx.msgs_in += 1;
                ctx.bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => handle_client_message(socket, message, ctx).await,
                    Err(parse_err) => {
                        ctx.invalid_json += 1;
                        if should_log(&mut ctx.last_invalid_input_log) {
                            warn!(
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if ctx.invalid_json > MAX_INVALID_JSON {
                            ctx.close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                ctx.close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!("websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn handle_client_message(
    socket: &mut WebSocket,
    message: ClientMessage,
    ctx: &mut ConnCtx,
) -> Result<LoopControl, NetError> {
    match message {
        ClientMessage::Start(payload) => {
            let beatmap = match Beatmap::try_from(payload.beatmap) {
                Ok(beatmap) => beatmap,
                Err(e) => {
                    let msg = ServerMessage::Error(ErrorResponse {
                        error: e.to_string(),
                    });
                    if forward(socket, &msg, ctx, "beatmap rejection").await {
                        return Ok(LoopControl::Disconnect);
                    }
                    return Ok(LoopControl::Continue);
                }
            };
            let debug = payload.debug.map(DebugConfig::from).unwrap_or_default();
            submit(ctx, SessionCommand::Start { beatmap, debug })
        }
        ClientMessage::SensorStatus(status) => {
            match ctx.status_tx.try_send(SensorStatus::from(status)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    if should_log(&mut ctx.last_command_full_log) {
                        warn!("sensor status channel full; dropping status");
                    }
                }
                Err(TrySendError::Closed(_)) => return Err(NetError::SensorClosed),
            }
            Ok(LoopControl::Continue)
        }
        ClientMessage::Pose(pose) => {
            ctx.poses_in += 1;
            // Single-slot buffer: an unread frame is simply replaced.
            ctx.inbox_tx.send_replace(Some(PoseFrame::from(pose)));
            Ok(LoopControl::Continue)
        }
        ClientMessage::Pause => submit(ctx, SessionCommand::Pause),
        ClientMessage::Resume => submit(ctx, SessionCommand::Resume),
        ClientMessage::Debug(config) => submit(ctx, SessionCommand::Debug(config.into())),
        ClientMessage::Stop => submit(ctx, SessionCommand::Stop),
    }
}

fn submit(ctx: &mut ConnCtx, command: SessionCommand) -> Result<LoopControl, NetError> {
    match ctx.commands_tx.try_send(command) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(TrySendError::Full(_command)) => {
            if should_log(&mut ctx.last_command_full_log) {
                warn!("session command channel full; dropping command");
            }
            Ok(LoopControl::Continue)
        }
        Err(TrySendError::Closed(_command)) => Err(NetError::ControllerClosed),
    }
}

async fn disconnect_cleanup(ctx: ConnCtx, controller: JoinHandle<()>) {
    let ConnCtx {
        commands_tx,
        capture_rx,
        status_tx,
        inbox_tx,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        poses_in,
        frames_lagged,
        invalid_json,
        ..
    } = ctx;

    // Closing the sensor ends first unblocks a start still waiting on the client.
    drop(status_tx);
    drop(inbox_tx);
    drop(capture_rx);
    // Dropping the last command sender asks the controller to stop and exit.
    drop(commands_tx);

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, controller).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "session controller failed"),
        Err(_) => warn!("session controller did not shut down in time"),
    }

    debug!(
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        poses_in,
        frames_lagged,
        invalid_json,
        "connection stats"
    );
    info!("client disconnected");
}
