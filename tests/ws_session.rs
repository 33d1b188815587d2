mod support;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

async fn connect() -> Socket {
    let (socket, _response) = connect_async(support::ws_url())
        .await
        .expect("websocket should connect");
    socket
}

async fn send(socket: &mut Socket, msg: Value) {
    socket
        .send(Message::text(msg.to_string()))
        .await
        .expect("send should succeed");
}

// Next JSON message, or None if nothing arrives within `limit`.
async fn next_json(socket: &mut Socket, limit: Duration) -> Option<Value> {
    loop {
        let msg = tokio::time::timeout(limit, socket.next()).await.ok()??;
        match msg.expect("websocket should stay healthy") {
            Message::Text(text) => {
                return Some(serde_json::from_str(text.as_str()).expect("server sends json"));
            }
            Message::Close(_) => return None,
            _ => {}
        }
    }
}

async fn wait_for(socket: &mut Socket, pick: impl Fn(&Value) -> bool) -> Value {
    tokio::time::timeout(WAIT, async {
        loop {
            let msg = next_json(socket, WAIT)
                .await
                .expect("socket closed while waiting");
            if pick(&msg) {
                return msg;
            }
        }
    })
    .await
    .expect("timed out waiting for message")
}

fn is_state(msg: &Value, name: &str) -> bool {
    msg["type"] == "State" && (msg["data"] == name || msg["data"].get(name).is_some())
}

fn is_capture(msg: &Value, command: &str) -> bool {
    msg["type"] == "Capture" && msg["data"] == command
}

fn start_message() -> Value {
    json!({
        "type": "Start",
        "data": {
            "beatmap": { "bpm": 120, "start_delay_ms": 2000, "measures": [["M1", "M4", null, "T2"]] },
            "debug": { "show_hitboxes": true }
        }
    })
}

fn pose_message() -> Value {
    let landmarks: Vec<Value> = (0..33)
        .map(|_| json!({ "x": 0.5, "y": 0.5, "z": 0.0, "visibility": 0.9 }))
        .collect();
    json!({ "type": "Pose", "data": { "landmarks": landmarks } })
}

#[tokio::test]
async fn test_connection_starts_idle() {
    let mut socket = connect().await;

    let first = next_json(&mut socket, WAIT)
        .await
        .expect("expected initial state");

    assert!(is_state(&first, "Idle"));
}

#[tokio::test]
async fn test_denied_camera_surfaces_permission_denied() {
    let mut socket = connect().await;

    send(&mut socket, start_message()).await;
    wait_for(&mut socket, |m| is_capture(m, "Start")).await;
    send(
        &mut socket,
        json!({ "type": "SensorStatus", "data": { "Denied": { "reason": "NotAllowedError" } } }),
    )
    .await;
    let denied = wait_for(&mut socket, |m| is_state(m, "PermissionDenied")).await;

    assert_eq!(denied["data"]["PermissionDenied"]["reason"], "NotAllowedError");
}

#[tokio::test]
async fn test_session_reaches_calibration_and_stops_cleanly() {
    let mut socket = connect().await;

    send(&mut socket, start_message()).await;
    wait_for(&mut socket, |m| is_capture(m, "Start")).await;
    send(&mut socket, json!({ "type": "SensorStatus", "data": "Started" })).await;

    // Stream poses like a camera would until the first frame is picked up.
    let calibrating = tokio::time::timeout(WAIT, async {
        loop {
            send(&mut socket, pose_message()).await;
            while let Some(msg) = next_json(&mut socket, Duration::from_millis(30)).await {
                if is_state(&msg, "Calibrating") {
                    return;
                }
            }
        }
    })
    .await;
    assert!(calibrating.is_ok(), "session never reached calibration");

    let frame = wait_for(&mut socket, |m| m["type"] == "Frame").await;
    assert!(frame["data"]["calibration"].is_object());
    assert_eq!(frame["data"]["sabers"].as_array().map(Vec::len), Some(2));

    send(&mut socket, json!({ "type": "Stop" })).await;
    wait_for(&mut socket, |m| is_capture(m, "Stop")).await;
    wait_for(&mut socket, |m| is_state(m, "Idle")).await;
}

#[tokio::test]
async fn test_invalid_beatmap_is_answered_with_error() {
    let mut socket = connect().await;

    send(
        &mut socket,
        json!({ "type": "Start", "data": { "beatmap": { "bpm": 0, "measures": [] } } }),
    )
    .await;
    let error = wait_for(&mut socket, |m| m["type"] == "Error").await;

    assert!(error["data"]["error"].is_string());
}

#[tokio::test]
async fn test_binary_message_closes_socket() {
    let mut socket = connect().await;

    socket
        .send(Message::binary(vec![1u8, 2, 3]))
        .await
        .expect("send should succeed");

    let close = tokio::time::timeout(WAIT, async {
        loop {
            match socket.next().await {
                Some(Ok(Message::Close(frame))) => return frame,
                Some(Ok(_)) => continue,
                _ => return None,
            }
        }
    })
    .await
    .expect("timed out waiting for close");

    let frame = close.expect("expected close frame");
    assert_eq!(u16::from(frame.code), 1003);
}
