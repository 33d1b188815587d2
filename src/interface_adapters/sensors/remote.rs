// Pose sensor driven by the connected client: the browser owns the camera and the pose
// model, the server only asks it to start or stop and receives landmark frames back.

use crate::domain::{PoseFrame, PoseSensor, PoseSlot, SensorError};
use async_trait::async_trait;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Camera control sent to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureCommand {
    Start,
    Stop,
}

/// Client reply to a start request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorStatus {
    Started,
    Denied { reason: String },
}

/// Connection-side ends of a remote sensor.
pub struct SensorLink {
    pub capture_rx: mpsc::Receiver<CaptureCommand>,
    pub status_tx: mpsc::Sender<SensorStatus>,
    /// Latest landmarks from the client; overwritten on every pose message.
    pub inbox_tx: watch::Sender<Option<PoseFrame>>,
}

pub struct RemotePoseSensor {
    capture_tx: mpsc::Sender<CaptureCommand>,
    status_rx: mpsc::Receiver<SensorStatus>,
    inbox: watch::Receiver<Option<PoseFrame>>,
    pump: Option<JoinHandle<()>>,
}

impl RemotePoseSensor {
    pub fn pair(capacity: usize) -> (Self, SensorLink) {
        let (capture_tx, capture_rx) = mpsc::channel(capacity);
        let (status_tx, status_rx) = mpsc::channel(capacity);
        let (inbox_tx, inbox) = watch::channel(None);
        (
            Self {
                capture_tx,
                status_rx,
                inbox,
                pump: None,
            },
            SensorLink {
                capture_rx,
                status_tx,
                inbox_tx,
            },
        )
    }

    async fn halt_pump(&mut self) {
        if let Some(pump) = self.pump.take() {
            pump.abort();
            let _ = pump.await;
        }
    }
}

// Copies client frames into the session's slot until either side goes away.
async fn pump_frames(mut inbox: watch::Receiver<Option<PoseFrame>>, slot: PoseSlot) {
    while inbox.changed().await.is_ok() {
        let frame = inbox.borrow_and_update().clone();
        if slot.send(frame).is_err() {
            break;
        }
    }
}

#[async_trait]
impl PoseSensor for RemotePoseSensor {
    async fn initialize(&mut self) -> Result<(), SensorError> {
        if self.capture_tx.is_closed() {
            return Err(SensorError::Unavailable("client disconnected".to_string()));
        }
        Ok(())
    }

    async fn start(&mut self, slot: PoseSlot) -> Result<(), SensorError> {
        // Replies to an earlier, abandoned start must not confirm this one.
        loop {
            match self.status_rx.try_recv() {
                Ok(stale) => debug!(?stale, "discarding stale sensor status"),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    return Err(SensorError::Unavailable("client disconnected".to_string()));
                }
            }
        }

        self.capture_tx
            .send(CaptureCommand::Start)
            .await
            .map_err(|_| SensorError::Unavailable("client disconnected".to_string()))?;

        match self.status_rx.recv().await {
            Some(SensorStatus::Started) => {
                // Frames left over from a previous capture are not fresh.
                self.inbox.borrow_and_update();
                self.pump = Some(tokio::spawn(pump_frames(self.inbox.clone(), slot)));
                Ok(())
            }
            Some(SensorStatus::Denied { reason }) => Err(SensorError::PermissionDenied(reason)),
            None => Err(SensorError::Unavailable("client disconnected".to_string())),
        }
    }

    async fn stop(&mut self) {
        self.halt_pump().await;
        match self.capture_tx.try_send(CaptureCommand::Stop) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(_)) => warn!("capture channel full; stop not delivered"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Landmark;
    use std::time::Duration;

    fn frame(x: f32) -> PoseFrame {
        PoseFrame::new(vec![Landmark {
            x,
            ..Landmark::default()
        }])
    }

    #[tokio::test]
    async fn when_client_confirms_then_frames_reach_the_slot() {
        let (mut sensor, mut link) = RemotePoseSensor::pair(4);
        let (slot, mut frames) = watch::channel(None);

        let client = tokio::spawn(async move {
            assert_eq!(link.capture_rx.recv().await, Some(CaptureCommand::Start));
            link.status_tx
                .send(SensorStatus::Started)
                .await
                .expect("expected sensor");
            link
        });
        sensor.initialize().await.expect("expected initialize");
        sensor.start(slot).await.expect("expected start");
        let link = client.await.expect("client task panicked");

        link.inbox_tx.send_replace(Some(frame(0.25)));
        tokio::time::timeout(Duration::from_secs(1), frames.changed())
            .await
            .expect("timed out waiting for frame")
            .expect("slot closed");

        assert_eq!(*frames.borrow(), Some(frame(0.25)));
    }

    #[tokio::test]
    async fn when_client_denies_then_start_fails_with_its_reason() {
        let (mut sensor, mut link) = RemotePoseSensor::pair(4);
        let (slot, _frames) = watch::channel(None);

        let client = tokio::spawn(async move {
            assert_eq!(link.capture_rx.recv().await, Some(CaptureCommand::Start));
            link.status_tx
                .send(SensorStatus::Denied {
                    reason: "NotAllowedError".to_string(),
                })
                .await
                .expect("expected sensor");
            link
        });
        let result = sensor.start(slot).await;
        let _link = client.await.expect("client task panicked");

        assert_eq!(
            result,
            Err(SensorError::PermissionDenied("NotAllowedError".to_string()))
        );
    }

    #[tokio::test]
    async fn when_client_disconnects_then_sensor_is_unavailable() {
        let (mut sensor, link) = RemotePoseSensor::pair(4);
        drop(link);
        let (slot, _frames) = watch::channel(None);

        assert!(matches!(
            sensor.initialize().await,
            Err(SensorError::Unavailable(_))
        ));
        assert!(matches!(
            sensor.start(slot).await,
            Err(SensorError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn when_stopped_then_client_is_told_and_frames_stop_flowing() {
        let (mut sensor, mut link) = RemotePoseSensor::pair(4);
        link.status_tx
            .send(SensorStatus::Started)
            .await
            .expect("expected sensor");
        let (slot, frames) = watch::channel(None);

        // A reply queued before the request is discarded; answer the real request.
        let status_tx = link.status_tx.clone();
        let starter = tokio::spawn(async move {
            sensor.start(slot).await.map(|()| sensor)
        });
        assert_eq!(link.capture_rx.recv().await, Some(CaptureCommand::Start));
        status_tx
            .send(SensorStatus::Started)
            .await
            .expect("expected sensor");
        let mut sensor = starter
            .await
            .expect("start task panicked")
            .expect("expected start");

        sensor.stop().await;
        link.inbox_tx.send_replace(Some(frame(0.5)));
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(link.capture_rx.recv().await, Some(CaptureCommand::Stop));
        assert!(!frames.has_changed().unwrap_or(false));
    }
}
