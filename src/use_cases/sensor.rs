// Sensor session typestate: only an idle sensor can be started, and stopping an
// active one hands the idle sensor back. A second capture can never overlap the first.

use crate::domain::{PoseFrame, PoseSensor, SensorError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, warn};

pub struct IdleSensor {
    sensor: Box<dyn PoseSensor>,
}

pub struct ActiveSensor {
    sensor: Box<dyn PoseSensor>,
    frames: watch::Receiver<Option<PoseFrame>>,
}

impl IdleSensor {
    pub fn new(sensor: impl PoseSensor + 'static) -> Self {
        Self {
            sensor: Box::new(sensor),
        }
    }

    /// Initializes and starts capture. On failure (or when the sensor does not confirm
    /// within `start_timeout`) the sensor is stopped again and handed back idle.
    pub async fn start(
        mut self,
        start_timeout: Duration,
    ) -> Result<ActiveSensor, (IdleSensor, SensorError)> {
        let (slot, frames) = watch::channel::<Option<PoseFrame>>(None);

        let started = timeout(start_timeout, async {
            self.sensor.initialize().await?;
            self.sensor.start(slot).await
        })
        .await;

        let error = match started {
            Ok(Ok(())) => {
                debug!("sensor capture started");
                return Ok(ActiveSensor {
                    sensor: self.sensor,
                    frames,
                });
            }
            Ok(Err(error)) => error,
            Err(_) => SensorError::Timeout,
        };

        warn!(error = ?error, "sensor failed to start");
        // Release anything a half-finished start may have acquired.
        self.sensor.stop().await;
        Err((self, error))
    }
}

impl ActiveSensor {
    /// Receiver over the single-slot pose buffer.
    pub fn frames(&self) -> watch::Receiver<Option<PoseFrame>> {
        self.frames.clone()
    }

    /// Returns only once capture is fully released.
    pub async fn stop(mut self) -> IdleSensor {
        self.sensor.stop().await;
        debug!("sensor capture stopped");
        IdleSensor {
            sensor: self.sensor,
        }
    }
}
