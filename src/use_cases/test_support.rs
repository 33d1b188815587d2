use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::{PoseFrame, PoseSensor, PoseSlot, SensorError};

#[derive(Clone, Copy, Default)]
pub(crate) struct FailureFlags {
    pub initialize: bool,
    pub deny_start: bool,
    /// `start` never returns.
    pub hang_start: bool,
}

#[derive(Default)]
struct SensorLog {
    calls: Vec<&'static str>,
    active: bool,
    overlapping_starts: u32,
    slot: Option<PoseSlot>,
}

type SharedLog = Arc<Mutex<SensorLog>>;

// Fake pose sensor that records its lifecycle calls.
pub(crate) struct ScriptedSensor {
    log: SharedLog,
    failures: FailureFlags,
}

// Test-side view of a scripted sensor, kept after the sensor itself is moved into a session.
#[derive(Clone)]
pub(crate) struct SensorRecorder {
    log: SharedLog,
}

impl ScriptedSensor {
    pub(crate) fn new() -> (Self, SensorRecorder) {
        let log = SharedLog::default();
        let recorder = SensorRecorder { log: log.clone() };
        (
            Self {
                log,
                failures: FailureFlags::default(),
            },
            recorder,
        )
    }

    pub(crate) fn with_failures(mut self, failures: FailureFlags) -> Self {
        self.failures = failures;
        self
    }

    fn record(&self, call: &'static str) {
        let mut guard = self.log.lock().expect("sensor log mutex poisoned");
        guard.calls.push(call);
    }
}

impl SensorRecorder {
    pub(crate) fn calls(&self) -> Vec<&'static str> {
        let guard = self.log.lock().expect("sensor log mutex poisoned");
        guard.calls.clone()
    }

    pub(crate) fn is_active(&self) -> bool {
        let guard = self.log.lock().expect("sensor log mutex poisoned");
        guard.active
    }

    /// Starts issued while a previous capture was still active.
    pub(crate) fn overlapping_starts(&self) -> u32 {
        let guard = self.log.lock().expect("sensor log mutex poisoned");
        guard.overlapping_starts
    }

    /// Writes a frame as the sensor would; returns false when no capture is running.
    pub(crate) fn push(&self, frame: PoseFrame) -> bool {
        let guard = self.log.lock().expect("sensor log mutex poisoned");
        match guard.slot.as_ref() {
            Some(slot) => slot.send(Some(frame)).is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl PoseSensor for ScriptedSensor {
    async fn initialize(&mut self) -> Result<(), SensorError> {
        self.record("initialize");
        if self.failures.initialize {
            return Err(SensorError::Unavailable("no camera".to_string()));
        }
        Ok(())
    }

    async fn start(&mut self, slot: PoseSlot) -> Result<(), SensorError> {
        self.record("start");
        if self.failures.hang_start {
            std::future::pending::<()>().await;
        }
        if self.failures.deny_start {
            return Err(SensorError::PermissionDenied("denied".to_string()));
        }

        let mut guard = self.log.lock().expect("sensor log mutex poisoned");
        if guard.active {
            guard.overlapping_starts += 1;
        }
        guard.active = true;
        guard.slot = Some(slot);
        Ok(())
    }

    async fn stop(&mut self) {
        self.record("stop");
        let mut guard = self.log.lock().expect("sensor log mutex poisoned");
        guard.active = false;
        guard.slot = None;
    }
}
