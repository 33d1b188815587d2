use std::{env, time::Duration};

// Runtime/server constants (not gameplay tuning).

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

pub fn http_port() -> u16 {
    env::var("RHYTHM_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

pub fn tick_interval() -> Duration {
    let hz = env_u64("TICK_RATE_HZ", 60).clamp(1, 1000);
    Duration::from_micros(1_000_000 / hz)
}

pub fn max_frame_dt() -> Duration {
    Duration::from_millis(env_u64("MAX_FRAME_DT_MS", 100).max(1))
}

pub fn sensor_start_timeout() -> Duration {
    Duration::from_millis(env_u64("SENSOR_START_TIMEOUT_MS", 10_000))
}

pub const COMMAND_CHANNEL_CAPACITY: usize = 32;
pub const EVENT_CHANNEL_CAPACITY: usize = 32;
pub const SENSOR_CHANNEL_CAPACITY: usize = 8;
// A slow socket skips frames rather than buffering a backlog.
pub const FRAME_BROADCAST_CAPACITY: usize = 16;
pub const CUE_BROADCAST_CAPACITY: usize = 64;
