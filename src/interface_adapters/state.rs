use crate::use_cases::SessionSettings;

#[derive(Debug, Clone)]
pub struct AppState {
    // Settings every connection's session controller is spawned with.
    pub settings: SessionSettings,
    // Capacity for capture commands and sensor status replies per connection.
    pub sensor_channel_capacity: usize,
}
