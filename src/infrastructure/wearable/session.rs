//! The vendor-SDK seam.
//!
//! Transport, pairing, and the wire protocol to the wearable are owned by a
//! closed vendor stack. This trait is the boundary the rest of the app sees:
//! a session that can be opened and closed, accepts configuration writes,
//! and delivers everything else as [`WearableEvent`]s on the app channel
//! handed over at construction time.

use crate::domain::models::{GestureConfig, SensorConfig, SessionError};

/// Result of a configuration write on the device.
pub type ConfigWriteResult = Result<(), String>;

/// A session with one wearable device.
///
/// Implementations push [`crate::domain::models::AppEvent`]s on the channel
/// they were built with; events are delivered serially, never concurrently,
/// matching the vendor SDK's single callback queue.
pub trait WearableSession: Send {
    /// Open the session. Data does not flow until a sensor configuration
    /// has been written.
    fn open(&mut self) -> Result<(), SessionError>;

    /// Close the session. Emits `SessionClosed { error: None }`.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Write the sensor configuration to the device. The device answers
    /// with `SensorConfigUpdated` on success; the error string is the
    /// firmware's rejection reason.
    fn write_sensor_config(&mut self, config: SensorConfig) -> ConfigWriteResult;

    /// Write the gesture configuration to the device.
    fn write_gesture_config(&mut self, config: GestureConfig) -> ConfigWriteResult;

    /// Debug hook: drop the link as if the device disconnected on its own.
    /// Real backends may ignore this.
    fn simulate_drop(&mut self) {}
}
