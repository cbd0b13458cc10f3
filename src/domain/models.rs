use glam::Quat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Milliseconds since the session opened, as stamped by the wearable.
pub type SensorTimestamp = u64;

/// One head-orientation reading from the game-rotation sensor.
///
/// The rotation is a unit quaternion in the wearable's native sensor frame;
/// it is transient and never persisted.
#[derive(Debug, Clone, Copy)]
pub struct OrientationSample {
    pub rotation: Quat,
    pub timestamp: SensorTimestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    SingleTap,
    DoubleTap,
    HeadNod,
    HeadShake,
}

impl GestureKind {
    pub fn label(&self) -> &'static str {
        match self {
            GestureKind::SingleTap => "single tap",
            GestureKind::DoubleTap => "double tap",
            GestureKind::HeadNod => "head nod",
            GestureKind::HeadShake => "head shake",
        }
    }
}

/// Sample periods the wearable firmware accepts for sensor streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SamplePeriod {
    Ms10,
    Ms20,
    Ms40,
    Ms80,
}

impl SamplePeriod {
    pub fn from_millis(ms: u64) -> Option<Self> {
        match ms {
            10 => Some(SamplePeriod::Ms10),
            20 => Some(SamplePeriod::Ms20),
            40 => Some(SamplePeriod::Ms40),
            80 => Some(SamplePeriod::Ms80),
            _ => None,
        }
    }

    pub fn as_millis(&self) -> u64 {
        match self {
            SamplePeriod::Ms10 => 10,
            SamplePeriod::Ms20 => 20,
            SamplePeriod::Ms40 => 40,
            SamplePeriod::Ms80 => 80,
        }
    }

    pub fn as_duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.as_millis())
    }
}

/// Sensor configuration written to the device after the session opens.
///
/// Mirrors the vendor API shape: everything starts disabled and individual
/// streams are enabled at a sample period.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorConfig {
    pub game_rotation: Option<SamplePeriod>,
}

impl SensorConfig {
    pub fn disable_all(&mut self) {
        self.game_rotation = None;
    }

    pub fn enable_game_rotation(&mut self, period: SamplePeriod) {
        self.game_rotation = Some(period);
    }

    pub fn any_enabled(&self) -> bool {
        self.game_rotation.is_some()
    }
}

/// Gesture configuration written to the device after the session opens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureConfig {
    pub single_tap: bool,
    pub double_tap: bool,
    pub head_nod: bool,
    pub head_shake: bool,
}

impl GestureConfig {
    pub fn disable_all(&mut self) {
        *self = GestureConfig::default();
    }

    pub fn set(&mut self, kind: GestureKind, enabled: bool) {
        match kind {
            GestureKind::SingleTap => self.single_tap = enabled,
            GestureKind::DoubleTap => self.double_tap = enabled,
            GestureKind::HeadNod => self.head_nod = enabled,
            GestureKind::HeadShake => self.head_shake = enabled,
        }
    }

    pub fn is_enabled(&self, kind: GestureKind) -> bool {
        match kind {
            GestureKind::SingleTap => self.single_tap,
            GestureKind::DoubleTap => self.double_tap,
            GestureKind::HeadNod => self.head_nod,
            GestureKind::HeadShake => self.head_shake,
        }
    }
}

/// Errors surfaced by the session layer.
///
/// Disconnects are a dedicated variant so callers match on the kind instead
/// of inspecting error-message text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("the wearable disconnected unexpectedly")]
    DeviceDisconnected,
    #[error("device search failed: {0}")]
    SearchFailed(String),
    #[error("device search was cancelled")]
    SearchCancelled,
    #[error("failed to open session: {0}")]
    OpenFailed(String),
}

/// Everything the wearable reports once a session exists.
///
/// The vendor SDK delivers these as delegate callbacks; here they are a
/// plain enum pushed through a channel and consumed by one dispatcher.
#[derive(Debug, Clone)]
pub enum WearableEvent {
    SessionOpened,
    SessionClosed { error: Option<SessionError> },
    Orientation(OrientationSample),
    Gesture { kind: GestureKind, timestamp: SensorTimestamp },
    SensorConfigUpdated(SensorConfig),
    SensorConfigWriteFailed { reason: String },
    GestureConfigWriteFailed { reason: String },
    SensorServiceSuspended,
    SensorServiceResumed,
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    Wearable(WearableEvent),
    SessionStatus(SessionStatus),
    LogMessage(StatusMessage),
}

/// Commands the UI sends to the session service thread.
#[derive(Debug, Clone, Copy)]
pub enum SessionCommand {
    Open,
    Close,
    /// Debug-only: make the backend drop the link as if the device walked away.
    SimulateDrop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Closed,
    Opening,
    Open,
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub message: String,
    pub severity: MessageSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    Settings,
    Debug,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_period_accepts_only_firmware_rates() {
        assert_eq!(SamplePeriod::from_millis(20), Some(SamplePeriod::Ms20));
        assert_eq!(SamplePeriod::from_millis(80), Some(SamplePeriod::Ms80));
        assert_eq!(SamplePeriod::from_millis(15), None);
        assert_eq!(SamplePeriod::from_millis(0), None);
    }

    #[test]
    fn sensor_config_disable_all_clears_rotation() {
        let mut config = SensorConfig::default();
        config.enable_game_rotation(SamplePeriod::Ms20);
        assert!(config.any_enabled());
        config.disable_all();
        assert!(!config.any_enabled());
    }

    #[test]
    fn session_error_messages_name_the_kind() {
        assert_eq!(
            SessionError::DeviceDisconnected.to_string(),
            "the wearable disconnected unexpectedly"
        );
        assert_eq!(
            SessionError::SearchCancelled.to_string(),
            "device search was cancelled"
        );
        assert_eq!(
            SessionError::SearchFailed("bluetooth off".to_string()).to_string(),
            "device search failed: bluetooth off"
        );
        assert_eq!(
            SessionError::OpenFailed("device busy".to_string()).to_string(),
            "failed to open session: device busy"
        );
    }

    #[test]
    fn gesture_config_set_and_query() {
        let mut config = GestureConfig::default();
        config.set(GestureKind::DoubleTap, true);
        config.set(GestureKind::HeadNod, true);
        assert!(config.is_enabled(GestureKind::DoubleTap));
        assert!(config.is_enabled(GestureKind::HeadNod));
        assert!(!config.is_enabled(GestureKind::SingleTap));
        config.disable_all();
        assert!(!config.is_enabled(GestureKind::DoubleTap));
    }
}
