//! Wearable Session Module
//!
//! Owns the session lifecycle for the head-worn device: open, post-open
//! sensor/gesture configuration, close, and forwarding of device events to
//! the app channel.

pub mod session;
pub mod simulator;

use crate::domain::models::{
    AppEvent, GestureConfig, GestureKind, SamplePeriod, SensorConfig, SessionStatus,
    WearableEvent,
};
use crate::domain::settings::SettingsService;
use anyhow::Result;
use session::WearableSession;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Delay between session open and the first configuration write. The device
/// rejects writes issued immediately after the session opens.
const CONFIG_WRITE_DELAY: Duration = Duration::from_millis(200);

/// Coordinates one wearable session over whatever backend was injected.
pub struct WearableService {
    session: Box<dyn WearableSession>,
    event_sender: mpsc::UnboundedSender<AppEvent>,
    settings: Arc<Mutex<SettingsService>>,
}

impl WearableService {
    pub fn new(
        session: Box<dyn WearableSession>,
        event_sender: mpsc::UnboundedSender<AppEvent>,
        settings: Arc<Mutex<SettingsService>>,
    ) -> Self {
        Self {
            session,
            event_sender,
            settings,
        }
    }

    /// Open the session and push the sensor/gesture configuration.
    ///
    /// Configuration write failures are reported as events and logged; the
    /// session stays open without the affected stream.
    pub async fn open(&mut self) -> Result<()> {
        if self.session.is_open() {
            return Ok(());
        }

        let (sensor_config, gesture_config) = self.build_configs()?;

        self.session.open().map_err(|e| {
            let _ = self
                .event_sender
                .send(AppEvent::SessionStatus(SessionStatus::Error));
            anyhow::anyhow!(e)
        })?;
        let _ = self
            .event_sender
            .send(AppEvent::Wearable(WearableEvent::SessionOpened));
        info!("Wearable session opened");

        tokio::time::sleep(CONFIG_WRITE_DELAY).await;

        if let Err(reason) = self.session.write_gesture_config(gesture_config) {
            warn!("Failed to write gesture configuration: {}", reason);
            let _ = self
                .event_sender
                .send(AppEvent::Wearable(WearableEvent::GestureConfigWriteFailed {
                    reason,
                }));
        }
        if let Err(reason) = self.session.write_sensor_config(sensor_config) {
            warn!("Failed to write sensor configuration: {}", reason);
            let _ = self
                .event_sender
                .send(AppEvent::Wearable(WearableEvent::SensorConfigWriteFailed {
                    reason,
                }));
        }

        let _ = self
            .event_sender
            .send(AppEvent::SessionStatus(SessionStatus::Open));
        Ok(())
    }

    /// Close the session cleanly.
    pub fn close(&mut self) {
        if !self.session.is_open() {
            return;
        }
        self.session.close();
        info!("Wearable session closed");
        let _ = self
            .event_sender
            .send(AppEvent::SessionStatus(SessionStatus::Closed));
    }

    /// Debug hook, forwarded to the backend.
    pub fn simulate_drop(&mut self) {
        self.session.simulate_drop();
    }

    pub fn is_open(&self) -> bool {
        self.session.is_open()
    }

    fn build_configs(&self) -> Result<(SensorConfig, GestureConfig)> {
        let settings = self
            .settings
            .lock()
            .map_err(|_| anyhow::anyhow!("Lock error"))?;
        let s = settings.get();

        let period = match SamplePeriod::from_millis(s.sample_period_ms) {
            Some(period) => period,
            None => {
                warn!(
                    "Configured sample period {} ms is not a firmware rate, using 20 ms",
                    s.sample_period_ms
                );
                SamplePeriod::Ms20
            }
        };

        let mut sensors = SensorConfig::default();
        sensors.disable_all();
        sensors.enable_game_rotation(period);

        let mut gestures = GestureConfig::default();
        gestures.disable_all();
        gestures.set(GestureKind::SingleTap, s.enable_single_tap);
        gestures.set(GestureKind::DoubleTap, s.enable_double_tap);
        gestures.set(GestureKind::HeadNod, s.enable_head_nod);
        gestures.set(GestureKind::HeadShake, s.enable_head_shake);

        Ok((sensors, gestures))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settings::Settings;
    use super::simulator::SimulatedWearable;
    use tokio::time::timeout;

    fn service_with_channel() -> (WearableService, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Box::new(SimulatedWearable::new(tx.clone()));
        let settings = Arc::new(Mutex::new(SettingsService::for_tests(Settings::default())));
        (WearableService::new(session, tx, settings), rx)
    }

    async fn drain_until<F>(rx: &mut mpsc::UnboundedReceiver<AppEvent>, mut pred: F)
    where
        F: FnMut(&AppEvent) -> bool,
    {
        loop {
            let event = timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("timed out waiting for event")
                .expect("event channel closed");
            if pred(&event) {
                return;
            }
        }
    }

    #[tokio::test]
    async fn open_configures_sensors_then_reports_open() {
        let (mut service, mut rx) = service_with_channel();
        service.open().await.unwrap();

        let mut saw_opened = false;
        let mut saw_config = false;
        drain_until(&mut rx, |event| {
            match event {
                AppEvent::Wearable(WearableEvent::SessionOpened) => saw_opened = true,
                AppEvent::Wearable(WearableEvent::SensorConfigUpdated(config)) => {
                    assert_eq!(config.game_rotation, Some(SamplePeriod::Ms20));
                    saw_config = true;
                }
                AppEvent::SessionStatus(SessionStatus::Open) => return true,
                _ => {}
            }
            false
        })
        .await;

        assert!(saw_opened, "SessionOpened was never delivered");
        assert!(saw_config, "sensor configuration was never acknowledged");
        service.close();
    }

    #[tokio::test]
    async fn orientation_samples_arrive_after_open() {
        let (mut service, mut rx) = service_with_channel();
        service.open().await.unwrap();

        drain_until(&mut rx, |event| {
            matches!(event, AppEvent::Wearable(WearableEvent::Orientation(_)))
        })
        .await;
        service.close();
    }

    #[tokio::test]
    async fn open_is_idempotent() {
        let (mut service, _rx) = service_with_channel();
        service.open().await.unwrap();
        service.open().await.unwrap();
        assert!(service.is_open());
        service.close();
        assert!(!service.is_open());
    }
}
