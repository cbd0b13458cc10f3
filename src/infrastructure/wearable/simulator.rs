//! Simulated wearable backend.
//!
//! Stands in for the vendor transport during development and in tests: it
//! honors the session lifecycle, accepts configuration writes, and streams a
//! deterministic head sweep at the configured sample period.

use crate::domain::calibration::SENSOR_FRAME_FIX;
use crate::domain::models::{
    AppEvent, GestureConfig, OrientationSample, SensorConfig, SessionError, WearableEvent,
};
use crate::infrastructure::wearable::session::{ConfigWriteResult, WearableSession};
use glam::Quat;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Peak yaw of the simulated head sweep, radians.
const SWEEP_AMPLITUDE: f32 = 0.9;
/// Angular frequency of the sweep, radians per second.
const SWEEP_RATE: f32 = 0.4;
/// One enabled gesture fires every this many orientation samples.
const GESTURE_EVERY_SAMPLES: u64 = 400;

struct SimulatorShared {
    open: AtomicBool,
    sensors: Mutex<SensorConfig>,
    gestures: Mutex<GestureConfig>,
}

pub struct SimulatedWearable {
    events: mpsc::UnboundedSender<AppEvent>,
    shared: Arc<SimulatorShared>,
    stream_task: Option<tokio::task::JoinHandle<()>>,
}

fn first_enabled(config: &GestureConfig) -> Option<crate::domain::models::GestureKind> {
    use crate::domain::models::GestureKind::*;
    [HeadNod, HeadShake, DoubleTap, SingleTap]
        .into_iter()
        .find(|kind| config.is_enabled(*kind))
}

impl SimulatedWearable {
    pub fn new(events: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            events,
            shared: Arc::new(SimulatorShared {
                open: AtomicBool::new(false),
                sensors: Mutex::new(SensorConfig::default()),
                gestures: Mutex::new(GestureConfig::default()),
            }),
            stream_task: None,
        }
    }

    /// Last gesture configuration the app wrote.
    pub fn gesture_config(&self) -> GestureConfig {
        self.shared.gestures.lock().unwrap().clone()
    }

    /// The raw quaternion the device would report at `elapsed` into the
    /// session: a slow left/right head sweep, expressed in the wearable's
    /// native frame so the app-side remap lands on the intended yaw.
    fn sweep_sample(elapsed: Duration) -> OrientationSample {
        let yaw = (elapsed.as_secs_f32() * SWEEP_RATE).sin() * SWEEP_AMPLITUDE;
        OrientationSample {
            rotation: SENSOR_FRAME_FIX * Quat::from_rotation_z(yaw),
            timestamp: elapsed.as_millis() as u64,
        }
    }

    fn spawn_stream(&mut self) {
        let shared = self.shared.clone();
        let events = self.events.clone();
        let started = Instant::now();

        self.stream_task = Some(tokio::spawn(async move {
            let mut sample_index: u64 = 0;
            loop {
                if !shared.open.load(Ordering::SeqCst) {
                    break;
                }
                let period = { shared.sensors.lock().unwrap().game_rotation };
                let Some(period) = period else {
                    // Nothing enabled yet; poll for a configuration write.
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    continue;
                };
                tokio::time::sleep(period.as_duration()).await;
                if !shared.open.load(Ordering::SeqCst) {
                    break;
                }
                let sample = Self::sweep_sample(started.elapsed());
                if events
                    .send(AppEvent::Wearable(WearableEvent::Orientation(sample)))
                    .is_err()
                {
                    break;
                }

                sample_index += 1;
                if sample_index % GESTURE_EVERY_SAMPLES == 0 {
                    let config = shared.gestures.lock().unwrap().clone();
                    if let Some(kind) = first_enabled(&config) {
                        let _ = events.send(AppEvent::Wearable(WearableEvent::Gesture {
                            kind,
                            timestamp: sample.timestamp,
                        }));
                    }
                }
            }
            debug!("Simulated sensor stream stopped");
        }));
    }
}

impl WearableSession for SimulatedWearable {
    fn open(&mut self) -> Result<(), SessionError> {
        if self.is_open() {
            return Ok(());
        }
        if self.events.is_closed() {
            return Err(SessionError::OpenFailed("event channel closed".to_string()));
        }
        self.shared.open.store(true, Ordering::SeqCst);
        self.spawn_stream();
        info!("Simulated wearable session opened");
        Ok(())
    }

    fn close(&mut self) {
        if !self.is_open() {
            return;
        }
        self.shared.open.store(false, Ordering::SeqCst);
        if let Some(task) = self.stream_task.take() {
            task.abort();
        }
        let _ = self
            .events
            .send(AppEvent::Wearable(WearableEvent::SessionClosed {
                error: None,
            }));
        info!("Simulated wearable session closed");
    }

    fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::SeqCst)
    }

    fn write_sensor_config(&mut self, config: SensorConfig) -> ConfigWriteResult {
        if !self.is_open() {
            return Err("session is not open".to_string());
        }
        *self.shared.sensors.lock().unwrap() = config.clone();
        let _ = self
            .events
            .send(AppEvent::Wearable(WearableEvent::SensorConfigUpdated(
                config,
            )));
        Ok(())
    }

    fn write_gesture_config(&mut self, config: GestureConfig) -> ConfigWriteResult {
        if !self.is_open() {
            return Err("session is not open".to_string());
        }
        *self.shared.gestures.lock().unwrap() = config;
        Ok(())
    }

    fn simulate_drop(&mut self) {
        if !self.is_open() {
            return;
        }
        self.shared.open.store(false, Ordering::SeqCst);
        if let Some(task) = self.stream_task.take() {
            task.abort();
        }
        let _ = self
            .events
            .send(AppEvent::Wearable(WearableEvent::SessionClosed {
                error: Some(SessionError::DeviceDisconnected),
            }));
        info!("Simulated wearable dropped the link");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::SamplePeriod;
    use tokio::time::timeout;

    fn next_orientation_blocking(
        rx: &mut mpsc::UnboundedReceiver<AppEvent>,
    ) -> impl std::future::Future<Output = Option<OrientationSample>> + '_ {
        async move {
            loop {
                match rx.recv().await? {
                    AppEvent::Wearable(WearableEvent::Orientation(sample)) => {
                        return Some(sample)
                    }
                    _ => continue,
                }
            }
        }
    }

    #[tokio::test]
    async fn orientation_flows_after_sensor_config_write() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut device = SimulatedWearable::new(tx);

        device.open().unwrap();
        let mut config = SensorConfig::default();
        config.enable_game_rotation(SamplePeriod::Ms10);
        device.write_sensor_config(config.clone()).unwrap();

        // First the config ack, then samples.
        let ack = timeout(Duration::from_secs(1), rx.recv()).await.unwrap();
        match ack {
            Some(AppEvent::Wearable(WearableEvent::SensorConfigUpdated(c))) => {
                assert_eq!(c, config)
            }
            other => panic!("expected config ack, got {:?}", other),
        }

        let first = timeout(Duration::from_secs(1), next_orientation_blocking(&mut rx))
            .await
            .unwrap()
            .unwrap();
        let second = timeout(Duration::from_secs(1), next_orientation_blocking(&mut rx))
            .await
            .unwrap()
            .unwrap();

        assert!(second.timestamp >= first.timestamp);
        assert!((first.rotation.length() - 1.0).abs() < 1e-4);
        device.close();
    }

    #[tokio::test]
    async fn no_samples_without_sensor_config() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut device = SimulatedWearable::new(tx);
        device.open().unwrap();

        let got = timeout(Duration::from_millis(120), next_orientation_blocking(&mut rx)).await;
        assert!(got.is_err(), "received a sample with no sensors enabled");
        device.close();
    }

    #[tokio::test]
    async fn config_writes_fail_when_closed() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut device = SimulatedWearable::new(tx);

        assert!(device.write_sensor_config(SensorConfig::default()).is_err());
        assert!(device
            .write_gesture_config(GestureConfig::default())
            .is_err());
    }

    #[tokio::test]
    async fn gesture_config_write_is_stored() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut device = SimulatedWearable::new(tx);
        device.open().unwrap();

        let mut config = GestureConfig::default();
        config.set(crate::domain::models::GestureKind::HeadNod, true);
        device.write_gesture_config(config.clone()).unwrap();
        assert_eq!(device.gesture_config(), config);
        device.close();
    }

    #[tokio::test]
    async fn open_fails_once_the_app_side_is_gone() {
        let (tx, rx) = mpsc::unbounded_channel::<AppEvent>();
        drop(rx);
        let mut device = SimulatedWearable::new(tx);
        assert!(matches!(
            device.open(),
            Err(SessionError::OpenFailed(_))
        ));
    }

    #[tokio::test]
    async fn clean_close_reports_no_error() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut device = SimulatedWearable::new(tx);
        device.open().unwrap();
        device.close();
        assert!(!device.is_open());

        loop {
            match timeout(Duration::from_secs(1), rx.recv()).await.unwrap() {
                Some(AppEvent::Wearable(WearableEvent::SessionClosed { error })) => {
                    assert_eq!(error, None);
                    break;
                }
                Some(_) => continue,
                None => panic!("channel closed before SessionClosed"),
            }
        }
    }

    #[tokio::test]
    async fn dropped_link_reports_disconnect_error() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut device = SimulatedWearable::new(tx);
        device.open().unwrap();
        device.simulate_drop();
        assert!(!device.is_open());

        loop {
            match timeout(Duration::from_secs(1), rx.recv()).await.unwrap() {
                Some(AppEvent::Wearable(WearableEvent::SessionClosed { error })) => {
                    assert_eq!(error, Some(SessionError::DeviceDisconnected));
                    break;
                }
                Some(_) => continue,
                None => panic!("channel closed before SessionClosed"),
            }
        }
    }

    #[test]
    fn sweep_samples_are_unit_quaternions() {
        for ms in [0u64, 250, 1000, 5000, 60_000] {
            let sample = SimulatedWearable::sweep_sample(Duration::from_millis(ms));
            assert!((sample.rotation.length() - 1.0).abs() < 1e-5);
            assert_eq!(sample.timestamp, ms);
        }
    }
}
