use crate::domain::calibration::{self, OrientationCalibrator};
use crate::domain::models::{
    AppEvent, MessageSeverity, OrientationSample, SessionCommand, SessionError, SessionStatus,
    StatusMessage, Tab, WearableEvent,
};
use crate::domain::pan;
use crate::domain::settings::SettingsService;
use crate::infrastructure::audio::{loader, AudioPlayer};
use crate::infrastructure::wearable::simulator::SimulatedWearable;
use crate::infrastructure::wearable::WearableService;
use eframe::egui;
use glam::Quat;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const EVENT_LOG_CAPACITY: usize = 64;
const REOPEN_DELAY: Duration = Duration::from_millis(2000);

/// Remap, calibrate, and map one raw sensor quaternion to (yaw, pan).
pub(crate) fn process_orientation(calibrator: &OrientationCalibrator, raw: Quat) -> (f32, f32) {
    let calibrated = calibrator.apply(calibration::remap_sensor_frame(raw));
    let yaw = calibration::yaw_of(calibrated);
    (yaw, pan::compute_pan(yaw))
}

pub struct AudioLockApp {
    // Services
    pub(crate) settings: Arc<Mutex<SettingsService>>,

    // Session service channel pair
    pub(crate) session_tx: mpsc::UnboundedSender<SessionCommand>,
    pub(crate) event_rx: mpsc::UnboundedReceiver<AppEvent>,

    // State
    pub(crate) session_status: SessionStatus,
    pub(crate) status_message: Option<StatusMessage>,
    pub(crate) calibrator: OrientationCalibrator,
    pub(crate) current_rotation: Option<Quat>,
    pub(crate) latest_sample: Option<OrientationSample>,
    pub(crate) latest_yaw: Option<f32>,
    pub(crate) latest_pan: Option<f32>,

    // Audio
    pub(crate) audio: Option<AudioPlayer>,
    pub(crate) audio_started: bool,

    // Reopen
    pub(crate) auto_reopen: bool,
    pub(crate) reopen_timer: Option<Instant>,

    // UI State
    pub(crate) selected_tab: Tab,
    pub(crate) show_disconnect_alert: bool,
    pub(crate) is_dark_mode: bool,
    pub(crate) event_log: VecDeque<String>,

    // Logging guard
    pub(crate) _logging_guard: Option<crate::infrastructure::logging::LoggingGuard>,
}

impl AudioLockApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        crate::presentation::theme::configure_style(&cc.egui_ctx, false);

        let settings_service = SettingsService::new().expect("Failed to load settings");

        let logging_guard =
            crate::infrastructure::logging::init_logger(&settings_service.get().log_settings)
                .map_err(|e| eprintln!("Failed to initialize logging: {}", e))
                .ok();

        info!("Starting AudioLock");

        let auto_reopen = settings_service.get().auto_reopen;
        let settings = Arc::new(Mutex::new(settings_service));
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (session_tx, mut session_rx) = mpsc::unbounded_channel();
        let service_settings = settings.clone();
        let service_events = event_tx.clone();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Failed to create tokio runtime for the wearable session");

            rt.block_on(async move {
                let session = Box::new(SimulatedWearable::new(service_events.clone()));
                let mut service =
                    WearableService::new(session, service_events.clone(), service_settings);

                while let Some(cmd) = session_rx.recv().await {
                    match cmd {
                        SessionCommand::Open => {
                            if let Err(e) = service.open().await {
                                error!("Session open failed: {}", e);
                                let _ = service_events.send(AppEvent::LogMessage(StatusMessage {
                                    message: format!("Session open failed: {}", e),
                                    severity: MessageSeverity::Error,
                                }));
                                let _ = service_events
                                    .send(AppEvent::SessionStatus(SessionStatus::Closed));
                            }
                        }
                        SessionCommand::Close => service.close(),
                        SessionCommand::SimulateDrop => service.simulate_drop(),
                    }
                }
            });
        });

        let audio = Self::build_audio_player(&settings);

        Self {
            settings,
            session_tx,
            event_rx,
            session_status: SessionStatus::Closed,
            status_message: None,
            calibrator: OrientationCalibrator::new(),
            current_rotation: None,
            latest_sample: None,
            latest_yaw: None,
            latest_pan: None,
            audio,
            audio_started: false,
            auto_reopen,
            reopen_timer: None,
            selected_tab: Tab::Home,
            show_disconnect_alert: false,
            is_dark_mode: false,
            event_log: VecDeque::new(),
            _logging_guard: logging_guard,
        }
    }

    fn build_audio_player(settings: &Arc<Mutex<SettingsService>>) -> Option<AudioPlayer> {
        let (path, volume) = {
            let guard = settings.lock().ok()?;
            let s = guard.get();
            (s.audio_file.clone(), s.volume)
        };

        match loader::load_loop(Path::new(&path)).and_then(|decoded| {
            info!(
                "Loaded audio loop {} ({:.1}s at {} Hz)",
                path,
                decoded.duration_secs(),
                decoded.sample_rate
            );
            AudioPlayer::new(decoded, volume)
        }) {
            Ok(player) => Some(player),
            Err(e) => {
                error!("Audio unavailable: {}", e);
                None
            }
        }
    }

    pub(crate) fn push_log(&mut self, line: impl Into<String>) {
        self.event_log.push_back(line.into());
        while self.event_log.len() > EVENT_LOG_CAPACITY {
            self.event_log.pop_front();
        }
    }

    /// Zero the orientation: the reference becomes the inverse of where the
    /// head is pointing right now.
    pub(crate) fn calibrate(&mut self) {
        match self.current_rotation {
            Some(current) => {
                self.calibrator.calibrate(current);
                info!("Orientation calibrated");
                self.status_message = Some(StatusMessage {
                    message: "Orientation zeroed".to_string(),
                    severity: MessageSeverity::Success,
                });
                self.push_log("orientation calibrated");
            }
            None => {
                self.status_message = Some(StatusMessage {
                    message: "No orientation sample yet - open a session first".to_string(),
                    severity: MessageSeverity::Warning,
                });
            }
        }
    }

    /// The single dispatcher: every event the wearable service emits lands
    /// here, in delivery order.
    fn dispatch_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Wearable(event) => self.dispatch_wearable_event(event),
            AppEvent::SessionStatus(status) => {
                self.session_status = status;
                if status == SessionStatus::Open {
                    self.reopen_timer = None;
                    self.status_message = Some(StatusMessage {
                        message: "Connected to wearable".to_string(),
                        severity: MessageSeverity::Success,
                    });
                }
            }
            AppEvent::LogMessage(msg) => {
                // A hard error stops the reopen loop so the message stays
                // readable.
                if msg.severity == MessageSeverity::Error {
                    self.reopen_timer = None;
                }
                self.status_message = Some(msg);
            }
        }
    }

    fn dispatch_wearable_event(&mut self, event: WearableEvent) {
        match event {
            WearableEvent::SessionOpened => {
                self.push_log("session opened");
            }
            WearableEvent::SessionClosed { error } => self.handle_session_closed(error),
            WearableEvent::Orientation(sample) => self.handle_orientation(sample),
            WearableEvent::Gesture { kind, timestamp } => {
                info!("Gesture: {} at {} ms", kind.label(), timestamp);
                self.push_log(format!("gesture: {}", kind.label()));
            }
            WearableEvent::SensorConfigUpdated(config) => {
                info!(
                    "Sensor configuration updated, game rotation: {:?}",
                    config.game_rotation
                );
                self.push_log("sensor configuration updated");
            }
            WearableEvent::SensorConfigWriteFailed { reason } => {
                warn!("Couldn't write sensor configuration: {}", reason);
                self.status_message = Some(StatusMessage {
                    message: format!("Sensor configuration failed: {}", reason),
                    severity: MessageSeverity::Warning,
                });
                self.push_log("sensor configuration write failed");
            }
            WearableEvent::GestureConfigWriteFailed { reason } => {
                warn!("Couldn't write gesture configuration: {}", reason);
                self.push_log("gesture configuration write failed");
            }
            WearableEvent::SensorServiceSuspended => {
                info!("Sensor service suspended");
                self.push_log("sensor service suspended");
            }
            WearableEvent::SensorServiceResumed => {
                info!("Sensor service resumed");
                self.push_log("sensor service resumed");
            }
        }
    }

    fn handle_session_closed(&mut self, error: Option<SessionError>) {
        match error {
            Some(SessionError::DeviceDisconnected) => {
                warn!("Wearable disconnected");
                self.session_status = SessionStatus::Error;
                self.show_disconnect_alert = true;
                self.reopen_timer = None;
                self.status_message = Some(StatusMessage {
                    message: "Your wearable has disconnected".to_string(),
                    severity: MessageSeverity::Error,
                });
                self.push_log("session closed: device disconnected");
            }
            Some(e) => {
                error!("Session closed with error: {}", e);
                self.session_status = SessionStatus::Error;
                self.status_message = Some(StatusMessage {
                    message: format!("Session closed: {}", e),
                    severity: MessageSeverity::Error,
                });
                self.push_log(format!("session closed: {}", e));
            }
            None => {
                self.session_status = SessionStatus::Closed;
                if self.auto_reopen {
                    self.reopen_timer = Some(Instant::now() + REOPEN_DELAY);
                    self.status_message = Some(StatusMessage {
                        message: "Session closed. Reopening in 2s...".to_string(),
                        severity: MessageSeverity::Warning,
                    });
                }
                self.push_log("session closed");
            }
        }
    }

    fn handle_orientation(&mut self, sample: OrientationSample) {
        let current = calibration::remap_sensor_frame(sample.rotation);
        self.current_rotation = Some(current);

        let (yaw, pan_value) = process_orientation(&self.calibrator, sample.rotation);
        self.latest_sample = Some(sample);
        self.latest_yaw = Some(yaw);
        self.latest_pan = Some(pan_value);

        let mut audio_failed = false;
        if let Some(audio) = self.audio.as_mut() {
            audio.set_pan(pan_value);
            // First sample after open starts the loop, once.
            if !self.audio_started {
                match audio.start() {
                    Ok(()) => self.audio_started = true,
                    Err(e) => {
                        error!("Couldn't start audio playback: {}", e);
                        self.status_message = Some(StatusMessage {
                            message: format!("Audio playback failed: {}", e),
                            severity: MessageSeverity::Error,
                        });
                        audio_failed = true;
                    }
                }
            }
        }
        if audio_failed {
            self.audio = None;
        }
    }

    fn show_disconnect_alert_window(&mut self, ctx: &egui::Context) {
        if !self.show_disconnect_alert {
            return;
        }
        egui::Window::new("Disconnected")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label("Your wearable has disconnected.");
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    if ui.button("OK").clicked() {
                        self.show_disconnect_alert = false;
                    }
                });
            });
    }
}

impl eframe::App for AudioLockApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if let Some(time) = self.reopen_timer {
            if Instant::now() >= time {
                self.reopen_timer = None;
                self.session_status = SessionStatus::Opening;
                let _ = self.session_tx.send(SessionCommand::Open);
            } else {
                ctx.request_repaint_after(Duration::from_millis(100));
            }
        }

        while let Ok(event) = self.event_rx.try_recv() {
            self.dispatch_event(event);
        }

        // Volume slider edits land on the audio thread via the shared cell.
        if let (Some(audio), Ok(settings)) = (self.audio.as_ref(), self.settings.lock()) {
            audio.set_volume(settings.get().volume);
        }

        ctx.request_repaint();

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.selectable_value(&mut self.selected_tab, Tab::Home, "Home");
                ui.selectable_value(&mut self.selected_tab, Tab::Settings, "Settings");
                ui.selectable_value(&mut self.selected_tab, Tab::Debug, "Debug");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let switch_icon = if self.is_dark_mode {
                        "☀ Light"
                    } else {
                        "🌙 Dark"
                    };
                    if ui.button(switch_icon).clicked() {
                        self.is_dark_mode = !self.is_dark_mode;
                        crate::presentation::theme::configure_style(ctx, self.is_dark_mode);
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.set_max_width(720.0);
                    ui.add_space(20.0);

                    use crate::presentation::tabs;
                    match self.selected_tab {
                        Tab::Home => tabs::home::render(self, ui),
                        Tab::Settings => tabs::settings::render(self, ui),
                        Tab::Debug => tabs::debug::render(self, ui),
                    }

                    ui.add_space(50.0);
                });
            });
        });

        self.show_disconnect_alert_window(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_orientation_is_identity_mapping_after_calibration() {
        let raw = calibration::SENSOR_FRAME_FIX * Quat::from_rotation_z(0.6);
        let mut calibrator = OrientationCalibrator::new();
        calibrator.calibrate(calibration::remap_sensor_frame(raw));

        let (yaw, pan_value) = process_orientation(&calibrator, raw);
        assert!(yaw.abs() < 1e-5);
        assert_eq!(pan_value, 1.0);
    }

    #[test]
    fn process_orientation_pans_left_turns_off_full_right() {
        let calibrator = OrientationCalibrator::new();
        // A raw sample whose head-frame yaw is -0.5 rad.
        let raw = calibration::SENSOR_FRAME_FIX * Quat::from_rotation_z(-0.5);

        let (yaw, pan_value) = process_orientation(&calibrator, raw);
        assert!((yaw + 0.5).abs() < 1e-5);
        assert!((pan_value - 0.5).abs() < 1e-5);
    }
}
