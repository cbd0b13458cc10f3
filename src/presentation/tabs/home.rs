use crate::domain::calibration::format_degrees;
use crate::domain::models::{MessageSeverity, SessionCommand, SessionStatus};
use crate::presentation::app::AudioLockApp;
use crate::presentation::components::Components;
use eframe::egui;

pub fn render(app: &mut AudioLockApp, ui: &mut egui::Ui) {
    Components::heading(ui, "AudioLock");
    ui.add_space(20.0);

    ui_session_panel(app, ui);
    ui.add_space(15.0);

    ui_status_panel(app, ui);
    ui.add_space(15.0);

    ui_tracking_panel(app, ui);
}

fn ui_session_panel(app: &mut AudioLockApp, ui: &mut egui::Ui) {
    Components::card(ui, "Wearable Session", |ui| {
        let (status_text, bg_color, text_color) = match app.session_status {
            SessionStatus::Open => (
                "SESSION OPEN",
                egui::Color32::from_rgb(0, 200, 0),
                egui::Color32::BLACK,
            ),
            SessionStatus::Opening => (
                "OPENING...",
                egui::Color32::from_rgb(255, 200, 0),
                egui::Color32::BLACK,
            ),
            SessionStatus::Closed => (
                "CLOSED",
                egui::Color32::from_gray(100),
                egui::Color32::WHITE,
            ),
            SessionStatus::Error => (
                "ERROR",
                egui::Color32::from_rgb(255, 50, 50),
                egui::Color32::WHITE,
            ),
        };

        Components::status_banner(ui, status_text, bg_color, text_color);
        ui.add_space(10.0);

        ui.horizontal(|ui| {
            if app.session_status == SessionStatus::Open {
                if ui.button("Close Session").clicked() {
                    app.reopen_timer = None;
                    let _ = app.session_tx.send(SessionCommand::Close);
                }
            } else if ui.button("Open Session").clicked() {
                app.session_status = SessionStatus::Opening;
                let _ = app.session_tx.send(SessionCommand::Open);
            }

            let can_calibrate = app.current_rotation.is_some();
            if ui
                .add_enabled(can_calibrate, egui::Button::new("Calibrate"))
                .on_hover_text("Make the current head orientation the zero pose")
                .clicked()
            {
                app.calibrate();
            }
        });
    });
}

fn ui_status_panel(app: &mut AudioLockApp, ui: &mut egui::Ui) {
    let current_msg = app.status_message.clone();
    if let Some(msg) = current_msg {
        Components::card(ui, "System Status", |ui| {
            let color = match msg.severity {
                MessageSeverity::Info => egui::Color32::BLUE,
                MessageSeverity::Success => egui::Color32::from_rgb(0, 150, 0),
                MessageSeverity::Warning => egui::Color32::from_rgb(200, 150, 0),
                MessageSeverity::Error => egui::Color32::RED,
            };
            ui.label(egui::RichText::new(&msg.message).color(color).strong());
        });
    }
}

fn ui_tracking_panel(app: &mut AudioLockApp, ui: &mut egui::Ui) {
    Components::card(ui, "Head Tracking & Pan", |ui| {
        match (app.latest_yaw, app.latest_pan) {
            (Some(yaw), Some(pan)) => {
                egui::Grid::new("tracking_grid")
                    .spacing([40.0, 8.0])
                    .show(ui, |ui| {
                        ui.label("Yaw:");
                        ui.label(format_degrees(yaw));
                        ui.end_row();

                        ui.label("Pan:");
                        ui.label(format!("{:+.2}", pan));
                        ui.end_row();
                    });

                ui.add_space(8.0);
                // Pan meter: full left on the left edge, full right on the right.
                ui.add(
                    egui::ProgressBar::new((pan + 1.0) / 2.0)
                        .text(if pan >= 1.0 { "full right" } else { "" }),
                );
            }
            _ => {
                ui.label("No sensor data yet. Open a session to start tracking.");
            }
        }

        ui.add_space(8.0);
        match &app.audio {
            Some(audio) if audio.is_playing() => {
                ui.label("Audio loop: playing");
            }
            Some(_) => {
                ui.label("Audio loop: loaded, starts with the first sensor sample");
            }
            None => {
                ui.label(
                    egui::RichText::new("Audio loop unavailable - check the file path in Settings")
                        .color(egui::Color32::from_rgb(200, 150, 0)),
                );
            }
        }
    });
}
