use crate::domain::models::{SessionCommand, SessionStatus};
use crate::presentation::app::AudioLockApp;
use crate::presentation::components::Components;
use eframe::egui;

pub fn render(app: &mut AudioLockApp, ui: &mut egui::Ui) {
    Components::heading(ui, "Debug");
    ui.add_space(20.0);

    Components::card(ui, "Raw Sensor Data", |ui| {
        match (app.latest_sample, app.current_rotation) {
            (Some(sample), Some(current)) => {
                egui::Grid::new("raw_grid").spacing([40.0, 8.0]).show(ui, |ui| {
                    ui.label("Raw quaternion:");
                    ui.label(format!(
                        "({:.4}, {:.4}, {:.4}, {:.4})",
                        sample.rotation.x, sample.rotation.y, sample.rotation.z, sample.rotation.w
                    ));
                    ui.end_row();

                    ui.label("Head frame:");
                    ui.label(format!(
                        "({:.4}, {:.4}, {:.4}, {:.4})",
                        current.x, current.y, current.z, current.w
                    ));
                    ui.end_row();

                    ui.label("Calibration reference:");
                    let reference = app.calibrator.reference();
                    ui.label(format!(
                        "({:.4}, {:.4}, {:.4}, {:.4})",
                        reference.x, reference.y, reference.z, reference.w
                    ));
                    ui.end_row();

                    ui.label("Timestamp:");
                    ui.label(format!("{} ms", sample.timestamp));
                    ui.end_row();
                });
            }
            _ => {
                ui.label("No sensor data received yet.");
            }
        }
    });

    ui.add_space(15.0);

    Components::card(ui, "Fault Injection", |ui| {
        ui.label("Drop the link as if the wearable walked out of range.");
        let session_open = app.session_status == SessionStatus::Open;
        if ui
            .add_enabled(session_open, egui::Button::new("⚠ Simulate Disconnect"))
            .clicked()
        {
            let _ = app.session_tx.send(SessionCommand::SimulateDrop);
        }
    });

    ui.add_space(15.0);

    Components::card(ui, "Recent Events", |ui| {
        if app.event_log.is_empty() {
            ui.label("Nothing yet.");
        } else {
            egui::ScrollArea::vertical()
                .id_salt("event_log")
                .max_height(220.0)
                .show(ui, |ui| {
                    for line in app.event_log.iter().rev() {
                        ui.label(line);
                    }
                });
        }
    });
}
