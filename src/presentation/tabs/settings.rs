use crate::presentation::app::AudioLockApp;
use crate::presentation::components::Components;
use eframe::egui;

pub fn render(app: &mut AudioLockApp, ui: &mut egui::Ui) {
    Components::heading(ui, "Settings");
    ui.add_space(20.0);

    let mut save_requested = false;
    let mut new_auto_reopen = None;

    if let Ok(mut settings) = app.settings.lock() {
        let settings_mut = settings.get_mut();

        Components::card(ui, "Audio", |ui| {
            ui.horizontal(|ui| {
                ui.label("Loop file:");
                ui.text_edit_singleline(&mut settings_mut.audio_file);
            });
            ui.label(
                egui::RichText::new("Takes effect after restarting the app.").size(12.0),
            );

            ui.horizontal(|ui| {
                ui.label("Volume:");
                ui.add(egui::Slider::new(&mut settings_mut.volume, 0.0..=1.0));
            });
        });

        ui.add_space(10.0);

        Components::card(ui, "Wearable", |ui| {
            ui.horizontal(|ui| {
                ui.label("Rotation sample period:");
                egui::ComboBox::from_id_salt("sample_period")
                    .selected_text(format!("{} ms", settings_mut.sample_period_ms))
                    .show_ui(ui, |ui| {
                        for ms in [10u64, 20, 40, 80] {
                            ui.selectable_value(
                                &mut settings_mut.sample_period_ms,
                                ms,
                                format!("{} ms", ms),
                            );
                        }
                    });
            });

            ui.separator();
            Components::sub_heading(ui, "Gestures");
            ui.checkbox(&mut settings_mut.enable_single_tap, "Single Tap");
            ui.checkbox(&mut settings_mut.enable_double_tap, "Double Tap");
            ui.checkbox(&mut settings_mut.enable_head_nod, "Head Nod");
            ui.checkbox(&mut settings_mut.enable_head_shake, "Head Shake");

            ui.separator();
            if ui
                .checkbox(&mut settings_mut.auto_reopen, "Reopen session after clean close")
                .changed()
            {
                new_auto_reopen = Some(settings_mut.auto_reopen);
            }
            ui.label(
                egui::RichText::new("Configuration is written on the next session open.")
                    .size(12.0),
            );
        });

        ui.add_space(10.0);

        Components::card(ui, "Logging & Debug", |ui| {
            ui.horizontal(|ui| {
                ui.label("Verbosity Level:");
                egui::ComboBox::from_id_salt("log_level")
                    .selected_text(&settings_mut.log_settings.level)
                    .show_ui(ui, |ui| {
                        for level in &["trace", "debug", "info", "warn", "error"] {
                            ui.selectable_value(
                                &mut settings_mut.log_settings.level,
                                level.to_string(),
                                *level,
                            );
                        }
                    });
            });

            ui.checkbox(
                &mut settings_mut.log_settings.console_logging_enabled,
                "Standard Console Logs",
            );
            ui.checkbox(
                &mut settings_mut.log_settings.file_logging_enabled,
                "Persistent File Logs",
            );

            if settings_mut.log_settings.file_logging_enabled {
                ui.indent("file_logs", |ui| {
                    ui.horizontal(|ui| {
                        ui.label("Save Path:");
                        ui.text_edit_singleline(&mut settings_mut.log_settings.log_dir);
                    });
                });
            }

            ui.label(
                egui::RichText::new("Logging changes take effect after restarting the app.")
                    .size(12.0),
            );
        });

        ui.add_space(15.0);

        if ui.button("💾 Save Settings").clicked() {
            save_requested = true;
        }

        if save_requested {
            match settings.save() {
                Ok(()) => {
                    tracing::info!("Settings saved");
                }
                Err(e) => {
                    tracing::error!("Failed to save settings: {}", e);
                }
            }
        }
    }

    if let Some(auto_reopen) = new_auto_reopen {
        app.auto_reopen = auto_reopen;
    }

    if save_requested {
        app.status_message = Some(crate::domain::models::StatusMessage {
            message: "Settings saved".to_string(),
            severity: crate::domain::models::MessageSeverity::Success,
        });
    }
}
