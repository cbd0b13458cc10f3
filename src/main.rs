mod domain;
mod infrastructure;
mod presentation;

use eframe::egui;

fn main() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([760.0, 600.0])
            .with_title("AudioLock"),
        ..Default::default()
    };

    eframe::run_native(
        "AudioLock",
        options,
        Box::new(|cc| Ok(Box::new(presentation::app::AudioLockApp::new(cc)))),
    )
}
