pub mod calibration;
pub mod models;
pub mod pan;
pub mod settings;
