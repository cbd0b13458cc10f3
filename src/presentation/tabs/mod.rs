pub mod debug;
pub mod home;
pub mod settings;
