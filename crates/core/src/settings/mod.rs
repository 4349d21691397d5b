pub mod app_settings;
pub mod presets;
pub mod settings_store;
