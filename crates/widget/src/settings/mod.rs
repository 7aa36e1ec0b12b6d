pub mod state;

pub use state::{BusyPolicy, SettingsError, SettingsResult, SettingsStore, WidgetSettings};
