#![deny(unsafe_code)]

/// Terminal host that mounts the widget and drives it from stdin.
pub mod app;
/// Chat widget: conversation state, reply pipeline and presentation.
pub mod chat;
/// Settings persistence.
pub mod settings;
