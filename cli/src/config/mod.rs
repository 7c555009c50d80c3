//! Configuration: settings file, config directory layout and linked applications

pub mod layout;
pub mod linked_apps;
pub mod settings;
