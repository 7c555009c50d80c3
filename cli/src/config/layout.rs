//! Configuration directory layout

use std::path::{Path, PathBuf};

use crate::filesys::file::File;

/// Name of the repository-local file listing the linked applications
pub const LINKED_APPS_FILE: &str = ".clever.json";

/// Configuration layout for the CLI
#[derive(Debug, Clone)]
pub struct ConfigLayout {
    /// Base directory for user-level configuration
    pub base_dir: PathBuf,
}

impl ConfigLayout {
    /// Create a new configuration layout
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Get the settings file
    pub fn settings_file(&self) -> File {
        File::new(self.base_dir.join("settings.json"))
    }

    /// Get the linked applications file of a repository
    pub fn linked_apps_file(repo_dir: &Path) -> File {
        File::new(repo_dir.join(LINKED_APPS_FILE))
    }
}

impl Default for ConfigLayout {
    fn default() -> Self {
        let base_dir = dirs::config_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("clever-cli");

        Self::new(base_dir)
    }
}
